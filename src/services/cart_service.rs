use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::{Alias, Expr, LockType, OnConflict};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::cart::{AddToCartRequest, CartDetail, CartLine, CartLineList, UpdateCartItemRequest},
    entity::{
        cart_items::{ActiveModel as CartItemActive, Column as CartCol, Entity as CartItems},
        carts::{ActiveModel as CartActive, Entity as Carts, Model as CartModel},
        products::{Entity as Products, Model as ProductModel},
        cart_items::Model as CartItemModel,
    },
    error::{AppError, AppResult},
    models::{CartItem, ProductSummary},
    response::{ApiResponse, Meta},
    state::AppState,
};

/// Upper bound for a single cart line.
pub const MAX_QUANTITY: i32 = i16::MAX as i32;

pub fn validate_quantity(quantity: i32) -> AppResult<()> {
    if quantity < 1 {
        return Err(AppError::Validation(
            "quantity must be greater than 0".to_string(),
        ));
    }
    if quantity > MAX_QUANTITY {
        return Err(AppError::Validation(format!(
            "quantity must be less than or equal to {MAX_QUANTITY}"
        )));
    }
    Ok(())
}

pub async fn create_cart(state: &AppState) -> AppResult<ApiResponse<CartDetail>> {
    let cart = CartActive {
        id: Set(Uuid::new_v4()),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(ApiResponse::success(
        "Cart created",
        cart_detail(cart, Vec::new()),
        Some(Meta::empty()),
    ))
}

pub async fn get_cart(state: &AppState, cart_id: Uuid) -> AppResult<ApiResponse<CartDetail>> {
    let cart = find_cart(&state.orm, cart_id).await?;
    let lines = load_lines(&state.orm, cart_id).await?;
    Ok(ApiResponse::success(
        "OK",
        cart_detail(cart, lines),
        Some(Meta::empty()),
    ))
}

pub async fn delete_cart(
    state: &AppState,
    cart_id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let result = Carts::delete_by_id(cart_id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    Ok(ApiResponse::success(
        "Cart deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub async fn list_items(state: &AppState, cart_id: Uuid) -> AppResult<ApiResponse<CartLineList>> {
    find_cart(&state.orm, cart_id).await?;
    let items = load_lines(&state.orm, cart_id).await?;
    let total = items.len() as i64;
    Ok(ApiResponse::success(
        "OK",
        CartLineList { items },
        Some(Meta::total(total)),
    ))
}

/// Adds `quantity` units of a product to the cart.
///
/// An existing line for the same product is incremented, never duplicated. The
/// increment happens in a single upsert on the (cart_id, product_id) unique key,
/// so concurrent calls for the same line serialize in the database. The cart row
/// is share-locked for the duration, so it cannot be deleted or checked out
/// underneath the insert.
pub async fn add_item(
    state: &AppState,
    cart_id: Uuid,
    payload: AddToCartRequest,
) -> AppResult<ApiResponse<CartItem>> {
    validate_quantity(payload.quantity)?;

    let txn = state.orm.begin().await?;
    Carts::find_by_id(cart_id)
        .lock(LockType::Share)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    let product_exists = Products::find_by_id(payload.product_id)
        .one(&txn)
        .await?
        .is_some();
    if !product_exists {
        return Err(AppError::Validation("product not found".to_string()));
    }

    let on_conflict = OnConflict::columns([CartCol::CartId, CartCol::ProductId])
        .value(
            CartCol::Quantity,
            Expr::col((CartItems, CartCol::Quantity))
                .add(Expr::col((Alias::new("excluded"), CartCol::Quantity))),
        )
        .to_owned();

    // Both operands are capped, so the sum stays inside INTEGER.
    let item = CartItems::insert(CartItemActive {
        id: NotSet,
        cart_id: Set(cart_id),
        product_id: Set(payload.product_id),
        quantity: Set(payload.quantity),
    })
    .on_conflict(on_conflict)
    .exec_with_returning(&txn)
    .await?;

    if item.quantity > MAX_QUANTITY {
        txn.rollback().await?;
        return Err(AppError::Validation(format!(
            "cart line quantity must not exceed {MAX_QUANTITY}"
        )));
    }
    txn.commit().await?;

    audit::record(
        &state.pool,
        None,
        "cart_add_item",
        "cart_items",
        serde_json::json!({
            "cart_id": cart_id,
            "product_id": payload.product_id,
            "quantity": payload.quantity,
        }),
    )
    .await;

    Ok(ApiResponse::success("OK", CartItem::from(item), None))
}

/// Overwrites the quantity of one line.
pub async fn update_item(
    state: &AppState,
    cart_id: Uuid,
    item_id: i64,
    payload: UpdateCartItemRequest,
) -> AppResult<ApiResponse<CartItem>> {
    validate_quantity(payload.quantity)?;

    let existing = CartItems::find_by_id(item_id)
        .filter(CartCol::CartId.eq(cart_id))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut active: CartItemActive = existing.into();
    active.quantity = Set(payload.quantity);
    let item = active.update(&state.orm).await?;

    Ok(ApiResponse::success("Updated", CartItem::from(item), None))
}

pub async fn remove_item(
    state: &AppState,
    cart_id: Uuid,
    item_id: i64,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let result = CartItems::delete_many()
        .filter(CartCol::Id.eq(item_id))
        .filter(CartCol::CartId.eq(cart_id))
        .exec(&state.orm)
        .await?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    audit::record(
        &state.pool,
        None,
        "cart_remove_item",
        "cart_items",
        serde_json::json!({ "cart_id": cart_id, "item_id": item_id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Removed from cart",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

async fn find_cart<C: ConnectionTrait>(db: &C, cart_id: Uuid) -> AppResult<CartModel> {
    Carts::find_by_id(cart_id)
        .one(db)
        .await?
        .ok_or(AppError::NotFound)
}

async fn load_lines<C: ConnectionTrait>(db: &C, cart_id: Uuid) -> AppResult<Vec<CartLine>> {
    let rows = CartItems::find()
        .find_also_related(Products)
        .filter(CartCol::CartId.eq(cart_id))
        .order_by_asc(CartCol::Id)
        .all(db)
        .await?;

    Ok(rows
        .into_iter()
        .filter_map(|(item, product)| product.map(|p| cart_line(item, p)))
        .collect())
}

fn cart_line(item: CartItemModel, product: ProductModel) -> CartLine {
    let total_price = product.unit_price * Decimal::from(item.quantity);
    CartLine {
        id: item.id,
        product: ProductSummary::from(product),
        quantity: item.quantity,
        total_price,
    }
}

fn cart_detail(cart: CartModel, items: Vec<CartLine>) -> CartDetail {
    let total_price = items.iter().map(|line| line.total_price).sum();
    CartDetail {
        id: cart.id,
        created_at: cart.created_at.with_timezone(&Utc),
        items,
        total_price,
    }
}
