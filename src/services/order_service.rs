use std::collections::HashMap;

use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::LockType;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit,
    db::OrmConn,
    dto::orders::{CheckoutRequest, OrderList, OrderWithItems, UpdateOrderRequest},
    entity::{
        cart_items::{Column as CartCol, Entity as CartItems},
        carts::Entity as Carts,
        enums::PaymentStatus,
        order_items::{ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems},
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel},
        products::Entity as Products,
    },
    error::{AppError, AppResult, CheckoutError},
    middleware::{
        auth::AuthUser,
        permissions::{Capability, allows, ensure},
    },
    models::{Order, OrderItem},
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, SortOrder},
    services::customer_service::{find_customer, get_or_create_customer},
    state::AppState,
};

/// Converts a cart into an order for the requesting principal.
///
/// Everything up to and including deleting the cart runs in one transaction.
/// The notification sink is called only after commit and its failure does not
/// affect the result.
pub async fn checkout(
    state: &AppState,
    user: &AuthUser,
    payload: CheckoutRequest,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let order = place_order(&state.orm, payload.cart_id, user.user_id).await?;

    tracing::info!(
        order_id = order.order.id,
        cart_id = %payload.cart_id,
        user_id = user.user_id,
        items = order.items.len(),
        "checkout committed"
    );

    if let Err(err) = state.notifier.order_created(&order).await {
        tracing::warn!(error = %err, order_id = order.order.id, "order_created notification failed");
    }

    audit::record(
        &state.pool,
        Some(user.user_id),
        "checkout",
        "orders",
        serde_json::json!({ "order_id": order.order.id, "cart_id": payload.cart_id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Checkout success",
        order,
        Some(Meta::empty()),
    ))
}

async fn place_order(db: &OrmConn, cart_id: Uuid, user_id: i64) -> AppResult<OrderWithItems> {
    // Dropping the transaction without commit rolls back every write below.
    let txn = db.begin().await?;

    // Validating: the row lock serializes concurrent checkouts of one cart.
    let cart = Carts::find_by_id(cart_id)
        .lock(LockType::Update)
        .one(&txn)
        .await?;
    if cart.is_none() {
        return Err(CheckoutError::NotFound.into());
    }

    let rows = CartItems::find()
        .find_also_related(Products)
        .filter(CartCol::CartId.eq(cart_id))
        .order_by_asc(CartCol::Id)
        .all(&txn)
        .await?;
    if rows.is_empty() {
        return Err(CheckoutError::EmptyCart.into());
    }

    // ResolvingCustomer
    let customer = get_or_create_customer(&txn, user_id).await?;

    // CopyingItems
    let order = OrderActive {
        id: NotSet,
        placed_at: NotSet,
        payment_status: Set(PaymentStatus::Pending),
        customer_id: Set(customer.id),
    }
    .insert(&txn)
    .await?;

    let mut items = Vec::with_capacity(rows.len());
    for (cart_item, product) in rows {
        let product = product.ok_or_else(|| {
            AppError::Internal(anyhow::anyhow!(
                "cart item {} references a missing product",
                cart_item.id
            ))
        })?;

        let item = OrderItemActive {
            id: NotSet,
            order_id: Set(order.id),
            product_id: Set(product.id),
            quantity: Set(cart_item.quantity),
            unit_price: Set(product.unit_price),
        }
        .insert(&txn)
        .await?;
        items.push(OrderItem::from(item));
    }

    // ClearingCart: items go with the cart through ON DELETE CASCADE.
    Carts::delete_by_id(cart_id).exec(&txn).await?;

    txn.commit().await?;

    Ok(OrderWithItems::new(Order::from(order), items))
}

/// Lists the caller's own orders, or every order for principals allowed to see them all.
pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let mut condition = Condition::all();

    if !allows(user.role, Capability::ViewAllOrders) {
        match find_customer(&state.orm, user.user_id).await? {
            Some(customer) => condition = condition.add(OrderCol::CustomerId.eq(customer.id)),
            None => {
                return Ok(ApiResponse::success(
                    "Ok",
                    OrderList { items: Vec::new() },
                    Some(Meta::new(page, limit, 0)),
                ));
            }
        }
    }

    if let Some(status) = query.payment_status {
        condition = condition.add(OrderCol::PaymentStatus.eq(status));
    }

    let mut finder = Orders::find().filter(condition);
    finder = match query.sort_order.unwrap_or(SortOrder::Desc) {
        SortOrder::Asc => finder.order_by_asc(OrderCol::PlacedAt),
        SortOrder::Desc => finder.order_by_desc(OrderCol::PlacedAt),
    };
    finder = finder.order_by_asc(OrderCol::Id);

    let total = finder.clone().count(&state.orm).await? as i64;

    let orders = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;
    let items = with_items(&state.orm, orders).await?;

    Ok(ApiResponse::success(
        "Ok",
        OrderList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: i64,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let order = find_visible_order(&state.orm, user, id).await?;
    let mut loaded = with_items(&state.orm, vec![order]).await?;
    let order = loaded.pop().ok_or(AppError::NotFound)?;

    Ok(ApiResponse::success("OK", order, Some(Meta::empty())))
}

pub async fn update_order(
    state: &AppState,
    user: &AuthUser,
    id: i64,
    payload: UpdateOrderRequest,
) -> AppResult<ApiResponse<OrderWithItems>> {
    ensure(user, Capability::UpdateOrders)?;

    let existing = Orders::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut active: OrderActive = existing.into();
    active.payment_status = Set(payload.payment_status);
    let order = active.update(&state.orm).await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "order_payment_status",
        "orders",
        serde_json::json!({ "order_id": order.id, "payment_status": payload.payment_status }),
    )
    .await;

    let mut loaded = with_items(&state.orm, vec![order]).await?;
    let order = loaded.pop().ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success("Order updated", order, Some(Meta::empty())))
}

/// Orders with items are history and cannot be deleted.
pub async fn delete_order(
    state: &AppState,
    user: &AuthUser,
    id: i64,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure(user, Capability::DeleteOrders)?;

    let order = Orders::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let item_count = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order.id))
        .count(&state.orm)
        .await?;
    if item_count > 0 {
        return Err(AppError::Conflict(
            "Order cannot be deleted because it has order items".into(),
        ));
    }

    Orders::delete_by_id(order.id).exec(&state.orm).await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "order_delete",
        "orders",
        serde_json::json!({ "order_id": order.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

async fn find_visible_order<C: ConnectionTrait>(
    db: &C,
    user: &AuthUser,
    id: i64,
) -> AppResult<OrderModel> {
    let order = Orders::find_by_id(id)
        .one(db)
        .await?
        .ok_or(AppError::NotFound)?;

    if allows(user.role, Capability::ViewAllOrders) {
        return Ok(order);
    }

    // Other customers' orders are reported as absent rather than forbidden.
    match find_customer(db, user.user_id).await? {
        Some(customer) if customer.id == order.customer_id => Ok(order),
        _ => Err(AppError::NotFound),
    }
}

async fn with_items<C: ConnectionTrait>(
    db: &C,
    orders: Vec<OrderModel>,
) -> AppResult<Vec<OrderWithItems>> {
    let ids: Vec<i64> = orders.iter().map(|o| o.id).collect();
    let mut by_order: HashMap<i64, Vec<OrderItem>> = HashMap::new();
    for item in OrderItems::find()
        .filter(OrderItemCol::OrderId.is_in(ids))
        .order_by_asc(OrderItemCol::Id)
        .all(db)
        .await?
    {
        by_order
            .entry(item.order_id)
            .or_default()
            .push(OrderItem::from(item));
    }

    Ok(orders
        .into_iter()
        .map(|order| {
            let items = by_order.remove(&order.id).unwrap_or_default();
            OrderWithItems::new(Order::from(order), items)
        })
        .collect())
}
