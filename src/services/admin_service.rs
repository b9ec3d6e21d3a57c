use sea_orm::sea_query::{Expr, LockType};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};

use crate::{
    audit,
    dto::catalog::{ClearInventoryRequest, ClearInventoryResult, InventoryAdjustRequest, ProductList},
    entity::products::{ActiveModel as ProductActive, Column as ProdCol, Entity as Products},
    error::{AppError, AppResult},
    middleware::{
        auth::AuthUser,
        permissions::{Capability, ensure},
    },
    models::Product,
    response::{ApiResponse, Meta},
    routes::params::LowStockQuery,
    state::AppState,
};

pub const DEFAULT_LOW_STOCK_THRESHOLD: i32 = 10;

pub async fn list_low_stock(
    state: &AppState,
    user: &AuthUser,
    query: LowStockQuery,
) -> AppResult<ApiResponse<ProductList>> {
    ensure(user, Capability::ManageInventory)?;
    let threshold = query.threshold.unwrap_or(DEFAULT_LOW_STOCK_THRESHOLD);
    let (page, limit, offset) = query.pagination().normalize();

    let finder = Products::find()
        .filter(ProdCol::Inventory.lt(threshold))
        .order_by_asc(ProdCol::Inventory)
        .order_by_asc(ProdCol::Title);

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|model| Product::from_entity(model, Vec::new()))
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Low stock", ProductList { items }, Some(meta)))
}

/// Sets inventory to zero for every listed product.
pub async fn clear_inventory(
    state: &AppState,
    user: &AuthUser,
    payload: ClearInventoryRequest,
) -> AppResult<ApiResponse<ClearInventoryResult>> {
    ensure(user, Capability::ManageInventory)?;
    if payload.product_ids.is_empty() {
        return Err(AppError::Validation("product_ids must not be empty".into()));
    }

    let result = Products::update_many()
        .col_expr(ProdCol::Inventory, Expr::value(0))
        .col_expr(ProdCol::LastUpdate, Expr::current_timestamp().into())
        .filter(ProdCol::Id.is_in(payload.product_ids.clone()))
        .exec(&state.orm)
        .await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "inventory_clear",
        "products",
        serde_json::json!({ "product_ids": payload.product_ids, "updated": result.rows_affected }),
    )
    .await;

    Ok(ApiResponse::success(
        format!("{} products were updated successfully", result.rows_affected),
        ClearInventoryResult {
            updated: result.rows_affected,
        },
        Some(Meta::empty()),
    ))
}

pub async fn adjust_inventory(
    state: &AppState,
    user: &AuthUser,
    id: i64,
    payload: InventoryAdjustRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure(user, Capability::ManageInventory)?;
    if payload.delta == 0 {
        return Err(AppError::Validation("delta must not be 0".into()));
    }

    let txn = state.orm.begin().await?;
    let product = Products::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    let new_inventory = product
        .inventory
        .checked_add(payload.delta)
        .filter(|n| *n >= 0)
        .ok_or_else(|| AppError::Validation("inventory cannot be negative".into()))?;

    let mut active: ProductActive = product.into();
    active.inventory = Set(new_inventory);
    active.last_update = Set(chrono::Utc::now().into());
    let updated = active.update(&txn).await?;

    txn.commit().await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "inventory_adjust",
        "products",
        serde_json::json!({ "product_id": updated.id, "delta": payload.delta }),
    )
    .await;

    Ok(ApiResponse::success(
        "Inventory updated",
        Product::from_entity(updated, Vec::new()),
        Some(Meta::empty()),
    ))
}
