use std::collections::HashMap;

use rust_decimal::Decimal;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};

use crate::{
    audit,
    dto::catalog::{
        CreateProductRequest, CreatePromotionRequest, ProductList, PromotionList,
        UpdateProductRequest,
    },
    entity::{
        collections::Entity as Collections,
        order_items::{Column as OrderItemCol, Entity as OrderItems},
        product_promotions::{
            ActiveModel as ProductPromotionActive, Column as ProductPromotionCol,
            Entity as ProductPromotions,
        },
        products::{ActiveModel, Column, Entity as Products, Model as ProductModel},
        promotions::{ActiveModel as PromotionActive, Column as PromotionCol, Entity as Promotions},
    },
    error::{AppError, AppResult},
    middleware::{
        auth::AuthUser,
        permissions::{Capability, ensure},
    },
    models::{Product, Promotion},
    response::{ApiResponse, Meta},
    routes::params::{ProductQuery, ProductSortBy, SortOrder},
    state::AppState,
};

/// Lowercase ASCII slug: runs of anything that is not a letter or digit become one `-`.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    for ch in title.chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

/// Largest amount a `NUMERIC(6, 2)` column holds.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(999_999, 0, 0, false, 2);

/// Amounts are stored with at most 6 digits, 2 of them after the point.
pub fn validate_amount(field: &str, value: Decimal) -> AppResult<()> {
    if value.normalize().scale() > 2 {
        return Err(AppError::Validation(format!(
            "{field} must have at most 2 decimal places"
        )));
    }
    if value > MAX_AMOUNT {
        return Err(AppError::Validation(format!(
            "{field} must be less than or equal to {MAX_AMOUNT}"
        )));
    }
    Ok(())
}

pub fn validate_product(title: &str, unit_price: Decimal, inventory: i32) -> AppResult<()> {
    if title.trim().is_empty() {
        return Err(AppError::Validation("title must not be empty".into()));
    }
    validate_amount("unit_price", unit_price)?;
    if unit_price < Decimal::ONE {
        return Err(AppError::Validation(
            "unit_price must be greater than or equal to 1".into(),
        ));
    }
    if inventory < 0 {
        return Err(AppError::Validation("inventory must not be negative".into()));
    }
    Ok(())
}

pub async fn list_products(
    state: &AppState,
    query: ProductQuery,
) -> AppResult<ApiResponse<ProductList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let mut condition = Condition::all();

    if let Some(collection_id) = query.collection_id {
        condition = condition.add(Column::CollectionId.eq(collection_id));
    }

    if let Some(search) = query.q.as_ref().filter(|s| !s.trim().is_empty()) {
        let pattern = format!("%{}%", search.trim());
        condition = condition.add(Expr::col(Column::Title).ilike(pattern));
    }

    if let Some(min_price) = query.min_price {
        condition = condition.add(Column::UnitPrice.gte(min_price));
    }

    if let Some(max_price) = query.max_price {
        condition = condition.add(Column::UnitPrice.lte(max_price));
    }

    let sort_col = match query.sort_by.unwrap_or(ProductSortBy::Title) {
        ProductSortBy::Title => Column::Title,
        ProductSortBy::UnitPrice => Column::UnitPrice,
        ProductSortBy::LastUpdate => Column::LastUpdate,
    };

    let mut finder = Products::find().filter(condition);
    finder = match query.sort_order.unwrap_or(SortOrder::Asc) {
        SortOrder::Asc => finder.order_by_asc(sort_col),
        SortOrder::Desc => finder.order_by_desc(sort_col),
    };
    finder = finder.order_by_asc(Column::Id);

    let total = finder.clone().count(&state.orm).await? as i64;

    let models = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;
    let items = with_promotions(&state.orm, models).await?;

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Products", ProductList { items }, Some(meta)))
}

pub async fn get_product(state: &AppState, id: i64) -> AppResult<ApiResponse<Product>> {
    let model = Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    let product = single(&state.orm, model).await?;
    Ok(ApiResponse::success("Product", product, None))
}

pub async fn create_product(
    state: &AppState,
    user: &AuthUser,
    payload: CreateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure(user, Capability::ManageCatalog)?;
    validate_product(&payload.title, payload.unit_price, payload.inventory)?;
    ensure_collection(&state.orm, payload.collection_id).await?;

    let slug = payload
        .slug
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| slugify(&payload.title));

    let product = ActiveModel {
        id: NotSet,
        title: Set(payload.title.trim().to_string()),
        slug: Set(slug),
        description: Set(payload.description),
        unit_price: Set(payload.unit_price),
        inventory: Set(payload.inventory),
        last_update: NotSet,
        collection_id: Set(payload.collection_id),
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "product_create",
        "products",
        serde_json::json!({ "product_id": product.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Product created",
        Product::from_entity(product, Vec::new()),
        Some(Meta::empty()),
    ))
}

pub async fn update_product(
    state: &AppState,
    user: &AuthUser,
    id: i64,
    payload: UpdateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure(user, Capability::ManageCatalog)?;

    let existing = Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let title = payload.title.unwrap_or_else(|| existing.title.clone());
    let unit_price = payload.unit_price.unwrap_or(existing.unit_price);
    let inventory = payload.inventory.unwrap_or(existing.inventory);
    validate_product(&title, unit_price, inventory)?;

    if let Some(collection_id) = payload.collection_id {
        ensure_collection(&state.orm, collection_id).await?;
    }

    let mut active: ActiveModel = existing.into();
    active.title = Set(title.trim().to_string());
    active.unit_price = Set(unit_price);
    active.inventory = Set(inventory);
    active.last_update = Set(chrono::Utc::now().into());
    if let Some(slug) = payload.slug.filter(|s| !s.trim().is_empty()) {
        active.slug = Set(slug);
    }
    if let Some(description) = payload.description {
        active.description = Set(Some(description));
    }
    if let Some(collection_id) = payload.collection_id {
        active.collection_id = Set(collection_id);
    }
    let product = active.update(&state.orm).await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "product_update",
        "products",
        serde_json::json!({ "product_id": product.id }),
    )
    .await;

    let product = single(&state.orm, product).await?;
    Ok(ApiResponse::success("Updated", product, Some(Meta::empty())))
}

/// Products that appear on any order line are protected.
pub async fn delete_product(
    state: &AppState,
    user: &AuthUser,
    id: i64,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure(user, Capability::ManageCatalog)?;

    let ordered = OrderItems::find()
        .filter(OrderItemCol::ProductId.eq(id))
        .count(&state.orm)
        .await?;
    if ordered > 0 {
        return Err(AppError::Conflict(
            "Product cannot be deleted because it is associated with an order item".into(),
        ));
    }

    let result = Products::delete_by_id(id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    audit::record(
        &state.pool,
        Some(user.user_id),
        "product_delete",
        "products",
        serde_json::json!({ "product_id": id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub async fn list_promotions(state: &AppState) -> AppResult<ApiResponse<PromotionList>> {
    let items: Vec<Promotion> = Promotions::find()
        .order_by_asc(PromotionCol::Id)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Promotion::from)
        .collect();
    let total = items.len() as i64;
    Ok(ApiResponse::success(
        "Promotions",
        PromotionList { items },
        Some(Meta::total(total)),
    ))
}

pub async fn create_promotion(
    state: &AppState,
    user: &AuthUser,
    payload: CreatePromotionRequest,
) -> AppResult<ApiResponse<Promotion>> {
    ensure(user, Capability::ManageCatalog)?;
    if payload.description.trim().is_empty() {
        return Err(AppError::Validation("description must not be empty".into()));
    }
    if payload.discount.is_sign_negative() {
        return Err(AppError::Validation("discount must not be negative".into()));
    }
    validate_amount("discount", payload.discount)?;

    let promotion = PromotionActive {
        id: NotSet,
        description: Set(payload.description.trim().to_string()),
        discount: Set(payload.discount),
    }
    .insert(&state.orm)
    .await?;

    Ok(ApiResponse::success(
        "Promotion created",
        Promotion::from(promotion),
        Some(Meta::empty()),
    ))
}

pub async fn attach_promotion(
    state: &AppState,
    user: &AuthUser,
    product_id: i64,
    promotion_id: i64,
) -> AppResult<ApiResponse<Product>> {
    ensure(user, Capability::ManageCatalog)?;

    let product = Products::find_by_id(product_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    Promotions::find_by_id(promotion_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    ProductPromotions::insert(ProductPromotionActive {
        product_id: Set(product_id),
        promotion_id: Set(promotion_id),
    })
    .on_conflict(
        OnConflict::columns([ProductPromotionCol::ProductId, ProductPromotionCol::PromotionId])
            .do_nothing()
            .to_owned(),
    )
    .exec_without_returning(&state.orm)
    .await?;

    let product = single(&state.orm, product).await?;
    Ok(ApiResponse::success("Promotion attached", product, Some(Meta::empty())))
}

pub async fn detach_promotion(
    state: &AppState,
    user: &AuthUser,
    product_id: i64,
    promotion_id: i64,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure(user, Capability::ManageCatalog)?;

    let result = ProductPromotions::delete_many()
        .filter(ProductPromotionCol::ProductId.eq(product_id))
        .filter(ProductPromotionCol::PromotionId.eq(promotion_id))
        .exec(&state.orm)
        .await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    Ok(ApiResponse::success(
        "Promotion detached",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

async fn ensure_collection<C: ConnectionTrait>(db: &C, collection_id: i64) -> AppResult<()> {
    let found = Collections::find_by_id(collection_id).count(db).await?;
    if found == 0 {
        return Err(AppError::Validation("collection not found".into()));
    }
    Ok(())
}

async fn single<C: ConnectionTrait>(db: &C, model: ProductModel) -> AppResult<Product> {
    with_promotions(db, vec![model])
        .await?
        .pop()
        .ok_or(AppError::NotFound)
}

async fn with_promotions<C: ConnectionTrait>(
    db: &C,
    models: Vec<ProductModel>,
) -> AppResult<Vec<Product>> {
    let ids: Vec<i64> = models.iter().map(|p| p.id).collect();
    let mut by_product: HashMap<i64, Vec<i64>> = HashMap::new();
    for link in ProductPromotions::find()
        .filter(ProductPromotionCol::ProductId.is_in(ids))
        .order_by_asc(ProductPromotionCol::PromotionId)
        .all(db)
        .await?
    {
        by_product
            .entry(link.product_id)
            .or_default()
            .push(link.promotion_id);
    }

    Ok(models
        .into_iter()
        .map(|model| {
            let promotions = by_product.remove(&model.id).unwrap_or_default();
            Product::from_entity(model, promotions)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_collapses_separators() {
        assert_eq!(slugify("Ferris Mug"), "ferris-mug");
        assert_eq!(slugify("  E-book: Async Rust!  "), "e-book-async-rust");
        assert_eq!(slugify("***"), "");
    }

    #[test]
    fn product_validation_rules() {
        assert!(validate_product("Mug", Decimal::ONE, 0).is_ok());
        assert!(matches!(
            validate_product(" ", Decimal::ONE, 0),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            validate_product("Mug", Decimal::new(99, 2), 0),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            validate_product("Mug", Decimal::TEN, -1),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn prices_fit_six_digits_with_two_decimals() {
        assert!(validate_product("Mug", Decimal::new(999_999, 2), 0).is_ok());
        assert!(validate_product("Mug", Decimal::new(10_500, 3), 0).is_ok());
        assert!(matches!(
            validate_product("Mug", Decimal::new(1_000_000, 2), 0),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            validate_product("Mug", Decimal::new(10_005, 3), 0),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn discount_uses_the_same_bounds() {
        assert!(validate_amount("discount", Decimal::new(1550, 2)).is_ok());
        assert!(matches!(
            validate_amount("discount", Decimal::new(1_000_000, 2)),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            validate_amount("discount", Decimal::new(1, 3)),
            Err(AppError::Validation(_))
        ));
    }
}
