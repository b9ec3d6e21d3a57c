use std::collections::HashMap;

use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};

use crate::{
    audit,
    dto::catalog::{CollectionList, CreateCollectionRequest, UpdateCollectionRequest},
    entity::{
        collections::{
            ActiveModel as CollectionActive, Column as CollectionCol, Entity as Collections,
            Model as CollectionModel,
        },
        products::{Column as ProductCol, Entity as Products},
    },
    error::{AppError, AppResult},
    middleware::{
        auth::AuthUser,
        permissions::{Capability, ensure},
    },
    models::Collection,
    response::{ApiResponse, Meta},
    state::AppState,
};

fn validate_name(name: &str) -> AppResult<()> {
    if name.trim().is_empty() {
        return Err(AppError::Validation("name must not be empty".into()));
    }
    Ok(())
}

pub async fn list_collections(state: &AppState) -> AppResult<ApiResponse<CollectionList>> {
    let models = Collections::find()
        .order_by_asc(CollectionCol::Name)
        .order_by_asc(CollectionCol::Id)
        .all(&state.orm)
        .await?;
    let items = with_counts(&state.orm, models).await?;
    let total = items.len() as i64;

    Ok(ApiResponse::success(
        "Collections",
        CollectionList { items },
        Some(Meta::total(total)),
    ))
}

pub async fn get_collection(state: &AppState, id: i64) -> AppResult<ApiResponse<Collection>> {
    let model = Collections::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    let collection = single(&state.orm, model).await?;
    Ok(ApiResponse::success("Collection", collection, None))
}

pub async fn create_collection(
    state: &AppState,
    user: &AuthUser,
    payload: CreateCollectionRequest,
) -> AppResult<ApiResponse<Collection>> {
    ensure(user, Capability::ManageCatalog)?;
    validate_name(&payload.name)?;
    if let Some(product_id) = payload.featured_product_id {
        ensure_product(&state.orm, product_id).await?;
    }

    let model = CollectionActive {
        id: NotSet,
        name: Set(payload.name.trim().to_string()),
        featured_product_id: Set(payload.featured_product_id),
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "collection_create",
        "collections",
        serde_json::json!({ "collection_id": model.id }),
    )
    .await;

    let collection = single(&state.orm, model).await?;
    Ok(ApiResponse::success(
        "Collection created",
        collection,
        Some(Meta::empty()),
    ))
}

pub async fn update_collection(
    state: &AppState,
    user: &AuthUser,
    id: i64,
    payload: UpdateCollectionRequest,
) -> AppResult<ApiResponse<Collection>> {
    ensure(user, Capability::ManageCatalog)?;

    let existing = Collections::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut active: CollectionActive = existing.into();
    if let Some(name) = payload.name {
        validate_name(&name)?;
        active.name = Set(name.trim().to_string());
    }
    if let Some(product_id) = payload.featured_product_id {
        ensure_product(&state.orm, product_id).await?;
        active.featured_product_id = Set(Some(product_id));
    }
    let model = active.update(&state.orm).await?;

    let collection = single(&state.orm, model).await?;
    Ok(ApiResponse::success("Updated", collection, Some(Meta::empty())))
}

/// A collection that still holds products cannot be deleted.
pub async fn delete_collection(
    state: &AppState,
    user: &AuthUser,
    id: i64,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure(user, Capability::ManageCatalog)?;

    let collection = Collections::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let products = Products::find()
        .filter(ProductCol::CollectionId.eq(collection.id))
        .count(&state.orm)
        .await?;
    if products > 0 {
        return Err(AppError::Conflict(
            "Collection cannot be deleted because it includes one or more products".into(),
        ));
    }

    Collections::delete_by_id(collection.id)
        .exec(&state.orm)
        .await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "collection_delete",
        "collections",
        serde_json::json!({ "collection_id": collection.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

async fn ensure_product<C: ConnectionTrait>(db: &C, product_id: i64) -> AppResult<()> {
    if Products::find_by_id(product_id).count(db).await? == 0 {
        return Err(AppError::Validation("featured product not found".into()));
    }
    Ok(())
}

async fn single<C: ConnectionTrait>(db: &C, model: CollectionModel) -> AppResult<Collection> {
    with_counts(db, vec![model])
        .await?
        .pop()
        .ok_or(AppError::NotFound)
}

async fn with_counts<C: ConnectionTrait>(
    db: &C,
    models: Vec<CollectionModel>,
) -> AppResult<Vec<Collection>> {
    let ids: Vec<i64> = models.iter().map(|c| c.id).collect();
    let counts: HashMap<i64, i64> = Products::find()
        .select_only()
        .column(ProductCol::CollectionId)
        .column_as(Expr::col(ProductCol::Id).count(), "products_count")
        .filter(ProductCol::CollectionId.is_in(ids))
        .group_by(ProductCol::CollectionId)
        .into_tuple::<(i64, i64)>()
        .all(db)
        .await?
        .into_iter()
        .collect();

    Ok(models
        .into_iter()
        .map(|model| Collection {
            products_count: counts.get(&model.id).copied().unwrap_or(0),
            id: model.id,
            name: model.name,
            featured_product_id: model.featured_product_id,
        })
        .collect())
}
