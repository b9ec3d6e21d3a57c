use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};

use crate::{
    dto::catalog::{CreateReviewRequest, ReviewList},
    entity::{
        products::Entity as Products,
        reviews::{ActiveModel as ReviewActive, Column as ReviewCol, Entity as Reviews},
    },
    error::{AppError, AppResult},
    middleware::{
        auth::AuthUser,
        permissions::{Capability, ensure},
    },
    models::Review,
    response::{ApiResponse, Meta},
    state::AppState,
};

async fn ensure_product(state: &AppState, product_id: i64) -> AppResult<()> {
    if Products::find_by_id(product_id).count(&state.orm).await? == 0 {
        return Err(AppError::NotFound);
    }
    Ok(())
}

pub async fn list_reviews(state: &AppState, product_id: i64) -> AppResult<ApiResponse<ReviewList>> {
    ensure_product(state, product_id).await?;

    let items: Vec<Review> = Reviews::find()
        .filter(ReviewCol::ProductId.eq(product_id))
        .order_by_desc(ReviewCol::CreatedAt)
        .order_by_desc(ReviewCol::Id)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Review::from)
        .collect();
    let total = items.len() as i64;

    Ok(ApiResponse::success(
        "Reviews",
        ReviewList { items },
        Some(Meta::total(total)),
    ))
}

pub async fn get_review(
    state: &AppState,
    product_id: i64,
    review_id: i64,
) -> AppResult<ApiResponse<Review>> {
    let review = Reviews::find_by_id(review_id)
        .filter(ReviewCol::ProductId.eq(product_id))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success("Review", Review::from(review), None))
}

/// Reviews are open to anonymous visitors.
pub async fn create_review(
    state: &AppState,
    product_id: i64,
    payload: CreateReviewRequest,
) -> AppResult<ApiResponse<Review>> {
    let name = payload.name.trim();
    if name.is_empty() || name.chars().count() > 60 {
        return Err(AppError::Validation(
            "name must be between 1 and 60 characters".into(),
        ));
    }
    if payload.description.trim().is_empty() {
        return Err(AppError::Validation("description must not be empty".into()));
    }
    ensure_product(state, product_id).await?;

    let review = ReviewActive {
        id: NotSet,
        product_id: Set(product_id),
        name: Set(name.to_string()),
        description: Set(payload.description.trim().to_string()),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(ApiResponse::success(
        "Review created",
        Review::from(review),
        Some(Meta::empty()),
    ))
}

pub async fn delete_review(
    state: &AppState,
    user: &AuthUser,
    product_id: i64,
    review_id: i64,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure(user, Capability::ModerateReviews)?;

    let result = Reviews::delete_many()
        .filter(ReviewCol::Id.eq(review_id))
        .filter(ReviewCol::ProductId.eq(product_id))
        .exec(&state.orm)
        .await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}
