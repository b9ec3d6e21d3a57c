use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
};

use crate::{
    dto::tags::{CreateTagRequest, LikeSummary, TagList, TagTarget},
    entity::enums::EntityKind,
    error::AppResult,
    middleware::auth::AuthUser,
    models::Tag,
    response::ApiResponse,
    services::tag_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_tags).post(create_tag))
        .route("/{id}", delete(delete_tag))
        .route("/{id}/items", post(attach_tag).delete(detach_tag))
}

pub fn tagged_router() -> Router<AppState> {
    Router::new().route("/{kind}/{id}", get(tags_for))
}

pub fn likes_router() -> Router<AppState> {
    Router::new().route("/{kind}/{id}", get(like_summary).post(like).delete(unlike))
}

#[utoipa::path(
    get,
    path = "/api/tags",
    responses(
        (status = 200, description = "List tags", body = ApiResponse<TagList>)
    ),
    tag = "Tags"
)]
pub async fn list_tags(State(state): State<AppState>) -> AppResult<Json<ApiResponse<TagList>>> {
    let resp = tag_service::list_tags(&state).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/tags",
    request_body = CreateTagRequest,
    responses(
        (status = 201, description = "Create tag", body = ApiResponse<Tag>),
        (status = 400, description = "Invalid payload"),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Tags"
)]
pub async fn create_tag(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateTagRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Tag>>)> {
    let resp = tag_service::create_tag(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    delete,
    path = "/api/tags/{id}",
    params(("id" = i64, Path, description = "Tag ID")),
    responses(
        (status = 200, description = "Deleted", body = ApiResponse<serde_json::Value>),
        (status = 404, description = "Not Found"),
        (status = 409, description = "Tag is still attached"),
    ),
    security(("bearer_auth" = [])),
    tag = "Tags"
)]
pub async fn delete_tag(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = tag_service::delete_tag(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/tags/{id}/items",
    params(("id" = i64, Path, description = "Tag ID")),
    request_body = TagTarget,
    responses(
        (status = 200, description = "Attach tag; returns the target's tags", body = ApiResponse<TagList>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Tag or target not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Tags"
)]
pub async fn attach_tag(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
    Json(target): Json<TagTarget>,
) -> AppResult<Json<ApiResponse<TagList>>> {
    let resp = tag_service::attach_tag(&state, &user, id, target).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/tags/{id}/items",
    params(("id" = i64, Path, description = "Tag ID")),
    request_body = TagTarget,
    responses(
        (status = 200, description = "Detach tag", body = ApiResponse<serde_json::Value>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Tags"
)]
pub async fn detach_tag(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
    Json(target): Json<TagTarget>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = tag_service::detach_tag(&state, &user, id, target).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/tagged/{kind}/{id}",
    params(
        ("kind" = EntityKind, Path, description = "Entity kind"),
        ("id" = i64, Path, description = "Entity ID")
    ),
    responses(
        (status = 200, description = "Tags attached to an entity", body = ApiResponse<TagList>)
    ),
    tag = "Tags"
)]
pub async fn tags_for(
    State(state): State<AppState>,
    Path((kind, object_id)): Path<(EntityKind, i64)>,
) -> AppResult<Json<ApiResponse<TagList>>> {
    let resp = tag_service::tags_for(&state, TagTarget { kind, object_id }).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/likes/{kind}/{id}",
    params(
        ("kind" = EntityKind, Path, description = "Entity kind"),
        ("id" = i64, Path, description = "Entity ID")
    ),
    responses(
        (status = 200, description = "Like count of an entity", body = ApiResponse<LikeSummary>)
    ),
    tag = "Likes"
)]
pub async fn like_summary(
    State(state): State<AppState>,
    Path((kind, object_id)): Path<(EntityKind, i64)>,
) -> AppResult<Json<ApiResponse<LikeSummary>>> {
    let resp = tag_service::like_summary(&state, TagTarget { kind, object_id }).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/likes/{kind}/{id}",
    params(
        ("kind" = EntityKind, Path, description = "Entity kind"),
        ("id" = i64, Path, description = "Entity ID")
    ),
    responses(
        (status = 200, description = "Like an entity", body = ApiResponse<LikeSummary>),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Likes"
)]
pub async fn like(
    State(state): State<AppState>,
    user: AuthUser,
    Path((kind, object_id)): Path<(EntityKind, i64)>,
) -> AppResult<Json<ApiResponse<LikeSummary>>> {
    let resp = tag_service::like(&state, &user, TagTarget { kind, object_id }).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/likes/{kind}/{id}",
    params(
        ("kind" = EntityKind, Path, description = "Entity kind"),
        ("id" = i64, Path, description = "Entity ID")
    ),
    responses(
        (status = 200, description = "Remove a like", body = ApiResponse<LikeSummary>),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer_auth" = [])),
    tag = "Likes"
)]
pub async fn unlike(
    State(state): State<AppState>,
    user: AuthUser,
    Path((kind, object_id)): Path<(EntityKind, i64)>,
) -> AppResult<Json<ApiResponse<LikeSummary>>> {
    let resp = tag_service::unlike(&state, &user, TagTarget { kind, object_id }).await?;
    Ok(Json(resp))
}
