use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};

use crate::{
    audit,
    dto::tags::{CreateTagRequest, LikeSummary, TagList, TagTarget},
    entity::{
        collections::Entity as Collections,
        customers::Entity as Customers,
        enums::EntityKind,
        liked_items::{ActiveModel as LikeActive, Column as LikeCol, Entity as LikedItems},
        orders::Entity as Orders,
        products::Entity as Products,
        tagged_items::{ActiveModel as TaggedActive, Column as TaggedCol, Entity as TaggedItems},
        tags::{ActiveModel as TagActive, Column as TagCol, Entity as Tags},
    },
    error::{AppError, AppResult},
    middleware::{
        auth::AuthUser,
        permissions::{Capability, ensure},
    },
    models::Tag,
    response::{ApiResponse, Meta},
    state::AppState,
};

/// Checks that the (kind, id) pair names an existing row.
pub async fn target_exists<C: ConnectionTrait>(db: &C, target: TagTarget) -> AppResult<bool> {
    let id = target.object_id;
    let count = match target.kind {
        EntityKind::Product => Products::find_by_id(id).count(db).await?,
        EntityKind::Collection => Collections::find_by_id(id).count(db).await?,
        EntityKind::Customer => Customers::find_by_id(id).count(db).await?,
        EntityKind::Order => Orders::find_by_id(id).count(db).await?,
    };
    Ok(count > 0)
}

pub async fn list_tags(state: &AppState) -> AppResult<ApiResponse<TagList>> {
    let items: Vec<Tag> = Tags::find()
        .order_by_asc(TagCol::Label)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Tag::from)
        .collect();
    let total = items.len() as i64;

    Ok(ApiResponse::success(
        "Tags",
        TagList { items },
        Some(Meta::total(total)),
    ))
}

pub async fn create_tag(
    state: &AppState,
    user: &AuthUser,
    payload: CreateTagRequest,
) -> AppResult<ApiResponse<Tag>> {
    ensure(user, Capability::ManageTags)?;
    let label = payload.label.trim();
    if label.is_empty() {
        return Err(AppError::Validation("label must not be empty".into()));
    }

    let tag = TagActive {
        id: NotSet,
        label: Set(label.to_string()),
    }
    .insert(&state.orm)
    .await?;

    Ok(ApiResponse::success(
        "Tag created",
        Tag::from(tag),
        Some(Meta::empty()),
    ))
}

/// A tag still attached to anything is protected.
pub async fn delete_tag(
    state: &AppState,
    user: &AuthUser,
    id: i64,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure(user, Capability::ManageTags)?;

    let tag = Tags::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let attached = TaggedItems::find()
        .filter(TaggedCol::TagId.eq(tag.id))
        .count(&state.orm)
        .await?;
    if attached > 0 {
        return Err(AppError::Conflict(
            "Tag cannot be deleted because it is attached to one or more items".into(),
        ));
    }

    Tags::delete_by_id(tag.id).exec(&state.orm).await?;

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

/// Attaching the same tag twice leaves a single association.
pub async fn attach_tag(
    state: &AppState,
    user: &AuthUser,
    tag_id: i64,
    target: TagTarget,
) -> AppResult<ApiResponse<TagList>> {
    ensure(user, Capability::ManageTags)?;

    if Tags::find_by_id(tag_id).count(&state.orm).await? == 0 {
        return Err(AppError::NotFound);
    }
    if !target_exists(&state.orm, target).await? {
        return Err(AppError::NotFound);
    }

    TaggedItems::insert(TaggedActive {
        id: NotSet,
        tag_id: Set(tag_id),
        entity_kind: Set(target.kind),
        object_id: Set(target.object_id),
    })
    .on_conflict(
        OnConflict::columns([TaggedCol::EntityKind, TaggedCol::ObjectId, TaggedCol::TagId])
            .do_nothing()
            .to_owned(),
    )
    .exec_without_returning(&state.orm)
    .await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "tag_attach",
        "tagged_items",
        serde_json::json!({ "tag_id": tag_id, "kind": target.kind, "object_id": target.object_id }),
    )
    .await;

    let items = load_tags(&state.orm, target).await?;
    Ok(ApiResponse::success(
        "Tag attached",
        TagList { items },
        Some(Meta::empty()),
    ))
}

pub async fn detach_tag(
    state: &AppState,
    user: &AuthUser,
    tag_id: i64,
    target: TagTarget,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure(user, Capability::ManageTags)?;

    let result = TaggedItems::delete_many()
        .filter(TaggedCol::TagId.eq(tag_id))
        .filter(TaggedCol::EntityKind.eq(target.kind))
        .filter(TaggedCol::ObjectId.eq(target.object_id))
        .exec(&state.orm)
        .await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    Ok(ApiResponse::success(
        "Tag detached",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub async fn tags_for(state: &AppState, target: TagTarget) -> AppResult<ApiResponse<TagList>> {
    let items = load_tags(&state.orm, target).await?;
    let total = items.len() as i64;
    Ok(ApiResponse::success(
        "Tags",
        TagList { items },
        Some(Meta::total(total)),
    ))
}

async fn load_tags<C: ConnectionTrait>(db: &C, target: TagTarget) -> AppResult<Vec<Tag>> {
    Ok(Tags::find()
        .inner_join(TaggedItems)
        .filter(TaggedCol::EntityKind.eq(target.kind))
        .filter(TaggedCol::ObjectId.eq(target.object_id))
        .order_by_asc(TagCol::Label)
        .all(db)
        .await?
        .into_iter()
        .map(Tag::from)
        .collect())
}

pub async fn like_summary(
    state: &AppState,
    target: TagTarget,
) -> AppResult<ApiResponse<LikeSummary>> {
    let summary = count_likes(&state.orm, target).await?;
    Ok(ApiResponse::success("Likes", summary, None))
}

/// Liking is idempotent per principal.
pub async fn like(
    state: &AppState,
    user: &AuthUser,
    target: TagTarget,
) -> AppResult<ApiResponse<LikeSummary>> {
    if !target_exists(&state.orm, target).await? {
        return Err(AppError::NotFound);
    }

    LikedItems::insert(LikeActive {
        id: NotSet,
        user_id: Set(user.user_id),
        entity_kind: Set(target.kind),
        object_id: Set(target.object_id),
    })
    .on_conflict(
        OnConflict::columns([LikeCol::UserId, LikeCol::EntityKind, LikeCol::ObjectId])
            .do_nothing()
            .to_owned(),
    )
    .exec_without_returning(&state.orm)
    .await?;

    let summary = count_likes(&state.orm, target).await?;
    Ok(ApiResponse::success("Liked", summary, Some(Meta::empty())))
}

pub async fn unlike(
    state: &AppState,
    user: &AuthUser,
    target: TagTarget,
) -> AppResult<ApiResponse<LikeSummary>> {
    LikedItems::delete_many()
        .filter(LikeCol::UserId.eq(user.user_id))
        .filter(LikeCol::EntityKind.eq(target.kind))
        .filter(LikeCol::ObjectId.eq(target.object_id))
        .exec(&state.orm)
        .await?;

    let summary = count_likes(&state.orm, target).await?;
    Ok(ApiResponse::success("Unliked", summary, Some(Meta::empty())))
}

async fn count_likes<C: ConnectionTrait>(db: &C, target: TagTarget) -> AppResult<LikeSummary> {
    let likes = LikedItems::find()
        .filter(LikeCol::EntityKind.eq(target.kind))
        .filter(LikeCol::ObjectId.eq(target.object_id))
        .count(db)
        .await?;
    Ok(LikeSummary {
        kind: target.kind,
        object_id: target.object_id,
        likes,
    })
}
