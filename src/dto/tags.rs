use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{entity::enums::EntityKind, models::Tag};

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct CreateTagRequest {
    pub label: String,
}

/// Target of a generic association.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, ToSchema)]
pub struct TagTarget {
    pub kind: EntityKind,
    pub object_id: i64,
}

#[derive(Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct TagList {
    #[schema(value_type = Vec<Tag>)]
    pub items: Vec<Tag>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LikeSummary {
    pub kind: EntityKind,
    pub object_id: i64,
    pub likes: u64,
}
