//! Search history entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::target::{Target, TargetKind};

/// One remembered query of a user, optionally with the result they opened.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "search_history")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub user_id: String,

    /// Trimmed, lowercased query text.
    pub query: String,

    /// Search tab the query was issued from.
    pub search_type: String,

    #[sea_orm(nullable)]
    pub target_kind: Option<TargetKind>,

    #[sea_orm(nullable)]
    pub target_id: Option<String>,

    #[sea_orm(default_value = 1)]
    pub usage_count: i32,

    pub last_used: DateTimeWithTimeZone,

    pub created_at: DateTimeWithTimeZone,
}

impl Model {
    /// The clicked result, if any.
    #[must_use]
    pub fn target(&self) -> Option<Target> {
        match (self.target_kind, &self.target_id) {
            (Some(kind), Some(id)) => Some(Target::from_parts(kind, id.clone())),
            _ => None,
        }
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
}

impl ActiveModelBehavior for ActiveModel {}
