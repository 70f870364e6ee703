//! Notification entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::target::{Target, TargetKind};

/// Notification types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    #[sea_orm(string_value = "follow")]
    Follow,
    #[sea_orm(string_value = "discussion_in_publication")]
    DiscussionInPublication,
    #[sea_orm(string_value = "publication_comment")]
    PublicationComment,
    #[sea_orm(string_value = "discussion_reply")]
    DiscussionReply,
    #[sea_orm(string_value = "publication_added")]
    PublicationAdded,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "notification")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// The user receiving the notification
    pub recipient_id: String,

    /// The user who triggered the notification
    #[sea_orm(nullable)]
    pub actor_id: Option<String>,

    pub notification_type: NotificationType,

    /// Kind of the entity this notification is about
    pub target_kind: TargetKind,

    pub target_id: String,

    pub title: String,

    #[sea_orm(column_type = "Text")]
    pub message: String,

    /// Where the client should go when the notification is opened
    #[sea_orm(nullable)]
    pub action_url: Option<String>,

    #[sea_orm(default_value = false)]
    pub is_read: bool,

    /// Hidden from listings but kept in the table
    #[sea_orm(default_value = false)]
    pub is_deleted: bool,

    #[sea_orm(nullable)]
    pub read_at: Option<DateTimeWithTimeZone>,

    pub created_at: DateTimeWithTimeZone,
}

impl Model {
    /// The entity this notification points at.
    #[must_use]
    pub fn target(&self) -> Target {
        Target::from_parts(self.target_kind, self.target_id.clone())
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::RecipientId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Recipient,

    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::ActorId",
        to = "super::user::Column::Id",
        on_delete = "SetNull"
    )]
    Actor,
}

impl ActiveModelBehavior for ActiveModel {}
