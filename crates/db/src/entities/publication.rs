//! Publication entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// An uploaded academic publication (PDF plus metadata).
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "publication")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Uploader. Nulled when the account is deleted; the publication stays.
    #[sea_orm(nullable)]
    pub owner_id: Option<String>,

    #[sea_orm(nullable)]
    pub topic_id: Option<String>,

    /// Title of the publication.
    pub theme: String,

    /// Comma-separated list of affiliations.
    #[sea_orm(column_type = "Text")]
    pub affiliations: String,

    #[sea_orm(column_type = "Text")]
    pub description: String,

    #[sea_orm(column_type = "Text")]
    pub summary: String,

    /// Storage key of the PDF.
    pub file_key: String,

    /// Filename as uploaded, used for `Content-Disposition`.
    pub file_name: String,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

impl Model {
    /// Affiliations split on commas, trimmed, blanks dropped.
    #[must_use]
    pub fn affiliations_list(&self) -> Vec<String> {
        self.affiliations
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ToString::to_string)
            .collect()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::OwnerId",
        to = "super::user::Column::Id",
        on_delete = "SetNull"
    )]
    Owner,

    #[sea_orm(
        belongs_to = "super::topic::Entity",
        from = "Column::TopicId",
        to = "super::topic::Column::Id",
        on_delete = "SetNull"
    )]
    Topic,

    #[sea_orm(has_many = "super::publication_author::Entity")]
    Authors,

    #[sea_orm(has_many = "super::publication_tag::Entity")]
    Tags,

    #[sea_orm(has_many = "super::discussion::Entity")]
    Discussions,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Owner.def()
    }
}

impl Related<super::topic::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Topic.def()
    }
}

impl Related<super::publication_author::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Authors.def()
    }
}

impl Related<super::publication_tag::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tags.def()
    }
}

impl Related<super::discussion::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Discussions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
