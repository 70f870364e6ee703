//! User entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A registered account with its academic profile.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Login name (unique).
    #[sea_orm(unique)]
    pub username: String,

    /// Email address (unique).
    #[sea_orm(unique)]
    pub email: String,

    /// Argon2 PHC string.
    #[serde(skip_serializing)]
    pub password_hash: String,

    #[sea_orm(nullable)]
    pub first_name: Option<String>,

    #[sea_orm(nullable)]
    pub last_name: Option<String>,

    /// School or institution.
    pub school: String,

    #[sea_orm(column_type = "Text", nullable)]
    pub bio: Option<String>,

    /// `LinkedIn` profile URL.
    #[sea_orm(nullable)]
    pub linkedin: Option<String>,

    /// `GitHub` profile URL.
    #[sea_orm(nullable)]
    pub github: Option<String>,

    /// Storage key of the profile photo.
    pub photo: String,

    /// URL slug derived from the username at creation (unique, never regenerated).
    #[sea_orm(unique)]
    pub slug: String,

    /// Number of publications this user has uploaded.
    #[sea_orm(default_value = 0)]
    pub nb_documents: i32,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::publication::Entity")]
    Publications,

    #[sea_orm(has_many = "super::collection::Entity")]
    Collections,

    #[sea_orm(has_many = "super::session::Entity")]
    Sessions,
}

impl Related<super::publication::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Publications.def()
    }
}

impl Related<super::collection::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Collections.def()
    }
}

impl Related<super::session::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Sessions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
