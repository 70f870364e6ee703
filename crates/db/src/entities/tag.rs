//! Tag entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "tag")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub name: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::publication_tag::Entity")]
    PublicationTags,
}

impl Related<super::publication_tag::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PublicationTags.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
