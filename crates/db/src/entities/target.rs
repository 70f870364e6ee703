//! Generic references to other entities.
//!
//! Notifications and search history point at "some entity". That reference is
//! stored as a [`TargetKind`] discriminant column next to an ID column and is
//! handled in code as the [`Target`] tagged union.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Discriminant of a [`Target`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    #[sea_orm(string_value = "publication")]
    Publication,
    #[sea_orm(string_value = "user")]
    User,
    #[sea_orm(string_value = "collection")]
    Collection,
    #[sea_orm(string_value = "discussion")]
    Discussion,
    #[sea_orm(string_value = "message")]
    Message,
}

/// A reference to one entity of a known kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Target {
    Publication(String),
    User(String),
    Collection(String),
    Discussion(String),
    Message(String),
}

impl Target {
    /// Rebuild a target from its stored columns.
    #[must_use]
    pub fn from_parts(kind: TargetKind, id: String) -> Self {
        match kind {
            TargetKind::Publication => Self::Publication(id),
            TargetKind::User => Self::User(id),
            TargetKind::Collection => Self::Collection(id),
            TargetKind::Discussion => Self::Discussion(id),
            TargetKind::Message => Self::Message(id),
        }
    }

    #[must_use]
    pub const fn kind(&self) -> TargetKind {
        match self {
            Self::Publication(_) => TargetKind::Publication,
            Self::User(_) => TargetKind::User,
            Self::Collection(_) => TargetKind::Collection,
            Self::Discussion(_) => TargetKind::Discussion,
            Self::Message(_) => TargetKind::Message,
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Publication(id)
            | Self::User(id)
            | Self::Collection(id)
            | Self::Discussion(id)
            | Self::Message(id) => id,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parts_round_trip() {
        let target = Target::Discussion("d1".to_string());
        let rebuilt = Target::from_parts(target.kind(), target.id().to_string());
        assert_eq!(rebuilt, target);
    }

    #[test]
    fn test_serde_shape() {
        let json = serde_json::to_value(Target::Publication("p1".to_string())).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "publication", "id": "p1"}));
    }
}
