//! Topic service: autocomplete lookups and favorite topics.

use chrono::Utc;
use noxa_common::{AppResult, IdGenerator};
use noxa_db::{
    entities::{tag, topic, user_favorite_topic},
    repositories::{TagRepository, TopicRepository, UserRepository},
};
use sea_orm::Set;
use serde::Serialize;
use tracing::info;

/// Maximum number of autocomplete results.
const AUTOCOMPLETE_LIMIT: u64 = 10;

/// One autocomplete suggestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AutocompleteItem {
    pub id: String,
    pub text: String,
}

/// Outcome of toggling a favorite topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FavoriteToggle {
    Added,
    Removed,
}

/// Topic service for business logic.
#[derive(Clone)]
pub struct TopicService {
    topic_repo: TopicRepository,
    tag_repo: TagRepository,
    user_repo: UserRepository,
    id_gen: IdGenerator,
}

impl TopicService {
    /// Create a new topic service.
    #[must_use]
    pub const fn new(
        topic_repo: TopicRepository,
        tag_repo: TagRepository,
        user_repo: UserRepository,
    ) -> Self {
        Self {
            topic_repo,
            tag_repo,
            user_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// All topics by name.
    pub async fn list_topics(&self) -> AppResult<Vec<topic::Model>> {
        self.topic_repo.find_all().await
    }

    /// All tags by name.
    pub async fn list_tags(&self) -> AppResult<Vec<tag::Model>> {
        self.tag_repo.find_all().await
    }

    pub async fn autocomplete_topics(&self, q: &str) -> AppResult<Vec<AutocompleteItem>> {
        let topics = self.topic_repo.search(q.trim(), AUTOCOMPLETE_LIMIT).await?;
        Ok(topics
            .into_iter()
            .map(|t| AutocompleteItem {
                id: t.id,
                text: t.name,
            })
            .collect())
    }

    pub async fn autocomplete_authors(&self, q: &str) -> AppResult<Vec<AutocompleteItem>> {
        let users = self
            .user_repo
            .search_usernames(q.trim(), AUTOCOMPLETE_LIMIT)
            .await?;
        Ok(users
            .into_iter()
            .map(|u| AutocompleteItem {
                id: u.id,
                text: u.username,
            })
            .collect())
    }

    pub async fn autocomplete_tags(&self, q: &str) -> AppResult<Vec<AutocompleteItem>> {
        let tags = self.tag_repo.search(q.trim(), AUTOCOMPLETE_LIMIT).await?;
        Ok(tags
            .into_iter()
            .map(|t| AutocompleteItem {
                id: t.id,
                text: t.name,
            })
            .collect())
    }

    /// Topics the user marked as favorite.
    pub async fn favorites(&self, user_id: &str) -> AppResult<Vec<topic::Model>> {
        self.topic_repo.find_favorites(user_id).await
    }

    /// Add the topic to the user's favorites, or remove it when already there.
    pub async fn toggle_favorite(&self, user_id: &str, topic_id: &str) -> AppResult<FavoriteToggle> {
        let topic = self.topic_repo.get_by_id(topic_id).await?;

        if let Some(existing) = self.topic_repo.find_favorite(user_id, &topic.id).await? {
            self.topic_repo.remove_favorite(existing).await?;
            info!(user_id, topic_id, "Topic removed from favorites");
            return Ok(FavoriteToggle::Removed);
        }

        self.topic_repo
            .add_favorite(user_favorite_topic::ActiveModel {
                id: Set(self.id_gen.generate()),
                user_id: Set(user_id.to_string()),
                topic_id: Set(topic.id),
                created_at: Set(Utc::now().into()),
            })
            .await?;
        info!(user_id, topic_id, "Topic added to favorites");
        Ok(FavoriteToggle::Added)
    }

    /// Remove the topic from the user's favorites if it is there.
    pub async fn remove_favorite(&self, user_id: &str, topic_id: &str) -> AppResult<()> {
        let topic = self.topic_repo.get_by_id(topic_id).await?;

        if let Some(existing) = self.topic_repo.find_favorite(user_id, &topic.id).await? {
            self.topic_repo.remove_favorite(existing).await?;
            info!(user_id, topic_id, "Topic removed from favorites");
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_support::{create_test_topic, create_test_user};
    use noxa_common::AppError;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use std::sync::Arc;

    fn service_with(db: MockDatabase) -> TopicService {
        let db = Arc::new(db.into_connection());
        TopicService::new(
            TopicRepository::new(db.clone()),
            TagRepository::new(db.clone()),
            UserRepository::new(db),
        )
    }

    fn favorite(id: &str) -> user_favorite_topic::Model {
        user_favorite_topic::Model {
            id: id.to_string(),
            user_id: "u1".to_string(),
            topic_id: "t1".to_string(),
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_autocomplete_authors_shape() {
        let service = service_with(
            MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[
                create_test_user("u1", "alice"),
                create_test_user("u2", "malik"),
            ]]),
        );

        let items = service.autocomplete_authors("Ali").await.unwrap();
        assert_eq!(
            items,
            vec![
                AutocompleteItem {
                    id: "u1".to_string(),
                    text: "alice".to_string()
                },
                AutocompleteItem {
                    id: "u2".to_string(),
                    text: "malik".to_string()
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_toggle_twice_restores_state() {
        let topic = create_test_topic("t1", "Statistics");
        let service = service_with(
            MockDatabase::new(DatabaseBackend::Postgres)
                // first toggle: topic, no favorite, insert
                .append_query_results([[topic.clone()]])
                .append_query_results([Vec::<user_favorite_topic::Model>::new()])
                .append_query_results([[favorite("f1")]])
                // second toggle: topic, favorite found, delete
                .append_query_results([[topic]])
                .append_query_results([[favorite("f1")]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }]),
        );

        assert_eq!(
            service.toggle_favorite("u1", "t1").await.unwrap(),
            FavoriteToggle::Added
        );
        assert_eq!(
            service.toggle_favorite("u1", "t1").await.unwrap(),
            FavoriteToggle::Removed
        );
    }

    #[tokio::test]
    async fn test_remove_absent_favorite_is_noop() {
        let service = service_with(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_topic("t1", "Statistics")]])
                .append_query_results([Vec::<user_favorite_topic::Model>::new()]),
        );

        assert!(service.remove_favorite("u1", "t1").await.is_ok());
    }

    #[tokio::test]
    async fn test_toggle_unknown_topic_not_found() {
        let service = service_with(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<topic::Model>::new()]),
        );

        let result = service.toggle_favorite("u1", "missing").await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
