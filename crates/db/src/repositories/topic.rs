//! Topic and tag repositories.

use std::sync::Arc;

use crate::entities::{
    PublicationTag, Tag, Topic, UserFavoriteTopic, publication_tag, tag, topic,
    user_favorite_topic,
};
use crate::repositories::filter::contains_ci;
use noxa_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, ModelTrait,
    QueryFilter, QueryOrder, QuerySelect, sea_query::Query,
};

/// Topic repository for database operations.
#[derive(Clone)]
pub struct TopicRepository {
    db: Arc<DatabaseConnection>,
}

impl TopicRepository {
    /// Create a new topic repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a topic by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<topic::Model>> {
        Topic::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a topic by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<topic::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Topic {id}")))
    }

    /// All topics by name.
    pub async fn find_all(&self) -> AppResult<Vec<topic::Model>> {
        Topic::find()
            .order_by_asc(topic::Column::Name)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a topic by exact (case-sensitive) name.
    pub async fn find_by_name_in<C: ConnectionTrait>(
        &self,
        conn: &C,
        name: &str,
    ) -> AppResult<Option<topic::Model>> {
        Topic::find()
            .filter(topic::Column::Name.eq(name))
            .one(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a topic.
    pub async fn create_in<C: ConnectionTrait>(
        &self,
        conn: &C,
        model: topic::ActiveModel,
    ) -> AppResult<topic::Model> {
        model
            .insert(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Autocomplete topic names (case-insensitive substring).
    pub async fn search(&self, query: &str, limit: u64) -> AppResult<Vec<topic::Model>> {
        Topic::find()
            .filter(contains_ci(topic::Column::Name, query))
            .order_by_asc(topic::Column::Name)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // === Favorites ===

    /// Find a favorite entry.
    pub async fn find_favorite(
        &self,
        user_id: &str,
        topic_id: &str,
    ) -> AppResult<Option<user_favorite_topic::Model>> {
        UserFavoriteTopic::find()
            .filter(user_favorite_topic::Column::UserId.eq(user_id))
            .filter(user_favorite_topic::Column::TopicId.eq(topic_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Add a favorite entry.
    pub async fn add_favorite(
        &self,
        model: user_favorite_topic::ActiveModel,
    ) -> AppResult<user_favorite_topic::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Remove a favorite entry.
    pub async fn remove_favorite(&self, favorite: user_favorite_topic::Model) -> AppResult<()> {
        favorite
            .delete(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Topics a user marked as favorite.
    pub async fn find_favorites(&self, user_id: &str) -> AppResult<Vec<topic::Model>> {
        Topic::find()
            .filter(
                topic::Column::Id.in_subquery(
                    Query::select()
                        .column(user_favorite_topic::Column::TopicId)
                        .from(UserFavoriteTopic)
                        .and_where(user_favorite_topic::Column::UserId.eq(user_id))
                        .to_owned(),
                ),
            )
            .order_by_asc(topic::Column::Name)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

/// Tag repository for database operations.
#[derive(Clone)]
pub struct TagRepository {
    db: Arc<DatabaseConnection>,
}

impl TagRepository {
    /// Create a new tag repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// All tags by name.
    pub async fn find_all(&self) -> AppResult<Vec<tag::Model>> {
        Tag::find()
            .order_by_asc(tag::Column::Name)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a tag by exact (case-sensitive) name.
    pub async fn find_by_name_in<C: ConnectionTrait>(
        &self,
        conn: &C,
        name: &str,
    ) -> AppResult<Option<tag::Model>> {
        Tag::find()
            .filter(tag::Column::Name.eq(name))
            .one(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a tag.
    pub async fn create_in<C: ConnectionTrait>(
        &self,
        conn: &C,
        model: tag::ActiveModel,
    ) -> AppResult<tag::Model> {
        model
            .insert(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Tags attached to a publication.
    pub async fn find_by_publication(&self, publication_id: &str) -> AppResult<Vec<tag::Model>> {
        Tag::find()
            .filter(
                tag::Column::Id.in_subquery(
                    Query::select()
                        .column(publication_tag::Column::TagId)
                        .from(PublicationTag)
                        .and_where(publication_tag::Column::PublicationId.eq(publication_id))
                        .to_owned(),
                ),
            )
            .order_by_asc(tag::Column::Name)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Autocomplete / search tag names (case-insensitive substring).
    pub async fn search(&self, query: &str, limit: u64) -> AppResult<Vec<tag::Model>> {
        Tag::find()
            .filter(contains_ci(tag::Column::Name, query))
            .order_by_asc(tag::Column::Name)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, Set};

    fn create_test_topic(id: &str, name: &str) -> topic::Model {
        topic::Model {
            id: id.to_string(),
            name: name.to_string(),
        }
    }

    #[tokio::test]
    async fn test_find_by_name_is_exact() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_topic("t1", "ML")]])
                .into_connection(),
        );

        let repo = TopicRepository::new(db.clone());
        let found = repo.find_by_name_in(db.as_ref(), "ML").await.unwrap();
        assert_eq!(found.unwrap().name, "ML");
    }

    #[tokio::test]
    async fn test_create_topic() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_topic("t2", "ml")]])
                .into_connection(),
        );

        let repo = TopicRepository::new(db.clone());
        let created = repo
            .create_in(
                db.as_ref(),
                topic::ActiveModel {
                    id: Set("t2".to_string()),
                    name: Set("ml".to_string()),
                },
            )
            .await
            .unwrap();
        assert_eq!(created.name, "ml");
    }

    #[tokio::test]
    async fn test_get_by_id_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<topic::Model>::new()])
                .into_connection(),
        );

        let repo = TopicRepository::new(db);
        assert!(matches!(
            repo.get_by_id("missing").await,
            Err(AppError::NotFound(_))
        ));
    }
}
