//! Collection repository.

use std::sync::Arc;

use crate::entities::{
    Collection, CollectionPublication, User, collection, collection_publication, publication,
    user,
};
use crate::repositories::filter::contains_ci;
use noxa_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    ModelTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, sea_query::Query,
};

/// Collection repository for database operations.
#[derive(Clone)]
pub struct CollectionRepository {
    db: Arc<DatabaseConnection>,
}

impl CollectionRepository {
    /// Create a new collection repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a collection by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<collection::Model>> {
        Collection::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a collection by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<collection::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Collection {id}")))
    }

    /// Collections owned by a user, newest first.
    pub async fn find_by_user(&self, user_id: &str) -> AppResult<Vec<collection::Model>> {
        Collection::find()
            .filter(collection::Column::UserId.eq(user_id))
            .order_by_desc(collection::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a user's collection by exact name.
    pub async fn find_by_user_and_name_in<C: ConnectionTrait>(
        &self,
        conn: &C,
        user_id: &str,
        name: &str,
    ) -> AppResult<Option<collection::Model>> {
        Collection::find()
            .filter(collection::Column::UserId.eq(user_id))
            .filter(collection::Column::Name.eq(name))
            .one(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a collection.
    pub async fn create_in<C: ConnectionTrait>(
        &self,
        conn: &C,
        model: collection::ActiveModel,
    ) -> AppResult<collection::Model> {
        model
            .insert(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a collection (memberships cascade).
    pub async fn delete(&self, collection: collection::Model) -> AppResult<()> {
        collection
            .delete(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Find a membership row.
    pub async fn find_entry_in<C: ConnectionTrait>(
        &self,
        conn: &C,
        collection_id: &str,
        publication_id: &str,
    ) -> AppResult<Option<collection_publication::Model>> {
        CollectionPublication::find()
            .filter(collection_publication::Column::CollectionId.eq(collection_id))
            .filter(collection_publication::Column::PublicationId.eq(publication_id))
            .one(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert a membership row.
    pub async fn add_entry_in<C: ConnectionTrait>(
        &self,
        conn: &C,
        model: collection_publication::ActiveModel,
    ) -> AppResult<collection_publication::Model> {
        model
            .insert(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Remove a publication from a collection. Returns whether a row was removed.
    pub async fn remove_entry(&self, collection_id: &str, publication_id: &str) -> AppResult<bool> {
        let result = CollectionPublication::delete_many()
            .filter(collection_publication::Column::CollectionId.eq(collection_id))
            .filter(collection_publication::Column::PublicationId.eq(publication_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected > 0)
    }

    /// Number of publications in a collection.
    pub async fn count_publications(&self, collection_id: &str) -> AppResult<u64> {
        CollectionPublication::find()
            .filter(collection_publication::Column::CollectionId.eq(collection_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Publications of a collection with their membership rows, most recently added first.
    pub async fn find_publications(
        &self,
        collection_id: &str,
    ) -> AppResult<Vec<(collection_publication::Model, publication::Model)>> {
        let rows = CollectionPublication::find()
            .filter(collection_publication::Column::CollectionId.eq(collection_id))
            .find_also_related(publication::Entity)
            .order_by_desc(collection_publication::Column::AddedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(rows
            .into_iter()
            .filter_map(|(entry, publication)| publication.map(|p| (entry, p)))
            .collect())
    }

    /// Search collections by name or owner username.
    pub async fn search(&self, q: &str, limit: u64) -> AppResult<Vec<collection::Model>> {
        Collection::find()
            .filter(
                Condition::any()
                    .add(contains_ci((Collection, collection::Column::Name), q))
                    .add(
                        collection::Column::UserId.in_subquery(
                            Query::select()
                                .column(user::Column::Id)
                                .from(User)
                                .and_where(contains_ci((User, user::Column::Username), q))
                                .to_owned(),
                        ),
                    ),
            )
            .order_by_desc(collection::Column::CreatedAt)
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
    use chrono::Utc;
    use maplit::btreemap;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, Value};

    fn create_test_collection(id: &str, user_id: &str, name: &str) -> collection::Model {
        collection::Model {
            id: id.to_string(),
            user_id: user_id.to_string(),
            name: name.to_string(),
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_find_by_user_and_name() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_collection("c1", "u1", "Reading")]])
                .append_query_results([Vec::<collection::Model>::new()])
                .into_connection(),
        );

        let repo = CollectionRepository::new(db.clone());
        let found = repo
            .find_by_user_and_name_in(db.as_ref(), "u1", "Reading")
            .await
            .unwrap();
        assert_eq!(found.unwrap().id, "c1");

        let missing = repo
            .find_by_user_and_name_in(db.as_ref(), "u1", "reading")
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_count_publications() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[btreemap! { "num_items" => Value::BigInt(Some(3)) }]])
                .into_connection(),
        );

        let repo = CollectionRepository::new(db);
        assert_eq!(repo.count_publications("c1").await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_remove_entry_reports_removal() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 1,
                    },
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 0,
                    },
                ])
                .into_connection(),
        );

        let repo = CollectionRepository::new(db);
        assert!(repo.remove_entry("c1", "p1").await.unwrap());
        assert!(!repo.remove_entry("c1", "p1").await.unwrap());
    }
}
