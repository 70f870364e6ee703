//! Session repository.

use std::sync::Arc;

use crate::entities::{Session, session, user};
use noxa_common::{AppError, AppResult};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

/// Session repository for database operations.
#[derive(Clone)]
pub struct SessionRepository {
    db: Arc<DatabaseConnection>,
}

impl SessionRepository {
    /// Create a new session repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Store a new session.
    pub async fn create(&self, model: session::ActiveModel) -> AppResult<session::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Resolve a session token to its user.
    pub async fn find_user_by_token(&self, token: &str) -> AppResult<Option<user::Model>> {
        let found = Session::find_by_id(token)
            .find_also_related(user::Entity)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(found.and_then(|(_, user)| user))
    }

    /// Delete a session. Unknown tokens are ignored.
    pub async fn delete(&self, token: &str) -> AppResult<()> {
        Session::delete_many()
            .filter(session::Column::Id.eq(token))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    #[tokio::test]
    async fn test_find_user_by_unknown_token() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<(session::Model, Option<user::Model>)>::new()])
                .into_connection(),
        );

        let repo = SessionRepository::new(db);
        assert!(repo.find_user_by_token("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_is_unconditional() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );

        let repo = SessionRepository::new(db);
        repo.delete("already-gone").await.unwrap();
    }
}
