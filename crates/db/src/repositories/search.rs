//! Search history and suggestion repositories.

use std::sync::Arc;

use crate::entities::{
    SearchHistory, SearchSuggestion, search_history, search_suggestion, target::TargetKind,
};
use crate::repositories::filter::starts_with;
use chrono::Utc;
use noxa_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect,
    sea_query::{Expr, OnConflict},
};

/// Search history repository for database operations.
#[derive(Clone)]
pub struct SearchHistoryRepository {
    db: Arc<DatabaseConnection>,
}

impl SearchHistoryRepository {
    /// Create a new search history repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find the history row for an exact (user, query, type, target) key.
    pub async fn find_entry_in<C: ConnectionTrait>(
        &self,
        conn: &C,
        user_id: &str,
        query: &str,
        search_type: &str,
        target: Option<(TargetKind, &str)>,
    ) -> AppResult<Option<search_history::Model>> {
        let mut select = SearchHistory::find()
            .filter(search_history::Column::UserId.eq(user_id))
            .filter(search_history::Column::Query.eq(query))
            .filter(search_history::Column::SearchType.eq(search_type));

        select = match target {
            Some((kind, id)) => select
                .filter(search_history::Column::TargetKind.eq(kind))
                .filter(search_history::Column::TargetId.eq(id)),
            None => select
                .filter(search_history::Column::TargetKind.is_null())
                .filter(search_history::Column::TargetId.is_null()),
        };

        select
            .one(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert a history row.
    pub async fn create_in<C: ConnectionTrait>(
        &self,
        conn: &C,
        model: search_history::ActiveModel,
    ) -> AppResult<search_history::Model> {
        model
            .insert(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Bump `usage_count` and refresh `last_used` (single UPDATE query).
    pub async fn touch_in<C: ConnectionTrait>(&self, conn: &C, id: &str) -> AppResult<()> {
        SearchHistory::update_many()
            .col_expr(
                search_history::Column::UsageCount,
                Expr::col(search_history::Column::UsageCount).add(1),
            )
            .col_expr(
                search_history::Column::LastUsed,
                Expr::value(chrono::DateTime::<chrono::FixedOffset>::from(Utc::now())),
            )
            .filter(search_history::Column::Id.eq(id))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Delete everything but the `keep` most recently used rows of a user.
    /// Returns the number of evicted rows.
    pub async fn trim_in<C: ConnectionTrait>(
        &self,
        conn: &C,
        user_id: &str,
        keep: u64,
    ) -> AppResult<u64> {
        let stale: Vec<String> = SearchHistory::find()
            .filter(search_history::Column::UserId.eq(user_id))
            .order_by_desc(search_history::Column::LastUsed)
            .order_by_desc(search_history::Column::Id)
            .offset(keep)
            .all(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .into_iter()
            .map(|h| h.id)
            .collect();

        if stale.is_empty() {
            return Ok(0);
        }

        let result = SearchHistory::delete_many()
            .filter(search_history::Column::Id.is_in(stale))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected)
    }

    /// Most recently used rows of a user.
    pub async fn find_recent(
        &self,
        user_id: &str,
        limit: u64,
    ) -> AppResult<Vec<search_history::Model>> {
        SearchHistory::find()
            .filter(search_history::Column::UserId.eq(user_id))
            .order_by_desc(search_history::Column::LastUsed)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Most used rows of a user.
    pub async fn find_popular(
        &self,
        user_id: &str,
        limit: u64,
    ) -> AppResult<Vec<search_history::Model>> {
        SearchHistory::find()
            .filter(search_history::Column::UserId.eq(user_id))
            .order_by_desc(search_history::Column::UsageCount)
            .order_by_desc(search_history::Column::LastUsed)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Forget a user's whole history.
    pub async fn clear(&self, user_id: &str) -> AppResult<u64> {
        let result = SearchHistory::delete_many()
            .filter(search_history::Column::UserId.eq(user_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected)
    }
}

/// Search suggestion repository for database operations.
#[derive(Clone)]
pub struct SearchSuggestionRepository {
    db: Arc<DatabaseConnection>,
}

impl SearchSuggestionRepository {
    /// Create a new search suggestion repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Count one search of `query`: insert it with a count of 1, or bump the
    /// counter of the existing row in the same statement.
    pub async fn upsert_in<C: ConnectionTrait>(
        &self,
        conn: &C,
        model: search_suggestion::ActiveModel,
    ) -> AppResult<()> {
        SearchSuggestion::insert(model)
            .on_conflict(
                OnConflict::column(search_suggestion::Column::Query)
                    .value(
                        search_suggestion::Column::SearchCount,
                        Expr::col((SearchSuggestion, search_suggestion::Column::SearchCount))
                            .add(1),
                    )
                    .update_column(search_suggestion::Column::LastSearched)
                    .to_owned(),
            )
            .exec_without_returning(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Suggestions starting with `prefix`, most searched first.
    pub async fn find_by_prefix(
        &self,
        prefix: &str,
        limit: u64,
    ) -> AppResult<Vec<search_suggestion::Model>> {
        SearchSuggestion::find()
            .filter(starts_with(search_suggestion::Column::Query, prefix))
            .order_by_desc(search_suggestion::Column::SearchCount)
            .order_by_asc(search_suggestion::Column::Query)
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
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, Set};

    fn create_test_entry(id: &str, usage_count: i32) -> search_history::Model {
        let now = Utc::now().into();
        search_history::Model {
            id: id.to_string(),
            user_id: "u1".to_string(),
            query: "graph".to_string(),
            search_type: "all".to_string(),
            target_kind: None,
            target_id: None,
            usage_count,
            last_used: now,
            created_at: now,
        }
    }

    #[tokio::test]
    async fn test_trim_nothing_to_evict() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<search_history::Model>::new()])
                .into_connection(),
        );

        let repo = SearchHistoryRepository::new(db.clone());
        assert_eq!(repo.trim_in(db.as_ref(), "u1", 20).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_trim_evicts_overflow() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_entry("old1", 1), create_test_entry("old2", 3)]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 2,
                }])
                .into_connection(),
        );

        let repo = SearchHistoryRepository::new(db.clone());
        assert_eq!(repo.trim_in(db.as_ref(), "u1", 20).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_find_entry_without_target() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_entry("h1", 2)]])
                .into_connection(),
        );

        let repo = SearchHistoryRepository::new(db.clone());
        let entry = repo
            .find_entry_in(db.as_ref(), "u1", "graph", "all", None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(entry.usage_count, 2);
        assert!(entry.target().is_none());
    }

    #[tokio::test]
    async fn test_suggestion_upsert_single_statement() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );
        let repo = SearchSuggestionRepository::new(db.clone());

        repo.upsert_in(
            db.as_ref(),
            search_suggestion::ActiveModel {
                id: Set("s1".to_string()),
                query: Set("graph".to_string()),
                search_count: Set(1),
                last_searched: Set(Utc::now().into()),
            },
        )
        .await
        .unwrap();

        drop(repo);
        let log = Arc::try_unwrap(db).unwrap().into_transaction_log();
        assert_eq!(log.len(), 1);
        let sql = &log[0].statements()[0].sql;
        assert!(sql.starts_with(r#"INSERT INTO "search_suggestion""#));
        assert!(sql.contains(r#"ON CONFLICT ("query") DO UPDATE SET"#));
        assert!(sql.contains(r#""excluded"."last_searched""#));
    }
}
