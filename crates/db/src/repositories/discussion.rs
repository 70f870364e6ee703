//! Discussion repository (discussions, participants and messages).

use std::sync::Arc;

use crate::entities::{
    Discussion, DiscussionParticipant, Message, User, discussion, discussion_participant, message,
    user,
};
use crate::repositories::filter::contains_ci;
use noxa_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, sea_query::Query,
};

/// Discussion repository for database operations.
#[derive(Clone)]
pub struct DiscussionRepository {
    db: Arc<DatabaseConnection>,
}

impl DiscussionRepository {
    /// Create a new discussion repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a discussion by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<discussion::Model>> {
        Discussion::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a discussion by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<discussion::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Discussion {id}")))
    }

    /// Discussions opened on a publication, newest first.
    pub async fn find_by_publication(
        &self,
        publication_id: &str,
    ) -> AppResult<Vec<discussion::Model>> {
        Discussion::find()
            .filter(discussion::Column::PublicationId.eq(publication_id))
            .order_by_desc(discussion::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert a discussion.
    pub async fn create_in<C: ConnectionTrait>(
        &self,
        conn: &C,
        model: discussion::ActiveModel,
    ) -> AppResult<discussion::Model> {
        model
            .insert(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Search discussions by title or description.
    pub async fn search(&self, q: &str, limit: u64) -> AppResult<Vec<discussion::Model>> {
        Discussion::find()
            .filter(
                Condition::any()
                    .add(contains_ci(discussion::Column::Title, q))
                    .add(contains_ci(discussion::Column::Description, q)),
            )
            .order_by_desc(discussion::Column::UpdatedAt)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // === Participants ===

    /// IDs of a discussion's participants, in join order.
    pub async fn participant_ids_in<C: ConnectionTrait>(
        &self,
        conn: &C,
        discussion_id: &str,
    ) -> AppResult<Vec<String>> {
        let rows = DiscussionParticipant::find()
            .filter(discussion_participant::Column::DiscussionId.eq(discussion_id))
            .order_by_asc(discussion_participant::Column::JoinedAt)
            .all(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(rows.into_iter().map(|p| p.user_id).collect())
    }

    /// Add a participant row.
    pub async fn add_participant_in<C: ConnectionTrait>(
        &self,
        conn: &C,
        model: discussion_participant::ActiveModel,
    ) -> AppResult<discussion_participant::Model> {
        model
            .insert(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Participants of a discussion as users.
    pub async fn find_participants(&self, discussion_id: &str) -> AppResult<Vec<user::Model>> {
        User::find()
            .filter(
                user::Column::Id.in_subquery(
                    Query::select()
                        .column(discussion_participant::Column::UserId)
                        .from(DiscussionParticipant)
                        .and_where(discussion_participant::Column::DiscussionId.eq(discussion_id))
                        .to_owned(),
                ),
            )
            .order_by_asc(user::Column::Username)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // === Messages ===

    /// Find a message by ID.
    pub async fn find_message_in<C: ConnectionTrait>(
        &self,
        conn: &C,
        id: &str,
    ) -> AppResult<Option<message::Model>> {
        Message::find_by_id(id)
            .one(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert a message.
    pub async fn create_message_in<C: ConnectionTrait>(
        &self,
        conn: &C,
        model: message::ActiveModel,
    ) -> AppResult<message::Model> {
        model
            .insert(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// All messages of a discussion with their authors, oldest first.
    pub async fn find_messages(
        &self,
        discussion_id: &str,
    ) -> AppResult<Vec<(message::Model, Option<user::Model>)>> {
        Message::find()
            .filter(message::Column::DiscussionId.eq(discussion_id))
            .find_also_related(user::Entity)
            .order_by_asc(message::Column::CreatedAt)
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
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn create_test_participant(id: &str, user_id: &str) -> discussion_participant::Model {
        discussion_participant::Model {
            id: id.to_string(),
            discussion_id: "d1".to_string(),
            user_id: user_id.to_string(),
            joined_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_participant_ids() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[
                    create_test_participant("dp1", "alice"),
                    create_test_participant("dp2", "bob"),
                ]])
                .into_connection(),
        );

        let repo = DiscussionRepository::new(db.clone());
        let ids = repo.participant_ids_in(db.as_ref(), "d1").await.unwrap();
        assert_eq!(ids, vec!["alice", "bob"]);
    }

    #[tokio::test]
    async fn test_get_by_id_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<discussion::Model>::new()])
                .into_connection(),
        );

        let repo = DiscussionRepository::new(db);
        assert!(matches!(
            repo.get_by_id("missing").await,
            Err(AppError::NotFound(_))
        ));
    }
}
