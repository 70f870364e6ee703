//! User repository.

use std::sync::Arc;

use crate::entities::{PublicationAuthor, User, publication_author, user};
use crate::repositories::filter::contains_ci;
use noxa_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, DbErr,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, SqlErr,
    sea_query::{Expr, Query},
};

/// User repository for database operations.
#[derive(Clone)]
pub struct UserRepository {
    db: Arc<DatabaseConnection>,
}

/// Map a write error, turning unique violations into conflicts.
fn map_write_err(e: DbErr) -> AppError {
    match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail)) => {
            if detail.contains("email") {
                AppError::Conflict("Email is already in use".to_string())
            } else if detail.contains("username") {
                AppError::Conflict("Username is already taken".to_string())
            } else {
                AppError::Conflict("Account already exists".to_string())
            }
        }
        _ => AppError::Database(e.to_string()),
    }
}

fn profile_filter(query: &str) -> Condition {
    Condition::any()
        .add(contains_ci(user::Column::Username, query))
        .add(contains_ci(user::Column::FirstName, query))
        .add(contains_ci(user::Column::LastName, query))
        .add(contains_ci(user::Column::School, query))
}

impl UserRepository {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a user by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<user::Model>> {
        User::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a user by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<user::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::UserNotFound(id.to_string()))
    }

    /// Find a user by exact username.
    pub async fn find_by_username(&self, username: &str) -> AppResult<Option<user::Model>> {
        User::find()
            .filter(user::Column::Username.eq(username))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find users by exact usernames. Unknown names are simply absent.
    pub async fn find_by_usernames_in<C: ConnectionTrait>(
        &self,
        conn: &C,
        usernames: &[String],
    ) -> AppResult<Vec<user::Model>> {
        if usernames.is_empty() {
            return Ok(vec![]);
        }

        User::find()
            .filter(user::Column::Username.is_in(usernames.to_vec()))
            .all(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a user by email.
    pub async fn find_by_email(&self, email: &str) -> AppResult<Option<user::Model>> {
        User::find()
            .filter(user::Column::Email.eq(email))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Check whether a slug is taken.
    pub async fn slug_exists(&self, slug: &str) -> AppResult<bool> {
        let count = User::find()
            .filter(user::Column::Slug.eq(slug))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(count > 0)
    }

    /// Create a new user.
    pub async fn create(&self, model: user::ActiveModel) -> AppResult<user::Model> {
        model.insert(self.db.as_ref()).await.map_err(map_write_err)
    }

    /// Update a user.
    pub async fn update(&self, model: user::ActiveModel) -> AppResult<user::Model> {
        model.update(self.db.as_ref()).await.map_err(map_write_err)
    }

    /// Increment the uploaded documents counter (single UPDATE query, no fetch).
    pub async fn increment_documents_in<C: ConnectionTrait>(
        &self,
        conn: &C,
        user_id: &str,
    ) -> AppResult<()> {
        User::update_many()
            .col_expr(
                user::Column::NbDocuments,
                Expr::col(user::Column::NbDocuments).add(1),
            )
            .filter(user::Column::Id.eq(user_id))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Search all profiles by username, names, school or bio.
    pub async fn search_profiles(&self, query: &str, limit: u64) -> AppResult<Vec<user::Model>> {
        User::find()
            .filter(profile_filter(query).add(contains_ci(user::Column::Bio, query)))
            .order_by_asc(user::Column::Username)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Search users who authored at least one publication.
    pub async fn search_authors(&self, query: &str, limit: u64) -> AppResult<Vec<user::Model>> {
        User::find()
            .filter(profile_filter(query))
            .filter(
                user::Column::Id.in_subquery(
                    Query::select()
                        .column(publication_author::Column::UserId)
                        .from(PublicationAuthor)
                        .to_owned(),
                ),
            )
            .order_by_desc(user::Column::NbDocuments)
            .order_by_asc(user::Column::Username)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Autocomplete usernames (case-insensitive substring).
    pub async fn search_usernames(&self, query: &str, limit: u64) -> AppResult<Vec<user::Model>> {
        User::find()
            .filter(contains_ci(user::Column::Username, query))
            .order_by_asc(user::Column::Username)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
