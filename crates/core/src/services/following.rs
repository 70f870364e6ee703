//! Following service.

use std::sync::Arc;

use chrono::Utc;
use noxa_common::{AppError, AppResult, IdGenerator};
use noxa_db::{
    entities::{following, user},
    repositories::{FollowingRepository, UserRepository},
};
use sea_orm::{DatabaseConnection, Set};
use serde::Serialize;
use tracing::info;

use super::notification::NotificationService;
use super::user::{UserResponse, public_users};

/// Number of followers/following shown on a profile.
const PREVIEW_SIZE: u64 = 3;

/// Result of a follow operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FollowResult {
    /// A new edge was created and the followee notified.
    Followed,
    /// The edge already existed; nothing was written.
    AlreadyFollowing,
}

/// Follow graph figures shown on a profile.
#[derive(Debug, Clone, Serialize)]
pub struct FollowStats {
    pub followers_count: u64,
    pub following_count: u64,
    pub followers_preview: Vec<UserResponse>,
    pub following_preview: Vec<UserResponse>,
    /// Whether the viewer follows this user.
    pub is_following: bool,
}

/// Following service for business logic.
#[derive(Clone)]
pub struct FollowingService {
    db: Arc<DatabaseConnection>,
    following_repo: FollowingRepository,
    user_repo: UserRepository,
    notification_service: NotificationService,
    id_gen: IdGenerator,
}

impl FollowingService {
    /// Create a new following service.
    #[must_use]
    pub const fn new(
        db: Arc<DatabaseConnection>,
        following_repo: FollowingRepository,
        user_repo: UserRepository,
        notification_service: NotificationService,
    ) -> Self {
        Self {
            db,
            following_repo,
            user_repo,
            notification_service,
            id_gen: IdGenerator::new(),
        }
    }

    /// Follow a user and notify them.
    pub async fn follow(&self, follower: &user::Model, followee_id: &str) -> AppResult<FollowResult> {
        if follower.id == followee_id {
            return Err(AppError::BadRequest("Cannot follow yourself".to_string()));
        }

        let followee = self.user_repo.get_by_id(followee_id).await?;

        if self
            .following_repo
            .is_following(&follower.id, &followee.id)
            .await?
        {
            return Ok(FollowResult::AlreadyFollowing);
        }

        let txn = noxa_db::begin(&self.db).await?;

        self.following_repo
            .create_in(
                &txn,
                following::ActiveModel {
                    id: Set(self.id_gen.generate()),
                    follower_id: Set(follower.id.clone()),
                    followee_id: Set(followee.id.clone()),
                    created_at: Set(Utc::now().into()),
                },
            )
            .await?;

        self.notification_service
            .new_follower(&txn, &followee.id, follower)
            .await?;

        noxa_db::commit(txn).await?;

        info!(follower_id = %follower.id, followee_id = %followee.id, "User followed");
        Ok(FollowResult::Followed)
    }

    /// Stop following a user. Returns whether an edge was removed.
    pub async fn unfollow(&self, follower_id: &str, followee_id: &str) -> AppResult<bool> {
        let followee = self.user_repo.get_by_id(followee_id).await?;
        let removed = self
            .following_repo
            .delete_by_pair(follower_id, &followee.id)
            .await?;

        if removed {
            info!(follower_id, followee_id, "User unfollowed");
        }
        Ok(removed)
    }

    /// Counts, previews and the viewer's follow state for a profile.
    pub async fn stats(&self, user_id: &str, viewer_id: Option<&str>) -> AppResult<FollowStats> {
        let followers_count = self.following_repo.count_followers(user_id).await?;
        let following_count = self.following_repo.count_following(user_id).await?;
        let followers_preview = self
            .following_repo
            .first_followers(user_id, PREVIEW_SIZE)
            .await?;
        let following_preview = self
            .following_repo
            .first_following(user_id, PREVIEW_SIZE)
            .await?;

        let is_following = match viewer_id {
            Some(viewer_id) if viewer_id != user_id => {
                self.following_repo.is_following(viewer_id, user_id).await?
            }
            _ => false,
        };

        Ok(FollowStats {
            followers_count,
            following_count,
            followers_preview: public_users(followers_preview),
            following_preview: public_users(following_preview),
            is_following,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_support::create_test_user;
    use noxa_db::entities::{
        TargetKind,
        notification::{self, NotificationType},
    };
    use noxa_db::repositories::NotificationRepository;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn create_test_following(id: &str, follower_id: &str, followee_id: &str) -> following::Model {
        following::Model {
            id: id.to_string(),
            follower_id: follower_id.to_string(),
            followee_id: followee_id.to_string(),
            created_at: Utc::now().into(),
        }
    }

    fn follow_notification(recipient_id: &str, actor_id: &str) -> notification::Model {
        notification::Model {
            id: "n1".to_string(),
            recipient_id: recipient_id.to_string(),
            actor_id: Some(actor_id.to_string()),
            notification_type: NotificationType::Follow,
            target_kind: TargetKind::User,
            target_id: actor_id.to_string(),
            title: "New Follower".to_string(),
            message: format!("@{actor_id} started following you"),
            action_url: Some(format!("/profile/{actor_id}")),
            is_read: false,
            is_deleted: false,
            read_at: None,
            created_at: Utc::now().into(),
        }
    }

    fn service_with(db: MockDatabase) -> FollowingService {
        let db = Arc::new(db.into_connection());
        FollowingService::new(
            db.clone(),
            FollowingRepository::new(db.clone()),
            UserRepository::new(db.clone()),
            NotificationService::new(NotificationRepository::new(db)),
        )
    }

    #[tokio::test]
    async fn test_follow_yourself_returns_error() {
        let service = service_with(MockDatabase::new(DatabaseBackend::Postgres));
        let alice = create_test_user("u1", "alice");

        match service.follow(&alice, "u1").await {
            Err(AppError::BadRequest(msg)) => assert!(msg.contains("Cannot follow yourself")),
            other => panic!("Expected BadRequest error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_follow_unknown_user() {
        let service = service_with(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<user::Model>::new()]),
        );
        let alice = create_test_user("u1", "alice");

        let result = service.follow(&alice, "ghost").await;
        assert!(matches!(result, Err(AppError::UserNotFound(_))));
    }

    #[tokio::test]
    async fn test_follow_creates_edge_and_notification() {
        let service = service_with(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_user("u2", "bob")]])
                .append_query_results([Vec::<following::Model>::new()])
                .append_query_results([[create_test_following("f1", "u1", "u2")]])
                .append_query_results([[follow_notification("u2", "u1")]]),
        );
        let alice = create_test_user("u1", "alice");

        let result = service.follow(&alice, "u2").await.unwrap();
        assert_eq!(result, FollowResult::Followed);
    }

    #[tokio::test]
    async fn test_follow_twice_is_informational() {
        // Only the lookups are queued: a second insert would fail.
        let service = service_with(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_user("u2", "bob")]])
                .append_query_results([[create_test_following("f1", "u1", "u2")]]),
        );
        let alice = create_test_user("u1", "alice");

        let result = service.follow(&alice, "u2").await.unwrap();
        assert_eq!(result, FollowResult::AlreadyFollowing);
    }
}
