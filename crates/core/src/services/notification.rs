//! Notification service.
//!
//! [`NotificationService::create_notification`] is the only place that writes
//! notification rows. The template helpers build title, message and link for
//! each event and accept any connection, so callers can fan out inside their
//! own transaction.

use chrono::Utc;
use noxa_common::{AppError, AppResult, IdGenerator};
use noxa_db::{
    entities::{
        Target, discussion, message,
        notification::{self, NotificationType},
        publication, user,
    },
    repositories::NotificationRepository,
};
use sea_orm::{ConnectionTrait, Set};
use serde::Serialize;
use tracing::debug;

/// Maximum number of notifications returned by a listing.
const LIST_LIMIT: u64 = 100;

/// Everything needed to write one notification.
#[derive(Debug, Clone)]
pub struct NewNotification {
    pub recipient_id: String,
    pub actor_id: Option<String>,
    pub notification_type: NotificationType,
    pub target: Target,
    pub title: String,
    pub message: String,
    pub action_url: Option<String>,
}

/// A user's visible notifications plus the unread badge count.
#[derive(Debug, Clone, Serialize)]
pub struct NotificationList {
    pub notifications: Vec<notification::Model>,
    pub unread_count: u64,
}

/// Notification service for business logic.
#[derive(Clone)]
pub struct NotificationService {
    notification_repo: NotificationRepository,
    id_gen: IdGenerator,
}

impl NotificationService {
    /// Create a new notification service.
    #[must_use]
    pub const fn new(notification_repo: NotificationRepository) -> Self {
        Self {
            notification_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Write a notification on `conn`.
    pub async fn create_notification<C: ConnectionTrait>(
        &self,
        conn: &C,
        input: NewNotification,
    ) -> AppResult<notification::Model> {
        let model = notification::ActiveModel {
            id: Set(self.id_gen.generate()),
            recipient_id: Set(input.recipient_id),
            actor_id: Set(input.actor_id),
            notification_type: Set(input.notification_type),
            target_kind: Set(input.target.kind()),
            target_id: Set(input.target.id().to_string()),
            title: Set(input.title),
            message: Set(input.message),
            action_url: Set(input.action_url),
            is_read: Set(false),
            is_deleted: Set(false),
            read_at: Set(None),
            created_at: Set(Utc::now().into()),
        };

        let created = self.notification_repo.create_in(conn, model).await?;
        debug!(
            recipient_id = %created.recipient_id,
            notification_type = ?created.notification_type,
            "Notification created"
        );
        Ok(created)
    }

    /// `recipient` gained `follower`.
    pub async fn new_follower<C: ConnectionTrait>(
        &self,
        conn: &C,
        recipient_id: &str,
        follower: &user::Model,
    ) -> AppResult<notification::Model> {
        self.create_notification(
            conn,
            NewNotification {
                recipient_id: recipient_id.to_string(),
                actor_id: Some(follower.id.clone()),
                notification_type: NotificationType::Follow,
                target: Target::User(follower.id.clone()),
                title: "New Follower".to_string(),
                message: format!("@{} started following you", follower.username),
                action_url: Some(format!("/profile/{}", follower.id)),
            },
        )
        .await
    }

    /// A discussion was opened on a publication `recipient` co-authored.
    pub async fn new_discussion_in_publication<C: ConnectionTrait>(
        &self,
        conn: &C,
        recipient_id: &str,
        creator: &user::Model,
        discussion: &discussion::Model,
        publication: &publication::Model,
    ) -> AppResult<notification::Model> {
        self.create_notification(
            conn,
            NewNotification {
                recipient_id: recipient_id.to_string(),
                actor_id: Some(creator.id.clone()),
                notification_type: NotificationType::DiscussionInPublication,
                target: Target::Discussion(discussion.id.clone()),
                title: "New discussion opened in your publication".to_string(),
                message: format!(
                    "@{} created new discussion: \"{}\" in your publication \"{}\"",
                    creator.username, discussion.title, publication.theme
                ),
                action_url: Some(format!("/discussion/{}", discussion.id)),
            },
        )
        .await
    }

    /// Someone commented on the recipient's publication.
    pub async fn publication_comment<C: ConnectionTrait>(
        &self,
        conn: &C,
        recipient_id: &str,
        commenter: &user::Model,
        publication: &publication::Model,
    ) -> AppResult<notification::Model> {
        self.create_notification(
            conn,
            NewNotification {
                recipient_id: recipient_id.to_string(),
                actor_id: Some(commenter.id.clone()),
                notification_type: NotificationType::PublicationComment,
                target: Target::Publication(publication.id.clone()),
                title: "New Comment on Your Publication".to_string(),
                message: format!("{} commented on '{}'", commenter.username, publication.theme),
                action_url: Some(format!("/publication/{}", publication.id)),
            },
        )
        .await
    }

    /// A message was posted in a discussion the recipient is involved in.
    pub async fn discussion_reply<C: ConnectionTrait>(
        &self,
        conn: &C,
        recipient_id: &str,
        replier: &user::Model,
        discussion: &discussion::Model,
        message: &message::Model,
    ) -> AppResult<notification::Model> {
        self.create_notification(
            conn,
            NewNotification {
                recipient_id: recipient_id.to_string(),
                actor_id: Some(replier.id.clone()),
                notification_type: NotificationType::DiscussionReply,
                target: Target::Message(message.id.clone()),
                title: "New Reply in Discussion".to_string(),
                message: format!(
                    "@{} replied in discussion \"{}\"",
                    replier.username, discussion.title
                ),
                action_url: Some(format!("/discussion/{}", discussion.id)),
            },
        )
        .await
    }

    /// A followed user published something.
    pub async fn new_publication_from_followed<C: ConnectionTrait>(
        &self,
        conn: &C,
        recipient_id: &str,
        publisher: &user::Model,
        publication: &publication::Model,
    ) -> AppResult<notification::Model> {
        self.create_notification(
            conn,
            NewNotification {
                recipient_id: recipient_id.to_string(),
                actor_id: Some(publisher.id.clone()),
                notification_type: NotificationType::PublicationAdded,
                target: Target::Publication(publication.id.clone()),
                title: "New Publication".to_string(),
                message: format!("{} published '{}'", publisher.username, publication.theme),
                action_url: Some(format!("/publication/{}", publication.id)),
            },
        )
        .await
    }

    /// Visible notifications of `user_id`, newest first, with the unread count.
    pub async fn list(&self, user_id: &str) -> AppResult<NotificationList> {
        let notifications = self
            .notification_repo
            .find_by_recipient(user_id, LIST_LIMIT)
            .await?;
        let unread_count = self.notification_repo.count_unread(user_id).await?;

        Ok(NotificationList {
            notifications,
            unread_count,
        })
    }

    /// Number of unread, not deleted notifications.
    pub async fn unread_count(&self, user_id: &str) -> AppResult<u64> {
        self.notification_repo.count_unread(user_id).await
    }

    /// Mark one of the user's notifications as read.
    ///
    /// Already read notifications are returned as is, so `read_at` keeps its
    /// first value.
    pub async fn mark_as_read(&self, user_id: &str, id: &str) -> AppResult<notification::Model> {
        let mut notification = self.get_owned(user_id, id).await?;

        if notification.is_read {
            return Ok(notification);
        }

        if self.notification_repo.mark_as_read(id).await? {
            notification.is_read = true;
            notification.read_at = Some(Utc::now().into());
        }

        Ok(notification)
    }

    /// Mark every notification of the user as read.
    pub async fn mark_all_as_read(&self, user_id: &str) -> AppResult<u64> {
        let updated = self.notification_repo.mark_all_as_read(user_id).await?;
        debug!(user_id, updated, "Marked all notifications as read");
        Ok(updated)
    }

    /// Hide a notification from the user's listing.
    pub async fn soft_delete(&self, user_id: &str, id: &str) -> AppResult<()> {
        self.get_owned(user_id, id).await?;
        self.notification_repo.soft_delete(id).await
    }

    async fn get_owned(&self, user_id: &str, id: &str) -> AppResult<notification::Model> {
        self.notification_repo
            .find_by_id(id)
            .await?
            .filter(|n| n.recipient_id == user_id)
            .ok_or_else(|| AppError::NotFound(format!("Notification {id}")))
    }
}
