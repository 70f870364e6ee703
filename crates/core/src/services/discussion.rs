//! Discussion service: threads attached to publications.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use noxa_common::{AppError, AppResult, IdGenerator};
use noxa_db::{
    entities::{discussion, discussion_participant, message, publication, user},
    repositories::{DiscussionRepository, PublicationRepository, UserRepository},
};
use sea_orm::{ConnectionTrait, DatabaseConnection, Set};
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

use super::notification::NotificationService;
use super::user::{UserResponse, public_users};

/// Input for opening a discussion.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateDiscussionInput {
    #[validate(length(max = 255))]
    pub title: String,

    #[validate(length(max = 10000))]
    pub description: String,
}

/// Input for posting a message.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PostMessageInput {
    #[validate(length(max = 10000))]
    pub body: String,

    /// Message being replied to.
    #[serde(default)]
    pub reply_to: Option<String>,
}

/// A message with its author and, for top-level messages, its replies.
#[derive(Debug, Clone, Serialize)]
pub struct ThreadMessage {
    pub message: message::Model,
    pub author: Option<UserResponse>,
    pub replies: Vec<ThreadMessage>,
}

/// Discussion page contents.
#[derive(Debug, Clone, Serialize)]
pub struct DiscussionThread {
    pub discussion: discussion::Model,
    pub publication: publication::Model,
    pub creator: Option<UserResponse>,
    pub participants: Vec<UserResponse>,
    pub messages: Vec<ThreadMessage>,
}

/// Discussion service for business logic.
#[derive(Clone)]
pub struct DiscussionService {
    db: Arc<DatabaseConnection>,
    discussion_repo: DiscussionRepository,
    publication_repo: PublicationRepository,
    user_repo: UserRepository,
    notification_service: NotificationService,
    id_gen: IdGenerator,
}

impl DiscussionService {
    /// Create a new discussion service.
    #[must_use]
    pub const fn new(
        db: Arc<DatabaseConnection>,
        discussion_repo: DiscussionRepository,
        publication_repo: PublicationRepository,
        user_repo: UserRepository,
        notification_service: NotificationService,
    ) -> Self {
        Self {
            db,
            discussion_repo,
            publication_repo,
            user_repo,
            notification_service,
            id_gen: IdGenerator::new(),
        }
    }

    /// Open a discussion on a publication and notify its other authors.
    pub async fn create_discussion(
        &self,
        creator: &user::Model,
        publication_id: &str,
        input: CreateDiscussionInput,
    ) -> AppResult<discussion::Model> {
        input.validate()?;
        let title = input.title.trim();
        let description = input.description.trim();
        if title.is_empty() || description.is_empty() {
            return Err(AppError::Validation(
                "Title and description are required".to_string(),
            ));
        }

        let publication = self.publication_repo.get_by_id(publication_id).await?;
        let authors = self.publication_repo.find_authors(&publication.id).await?;

        let txn = noxa_db::begin(&self.db).await?;
        let now = Utc::now();

        let discussion = self
            .discussion_repo
            .create_in(
                &txn,
                discussion::ActiveModel {
                    id: Set(self.id_gen.generate()),
                    publication_id: Set(publication.id.clone()),
                    creator_id: Set(creator.id.clone()),
                    title: Set(title.to_string()),
                    description: Set(description.to_string()),
                    created_at: Set(now.into()),
                    updated_at: Set(now.into()),
                },
            )
            .await?;

        self.add_participant(&txn, &discussion.id, &creator.id).await?;

        for author in authors.iter().filter(|a| a.id != creator.id) {
            self.notification_service
                .new_discussion_in_publication(&txn, &author.id, creator, &discussion, &publication)
                .await?;
        }

        noxa_db::commit(txn).await?;

        info!(
            user_id = %creator.id,
            publication_id = %publication.id,
            discussion_id = %discussion.id,
            "Discussion created"
        );
        Ok(discussion)
    }

    /// Load a discussion with its thread.
    pub async fn view(&self, discussion_id: &str) -> AppResult<DiscussionThread> {
        let discussion = self.discussion_repo.get_by_id(discussion_id).await?;
        let publication = self
            .publication_repo
            .get_by_id(&discussion.publication_id)
            .await?;
        let creator = self.user_repo.find_by_id(&discussion.creator_id).await?;
        let participants = self.discussion_repo.find_participants(&discussion.id).await?;
        let messages = build_thread(self.discussion_repo.find_messages(&discussion.id).await?);

        Ok(DiscussionThread {
            discussion,
            publication,
            creator: creator.map(UserResponse::from),
            participants: public_users(participants),
            messages,
        })
    }

    /// Post a message and notify everyone involved.
    ///
    /// `reply_to` only counts when it names a message of the same discussion;
    /// otherwise the message is top-level.
    pub async fn post_message(
        &self,
        poster: &user::Model,
        discussion_id: &str,
        input: PostMessageInput,
    ) -> AppResult<message::Model> {
        input.validate()?;
        let body = input.body.trim();
        if body.is_empty() {
            return Err(AppError::Validation("Message body is required".to_string()));
        }

        let discussion = self.discussion_repo.get_by_id(discussion_id).await?;
        let publication = self
            .publication_repo
            .get_by_id(&discussion.publication_id)
            .await?;

        let txn = noxa_db::begin(&self.db).await?;

        let reply_target = match input.reply_to.as_deref().filter(|id| !id.is_empty()) {
            Some(id) => self
                .discussion_repo
                .find_message_in(&txn, id)
                .await?
                .filter(|m| m.discussion_id == discussion.id),
            None => None,
        };

        let message = self
            .discussion_repo
            .create_message_in(
                &txn,
                message::ActiveModel {
                    id: Set(self.id_gen.generate()),
                    discussion_id: Set(discussion.id.clone()),
                    user_id: Set(poster.id.clone()),
                    reply_to_id: Set(reply_target.as_ref().map(|m| m.id.clone())),
                    body: Set(body.to_string()),
                    created_at: Set(Utc::now().into()),
                    updated_at: Set(None),
                },
            )
            .await?;

        let participants = self
            .discussion_repo
            .participant_ids_in(&txn, &discussion.id)
            .await?;
        if !participants.contains(&poster.id) {
            self.add_participant(&txn, &discussion.id, &poster.id).await?;
        }

        let recipients = reply_recipients(
            &poster.id,
            reply_target.as_ref().map(|m| m.user_id.as_str()),
            &participants,
            &discussion.creator_id,
        );
        for recipient_id in &recipients {
            self.notification_service
                .discussion_reply(&txn, recipient_id, poster, &discussion, &message)
                .await?;
        }

        if reply_target.is_none() {
            if let Some(owner_id) = publication.owner_id.as_deref() {
                if owner_id != poster.id && !recipients.contains(owner_id) {
                    self.notification_service
                        .publication_comment(&txn, owner_id, poster, &publication)
                        .await?;
                }
            }
        }

        noxa_db::commit(txn).await?;

        info!(
            user_id = %poster.id,
            discussion_id = %discussion.id,
            message_id = %message.id,
            notified = recipients.len(),
            "Message posted"
        );
        Ok(message)
    }

    async fn add_participant<C: ConnectionTrait>(
        &self,
        conn: &C,
        discussion_id: &str,
        user_id: &str,
    ) -> AppResult<()> {
        self.discussion_repo
            .add_participant_in(
                conn,
                discussion_participant::ActiveModel {
                    id: Set(self.id_gen.generate()),
                    discussion_id: Set(discussion_id.to_string()),
                    user_id: Set(user_id.to_string()),
                    joined_at: Set(Utc::now().into()),
                },
            )
            .await?;
        Ok(())
    }
}

/// Who gets a reply notification for a new message: the author of the
/// message replied to, every participant and the discussion creator, minus
/// the poster. Each user appears once.
fn reply_recipients(
    poster_id: &str,
    reply_target_author: Option<&str>,
    participant_ids: &[String],
    creator_id: &str,
) -> BTreeSet<String> {
    reply_target_author
        .into_iter()
        .chain(participant_ids.iter().map(String::as_str))
        .chain(std::iter::once(creator_id))
        .filter(|id| *id != poster_id)
        .map(ToString::to_string)
        .collect()
}

/// Group messages into top-level entries with their replies, oldest first.
///
/// A reply to a reply is listed under the top-level message its chain starts
/// from. Every input message appears exactly once in the output.
fn build_thread(rows: Vec<(message::Model, Option<user::Model>)>) -> Vec<ThreadMessage> {
    let parents: HashMap<String, Option<String>> = rows
        .iter()
        .map(|(m, _)| (m.id.clone(), m.reply_to_id.clone()))
        .collect();

    let mut roots: HashMap<String, String> = HashMap::new();
    let mut thread: Vec<ThreadMessage> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut replies: Vec<(String, ThreadMessage)> = Vec::new();

    for (message, author) in rows {
        let root = resolve_root(&message.id, &parents, &mut roots);
        let entry = ThreadMessage {
            message,
            author: author.map(UserResponse::from),
            replies: vec![],
        };
        if root == entry.message.id {
            index.insert(root, thread.len());
            thread.push(entry);
        } else {
            replies.push((root, entry));
        }
    }

    for (root, reply) in replies {
        match index.get(&root) {
            Some(&i) => thread[i].replies.push(reply),
            None => thread.push(reply),
        }
    }

    thread
}

/// Follow `reply_to` links up to the first message whose parent is not in
/// the thread, caching the answer for every message on the way.
///
/// A cycle makes its last visited message the root.
fn resolve_root(
    id: &str,
    parents: &HashMap<String, Option<String>>,
    roots: &mut HashMap<String, String>,
) -> String {
    let mut path: Vec<String> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut current = id.to_string();

    let root = loop {
        if let Some(root) = roots.get(&current) {
            break root.clone();
        }
        if !seen.insert(current.clone()) {
            break path.last().cloned().unwrap_or(current);
        }
        match parents.get(&current) {
            Some(Some(parent)) if parents.contains_key(parent) => {
                let parent = parent.clone();
                path.push(std::mem::replace(&mut current, parent));
            }
            _ => {
                path.push(current.clone());
                break current;
            }
        }
    };

    for node in path {
        roots.insert(node, root.clone());
    }
    root
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_support::{
        create_test_discussion, create_test_message, create_test_notification,
        create_test_publication, create_test_user,
    };
    use maplit::btreeset;
    use noxa_db::repositories::NotificationRepository;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn service_with(db: MockDatabase) -> DiscussionService {
        let db = Arc::new(db.into_connection());
        DiscussionService::new(
            db.clone(),
            DiscussionRepository::new(db.clone()),
            PublicationRepository::new(db.clone()),
            UserRepository::new(db.clone()),
            NotificationService::new(NotificationRepository::new(db)),
        )
    }

    #[test]
    fn test_reply_recipients_deduplicated_without_poster() {
        let participants = vec!["alice".to_string(), "bob".to_string(), "carol".to_string()];
        let recipients = reply_recipients("bob", Some("alice"), &participants, "alice");
        assert_eq!(recipients, btreeset! {"alice".to_string(), "carol".to_string()});
    }

    #[test]
    fn test_reply_recipients_creator_not_participant() {
        let recipients = reply_recipients("bob", None, &[], "dave");
        assert_eq!(recipients, btreeset! {"dave".to_string()});
    }

    #[test]
    fn test_reply_recipients_poster_alone() {
        let participants = vec!["bob".to_string()];
        assert!(reply_recipients("bob", Some("bob"), &participants, "bob").is_empty());
    }

    #[test]
    fn test_build_thread_groups_replies() {
        let rows = vec![
            (create_test_message("m1", "d1", "u1", None), None),
            (create_test_message("m2", "d1", "u2", Some("m1")), None),
            (create_test_message("m3", "d1", "u1", None), None),
            (create_test_message("m4", "d1", "u3", Some("m2")), None),
        ];

        let thread = build_thread(rows);
        assert_eq!(thread.len(), 2);
        assert_eq!(thread[0].message.id, "m1");
        let reply_ids: Vec<_> = thread[0].replies.iter().map(|r| r.message.id.as_str()).collect();
        assert_eq!(reply_ids, vec!["m2", "m4"]);
        assert!(thread[1].replies.is_empty());
    }

    #[test]
    fn test_reply_recipients_everyone_involved_except_poster() {
        // Poster u2 answers u3 in a discussion opened by u1 where u4 and u5
        // also took part.
        let participants = vec![
            "u1".to_string(),
            "u2".to_string(),
            "u4".to_string(),
            "u5".to_string(),
        ];
        let recipients = reply_recipients("u2", Some("u3"), &participants, "u1");
        assert_eq!(
            recipients,
            btreeset! {
                "u1".to_string(),
                "u3".to_string(),
                "u4".to_string(),
                "u5".to_string(),
            }
        );
    }

    #[test]
    fn test_build_thread_keeps_long_reply_chain() {
        let mut rows = vec![(create_test_message("m0", "d1", "u1", None), None)];
        for i in 1..=70 {
            let parent = format!("m{}", i - 1);
            rows.push((
                create_test_message(&format!("m{i}"), "d1", "u2", Some(&parent)),
                None,
            ));
        }

        let thread = build_thread(rows);
        assert_eq!(thread.len(), 1);
        assert_eq!(thread[0].message.id, "m0");
        assert_eq!(thread[0].replies.len(), 70);
        assert_eq!(thread[0].replies[69].message.id, "m70");
    }

    #[test]
    fn test_build_thread_reply_cycle_keeps_messages() {
        let rows = vec![
            (create_test_message("m1", "d1", "u1", Some("m2")), None),
            (create_test_message("m2", "d1", "u2", Some("m1")), None),
            (create_test_message("m3", "d1", "u1", None), None),
        ];

        let thread = build_thread(rows);
        let shown: usize = thread.iter().map(|t| 1 + t.replies.len()).sum();
        assert_eq!(shown, 3);
    }

    #[test]
    fn test_build_thread_reply_to_missing_message_is_top_level() {
        let rows = vec![(create_test_message("m2", "d1", "u2", Some("gone")), None)];

        let thread = build_thread(rows);
        assert_eq!(thread.len(), 1);
        assert_eq!(thread[0].message.id, "m2");
    }

    #[tokio::test]
    async fn test_create_discussion_blank_title_rejected() {
        let service = service_with(MockDatabase::new(DatabaseBackend::Postgres));
        let creator = create_test_user("u1", "alice");

        let result = service
            .create_discussion(
                &creator,
                "p1",
                CreateDiscussionInput {
                    title: "   ".to_string(),
                    description: "Why?".to_string(),
                },
            )
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_post_message_blank_body_rejected() {
        let service = service_with(MockDatabase::new(DatabaseBackend::Postgres));
        let poster = create_test_user("u1", "alice");

        let result = service
            .post_message(
                &poster,
                "d1",
                PostMessageInput {
                    body: "\n\t ".to_string(),
                    reply_to: None,
                },
            )
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_post_message_creator_replying_to_own_thread_notifies_nobody() {
        // The poster created the discussion, owns the publication and is the
        // only participant, so no notification insert is queued.
        let service = service_with(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_discussion("d1", "p1", "u1")]])
                .append_query_results([[create_test_publication("p1", "u1")]])
                .append_query_results([[create_test_message("m1", "d1", "u1", None)]])
                .append_query_results([[discussion_participant::Model {
                    id: "dp1".to_string(),
                    discussion_id: "d1".to_string(),
                    user_id: "u1".to_string(),
                    joined_at: Utc::now().into(),
                }]]),
        );
        let poster = create_test_user("u1", "alice");

        let message = service
            .post_message(
                &poster,
                "d1",
                PostMessageInput {
                    body: "Any thoughts?".to_string(),
                    reply_to: None,
                },
            )
            .await
            .unwrap();
        assert!(!message.is_reply());
    }

    #[tokio::test]
    async fn test_post_message_reply_notifies_each_involved_user_once() {
        let participant = |id: &str, user_id: &str| discussion_participant::Model {
            id: id.to_string(),
            discussion_id: "d1".to_string(),
            user_id: user_id.to_string(),
            joined_at: Utc::now().into(),
        };
        let mock = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[create_test_discussion("d1", "p1", "u1")]])
            .append_query_results([[create_test_publication("p1", "u1")]])
            .append_query_results([[create_test_message("m1", "d1", "u3", None)]])
            .append_query_results([[create_test_message("m2", "d1", "u2", Some("m1"))]])
            .append_query_results([[
                participant("dp1", "u1"),
                participant("dp3", "u3"),
                participant("dp4", "u4"),
                participant("dp5", "u5"),
            ]])
            .append_query_results([[participant("dp2", "u2")]])
            .append_query_results([[create_test_notification("n1", "u1")]])
            .append_query_results([[create_test_notification("n3", "u3")]])
            .append_query_results([[create_test_notification("n4", "u4")]])
            .append_query_results([[create_test_notification("n5", "u5")]]);
        let db = Arc::new(mock.into_connection());
        let service = DiscussionService::new(
            db.clone(),
            DiscussionRepository::new(db.clone()),
            PublicationRepository::new(db.clone()),
            UserRepository::new(db.clone()),
            NotificationService::new(NotificationRepository::new(db.clone())),
        );
        let poster = create_test_user("u2", "bob");

        let message = service
            .post_message(
                &poster,
                "d1",
                PostMessageInput {
                    body: "Agreed, see section 3.".to_string(),
                    reply_to: Some("m1".to_string()),
                },
            )
            .await
            .unwrap();
        assert_eq!(message.reply_to_id.as_deref(), Some("m1"));

        drop(service);
        let log = Arc::try_unwrap(db).unwrap().into_transaction_log();
        let notification_inserts = log
            .iter()
            .flat_map(|txn| txn.statements())
            .filter(|stmt| stmt.sql.starts_with(r#"INSERT INTO "notification""#))
            .count();
        assert_eq!(notification_inserts, 4);
    }
}
