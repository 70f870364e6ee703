//! Model fixtures shared by service tests.

use chrono::Utc;
use noxa_db::entities::{
    TargetKind, collection, discussion, message,
    notification::{self, NotificationType},
    publication, topic, user,
};

pub fn create_test_user(id: &str, username: &str) -> user::Model {
    user::Model {
        id: id.to_string(),
        username: username.to_string(),
        email: format!("{username}@example.com"),
        password_hash: String::new(),
        first_name: None,
        last_name: None,
        school: "ENSAE Dakar".to_string(),
        bio: None,
        linkedin: None,
        github: None,
        photo: "profils/default_profile.jpeg".to_string(),
        slug: username.to_lowercase(),
        nb_documents: 0,
        created_at: Utc::now().into(),
        updated_at: None,
    }
}

pub fn create_test_topic(id: &str, name: &str) -> topic::Model {
    topic::Model {
        id: id.to_string(),
        name: name.to_string(),
    }
}

pub fn create_test_publication(id: &str, owner_id: &str) -> publication::Model {
    let now = Utc::now().into();
    publication::Model {
        id: id.to_string(),
        owner_id: Some(owner_id.to_string()),
        topic_id: Some("t1".to_string()),
        theme: "Graph Sampling".to_string(),
        affiliations: "ENSAE, UCAD".to_string(),
        description: "Sampling large graphs".to_string(),
        summary: "We study sampling.".to_string(),
        file_key: format!("pdf/{id}-paper.pdf"),
        file_name: "paper.pdf".to_string(),
        created_at: now,
        updated_at: now,
    }
}

pub fn create_test_collection(id: &str, user_id: &str, name: &str) -> collection::Model {
    collection::Model {
        id: id.to_string(),
        user_id: user_id.to_string(),
        name: name.to_string(),
        created_at: Utc::now().into(),
        updated_at: None,
    }
}

pub fn create_test_discussion(id: &str, publication_id: &str, creator_id: &str) -> discussion::Model {
    let now = Utc::now().into();
    discussion::Model {
        id: id.to_string(),
        publication_id: publication_id.to_string(),
        creator_id: creator_id.to_string(),
        title: "Sampling bias".to_string(),
        description: "Is the estimator unbiased?".to_string(),
        created_at: now,
        updated_at: now,
    }
}

pub fn create_test_message(
    id: &str,
    discussion_id: &str,
    user_id: &str,
    reply_to_id: Option<&str>,
) -> message::Model {
    message::Model {
        id: id.to_string(),
        discussion_id: discussion_id.to_string(),
        user_id: user_id.to_string(),
        reply_to_id: reply_to_id.map(ToString::to_string),
        body: "Good point".to_string(),
        created_at: Utc::now().into(),
        updated_at: None,
    }
}

pub fn create_test_notification(id: &str, recipient_id: &str) -> notification::Model {
    notification::Model {
        id: id.to_string(),
        recipient_id: recipient_id.to_string(),
        actor_id: Some("u2".to_string()),
        notification_type: NotificationType::DiscussionReply,
        target_kind: TargetKind::Message,
        target_id: "m2".to_string(),
        title: "New Reply in Discussion".to_string(),
        message: "@bob replied in discussion \"Sampling bias\"".to_string(),
        action_url: Some("/discussion/d1".to_string()),
        is_read: false,
        is_deleted: false,
        read_at: None,
        created_at: Utc::now().into(),
    }
}
