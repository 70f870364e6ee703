//! `SeaORM` entity definitions.

pub mod collection;
pub mod collection_publication;
pub mod discussion;
pub mod discussion_participant;
pub mod following;
pub mod message;
pub mod notification;
pub mod publication;
pub mod publication_author;
pub mod publication_tag;
pub mod search_history;
pub mod search_suggestion;
pub mod session;
pub mod tag;
pub mod target;
pub mod topic;
pub mod user;
pub mod user_favorite_topic;

pub use collection::Entity as Collection;
pub use collection_publication::Entity as CollectionPublication;
pub use discussion::Entity as Discussion;
pub use discussion_participant::Entity as DiscussionParticipant;
pub use following::Entity as Following;
pub use message::Entity as Message;
pub use notification::Entity as Notification;
pub use publication::Entity as Publication;
pub use publication_author::Entity as PublicationAuthor;
pub use publication_tag::Entity as PublicationTag;
pub use search_history::Entity as SearchHistory;
pub use search_suggestion::Entity as SearchSuggestion;
pub use session::Entity as Session;
pub use tag::Entity as Tag;
pub use target::{Target, TargetKind};
pub use topic::Entity as Topic;
pub use user::Entity as User;
pub use user_favorite_topic::Entity as UserFavoriteTopic;
