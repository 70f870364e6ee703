//! Repositories wrapping `SeaORM` queries per aggregate.
//!
//! Methods ending in `_in` take an explicit connection so services can run
//! them inside one transaction.

pub mod collection;
pub mod discussion;
pub mod filter;
pub mod following;
pub mod notification;
pub mod publication;
pub mod search;
pub mod session;
pub mod topic;
pub mod user;

pub use collection::CollectionRepository;
pub use discussion::DiscussionRepository;
pub use following::FollowingRepository;
pub use notification::NotificationRepository;
pub use publication::PublicationRepository;
pub use search::{SearchHistoryRepository, SearchSuggestionRepository};
pub use session::SessionRepository;
pub use topic::{TagRepository, TopicRepository};
pub use user::UserRepository;
