//! Business logic services.

#![allow(missing_docs)]

pub mod collection;
pub mod discussion;
pub mod following;
pub mod notification;
pub mod publication;
pub mod search;
pub mod topic;
pub mod user;

pub use collection::{
    AddToCollection, CollectionEntry, CollectionService, CollectionSummary, CollectionView,
};
pub use discussion::{
    CreateDiscussionInput, DiscussionService, DiscussionThread, PostMessageInput, ThreadMessage,
};
pub use following::{FollowResult, FollowStats, FollowingService};
pub use notification::{NewNotification, NotificationList, NotificationService};
pub use publication::{CreatePublicationInput, PdfFile, PublicationDetail, PublicationService};
pub use search::{HISTORY_LIMIT, SearchHistoryView, SearchResults, SearchService, SearchTab};
pub use topic::{AutocompleteItem, FavoriteToggle, TopicService};
pub use user::{
    LoginOutput, RegisterInput, UpdateProfileInput, UserResponse, UserService, public_users,
};
