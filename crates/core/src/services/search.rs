//! Search service: multi-category search, per-user history and global
//! suggestions.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::Utc;
use noxa_common::{AppError, AppResult, IdGenerator};
use noxa_db::{
    entities::{Target, collection, discussion, publication, search_history, search_suggestion, tag},
    repositories::{
        CollectionRepository, DiscussionRepository, PublicationRepository,
        SearchHistoryRepository, SearchSuggestionRepository, TagRepository, UserRepository,
    },
};
use sea_orm::{ConnectionTrait, DatabaseConnection, Set};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::user::{UserResponse, public_users};

/// Rows kept in a user's search history.
pub const HISTORY_LIMIT: u64 = 20;

/// Results per category on the `all` tab.
const ALL_TAB_LIMIT: u64 = 3;

/// Results on a single-category tab.
const SINGLE_TAB_LIMIT: u64 = 30;

/// Rows shown per history list.
const HISTORY_VIEW_LIMIT: u64 = 10;

/// Search tab, also stored as the history row's search type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchTab {
    All,
    Publications,
    Authors,
    Collections,
    Discussions,
    Profiles,
    Tags,
}

impl SearchTab {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Publications => "publications",
            Self::Authors => "authors",
            Self::Collections => "collections",
            Self::Discussions => "discussions",
            Self::Profiles => "profiles",
            Self::Tags => "tags",
        }
    }

    const fn limit(self) -> u64 {
        match self {
            Self::All => ALL_TAB_LIMIT,
            _ => SINGLE_TAB_LIMIT,
        }
    }

    fn includes(self, category: Self) -> bool {
        self == Self::All || self == category
    }
}

impl fmt::Display for SearchTab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchTab {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(Self::All),
            "publications" => Ok(Self::Publications),
            "authors" => Ok(Self::Authors),
            "collections" => Ok(Self::Collections),
            "discussions" => Ok(Self::Discussions),
            "profiles" => Ok(Self::Profiles),
            "tags" => Ok(Self::Tags),
            other => Err(AppError::BadRequest(format!("Unknown search type: {other}"))),
        }
    }
}

/// Results of one search. Categories outside the tab stay empty.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResults {
    pub tab: SearchTab,
    pub query: String,
    pub publications: Vec<publication::Model>,
    pub authors: Vec<UserResponse>,
    pub collections: Vec<collection::Model>,
    pub discussions: Vec<discussion::Model>,
    pub profiles: Vec<UserResponse>,
    pub tags: Vec<tag::Model>,
}

impl SearchResults {
    fn empty(tab: SearchTab, query: String) -> Self {
        Self {
            tab,
            query,
            publications: vec![],
            authors: vec![],
            collections: vec![],
            discussions: vec![],
            profiles: vec![],
            tags: vec![],
        }
    }
}

/// A user's recent and most used searches.
#[derive(Debug, Clone, Serialize)]
pub struct SearchHistoryView {
    pub recent: Vec<search_history::Model>,
    pub popular: Vec<search_history::Model>,
}

/// Search service for business logic.
#[derive(Clone)]
pub struct SearchService {
    db: Arc<DatabaseConnection>,
    publication_repo: PublicationRepository,
    user_repo: UserRepository,
    collection_repo: CollectionRepository,
    discussion_repo: DiscussionRepository,
    tag_repo: TagRepository,
    history_repo: SearchHistoryRepository,
    suggestion_repo: SearchSuggestionRepository,
    id_gen: IdGenerator,
}

impl SearchService {
    /// Create a new search service.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub const fn new(
        db: Arc<DatabaseConnection>,
        publication_repo: PublicationRepository,
        user_repo: UserRepository,
        collection_repo: CollectionRepository,
        discussion_repo: DiscussionRepository,
        tag_repo: TagRepository,
        history_repo: SearchHistoryRepository,
        suggestion_repo: SearchSuggestionRepository,
    ) -> Self {
        Self {
            db,
            publication_repo,
            user_repo,
            collection_repo,
            discussion_repo,
            tag_repo,
            history_repo,
            suggestion_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Run a search on one tab. Signed-in searches are remembered.
    pub async fn search(
        &self,
        viewer_id: Option<&str>,
        tab: SearchTab,
        q: &str,
    ) -> AppResult<SearchResults> {
        let query = normalize(q);
        let mut results = SearchResults::empty(tab, query.clone());
        if query.is_empty() {
            return Ok(results);
        }

        let limit = tab.limit();
        if tab.includes(SearchTab::Publications) {
            results.publications = self.publication_repo.search(&query, limit).await?;
        }
        if tab.includes(SearchTab::Authors) {
            results.authors = public_users(self.user_repo.search_authors(&query, limit).await?);
        }
        if tab.includes(SearchTab::Collections) {
            results.collections = self.collection_repo.search(&query, limit).await?;
        }
        if tab.includes(SearchTab::Discussions) {
            results.discussions = self.discussion_repo.search(&query, limit).await?;
        }
        if tab.includes(SearchTab::Profiles) {
            results.profiles = public_users(self.user_repo.search_profiles(&query, limit).await?);
        }
        if tab.includes(SearchTab::Tags) {
            results.tags = self.tag_repo.search(&query, limit).await?;
        }

        if let Some(user_id) = viewer_id {
            if let Err(e) = self.remember_search(user_id, &query, tab).await {
                warn!(user_id, query = %query, error = %e, "Failed to record search");
            }
        }

        debug!(tab = %tab, query = %query, "Search executed");
        Ok(results)
    }

    async fn remember_search(&self, user_id: &str, query: &str, tab: SearchTab) -> AppResult<()> {
        let txn = noxa_db::begin(&self.db).await?;
        self.add_search_in(&txn, user_id, query, tab.as_str(), None)
            .await?;
        self.increment_search_in(&txn, query).await?;
        noxa_db::commit(txn).await
    }

    /// Remember a search in the user's history.
    ///
    /// Repeating the same (query, type, clicked result) bumps its usage count
    /// instead of adding a row. Blank queries are ignored.
    pub async fn add_search(
        &self,
        user_id: &str,
        query: &str,
        search_type: &str,
        clicked: Option<&Target>,
    ) -> AppResult<()> {
        let query = normalize(query);
        if query.is_empty() {
            return Ok(());
        }

        let txn = noxa_db::begin(&self.db).await?;
        self.add_search_in(&txn, user_id, &query, search_type, clicked)
            .await?;
        noxa_db::commit(txn).await
    }

    /// Remember that the user opened `target` from a search.
    pub async fn record_click(
        &self,
        user_id: &str,
        query: &str,
        search_type: &str,
        target: &Target,
    ) -> AppResult<()> {
        let tab = SearchTab::from_str(search_type)?;
        self.add_search(user_id, query, tab.as_str(), Some(target))
            .await
    }

    /// Count a query in the global suggestion table.
    pub async fn increment_search(&self, query: &str) -> AppResult<()> {
        let query = normalize(query);
        if query.is_empty() {
            return Ok(());
        }
        self.increment_search_in(self.db.as_ref(), &query).await
    }

    async fn add_search_in<C: ConnectionTrait>(
        &self,
        conn: &C,
        user_id: &str,
        query: &str,
        search_type: &str,
        clicked: Option<&Target>,
    ) -> AppResult<()> {
        let key = clicked.map(|t| (t.kind(), t.id()));

        if let Some(existing) = self
            .history_repo
            .find_entry_in(conn, user_id, query, search_type, key)
            .await?
        {
            return self.history_repo.touch_in(conn, &existing.id).await;
        }

        let now = Utc::now();
        self.history_repo
            .create_in(
                conn,
                search_history::ActiveModel {
                    id: Set(self.id_gen.generate()),
                    user_id: Set(user_id.to_string()),
                    query: Set(query.to_string()),
                    search_type: Set(search_type.to_string()),
                    target_kind: Set(clicked.map(Target::kind)),
                    target_id: Set(clicked.map(|t| t.id().to_string())),
                    usage_count: Set(1),
                    last_used: Set(now.into()),
                    created_at: Set(now.into()),
                },
            )
            .await?;

        let evicted = self.history_repo.trim_in(conn, user_id, HISTORY_LIMIT).await?;
        if evicted > 0 {
            debug!(user_id, evicted, "Trimmed search history");
        }
        Ok(())
    }

    async fn increment_search_in<C: ConnectionTrait>(&self, conn: &C, query: &str) -> AppResult<()> {
        self.suggestion_repo
            .upsert_in(
                conn,
                search_suggestion::ActiveModel {
                    id: Set(self.id_gen.generate()),
                    query: Set(query.to_string()),
                    search_count: Set(1),
                    last_searched: Set(Utc::now().into()),
                },
            )
            .await
    }

    pub async fn recent_searches(
        &self,
        user_id: &str,
        limit: u64,
    ) -> AppResult<Vec<search_history::Model>> {
        self.history_repo.find_recent(user_id, limit).await
    }

    pub async fn popular_searches(
        &self,
        user_id: &str,
        limit: u64,
    ) -> AppResult<Vec<search_history::Model>> {
        self.history_repo.find_popular(user_id, limit).await
    }

    /// Recent and popular searches for the history panel.
    pub async fn history(&self, user_id: &str) -> AppResult<SearchHistoryView> {
        Ok(SearchHistoryView {
            recent: self.recent_searches(user_id, HISTORY_VIEW_LIMIT).await?,
            popular: self.popular_searches(user_id, HISTORY_VIEW_LIMIT).await?,
        })
    }

    /// Forget the user's whole history.
    pub async fn clear_history(&self, user_id: &str) -> AppResult<u64> {
        let removed = self.history_repo.clear(user_id).await?;
        debug!(user_id, removed, "Cleared search history");
        Ok(removed)
    }

    /// Global suggestions starting with `prefix`, most searched first.
    pub async fn suggestions(&self, prefix: &str, limit: u64) -> AppResult<Vec<String>> {
        let prefix = normalize(prefix);
        if prefix.is_empty() {
            return Ok(vec![]);
        }

        Ok(self
            .suggestion_repo
            .find_by_prefix(&prefix, limit)
            .await?
            .into_iter()
            .map(|s| s.query)
            .collect())
    }
}

/// Trimmed, lowercased query text.
fn normalize(query: &str) -> String {
    query.trim().to_lowercase()
}
