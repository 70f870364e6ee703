//! API middleware.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;
use noxa_common::{Config, StorageBackend};
use noxa_core::{
    CollectionService, DiscussionService, FollowingService, NotificationService,
    PublicationService, SearchService, TopicService, UserService,
};
use noxa_db::repositories::{
    CollectionRepository, DiscussionRepository, FollowingRepository, NotificationRepository,
    PublicationRepository, SearchHistoryRepository, SearchSuggestionRepository, SessionRepository,
    TagRepository, TopicRepository, UserRepository,
};
use sea_orm::DatabaseConnection;
use tracing::warn;

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE: &str = "noxa_session";

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub user_service: UserService,
    pub publication_service: PublicationService,
    pub topic_service: TopicService,
    pub following_service: FollowingService,
    pub collection_service: CollectionService,
    pub discussion_service: DiscussionService,
    pub notification_service: NotificationService,
    pub search_service: SearchService,
}

impl AppState {
    /// Wire repositories and services over one connection pool.
    #[must_use]
    pub fn new(
        db: Arc<DatabaseConnection>,
        storage: Arc<dyn StorageBackend>,
        config: &Config,
    ) -> Self {
        let user_repo = UserRepository::new(Arc::clone(&db));
        let session_repo = SessionRepository::new(Arc::clone(&db));
        let publication_repo = PublicationRepository::new(Arc::clone(&db));
        let topic_repo = TopicRepository::new(Arc::clone(&db));
        let tag_repo = TagRepository::new(Arc::clone(&db));
        let following_repo = FollowingRepository::new(Arc::clone(&db));
        let collection_repo = CollectionRepository::new(Arc::clone(&db));
        let discussion_repo = DiscussionRepository::new(Arc::clone(&db));
        let notification_repo = NotificationRepository::new(Arc::clone(&db));
        let history_repo = SearchHistoryRepository::new(Arc::clone(&db));
        let suggestion_repo = SearchSuggestionRepository::new(Arc::clone(&db));

        let notification_service = NotificationService::new(notification_repo);

        let user_service = UserService::new(
            user_repo.clone(),
            session_repo,
            Arc::clone(&storage),
            config,
        );
        let publication_service = PublicationService::new(
            Arc::clone(&db),
            publication_repo.clone(),
            topic_repo.clone(),
            tag_repo.clone(),
            user_repo.clone(),
            following_repo.clone(),
            discussion_repo.clone(),
            notification_service.clone(),
            storage,
        );
        let topic_service = TopicService::new(topic_repo, tag_repo.clone(), user_repo.clone());
        let following_service = FollowingService::new(
            Arc::clone(&db),
            following_repo,
            user_repo.clone(),
            notification_service.clone(),
        );
        let collection_service = CollectionService::new(
            Arc::clone(&db),
            collection_repo.clone(),
            publication_repo.clone(),
        );
        let discussion_service = DiscussionService::new(
            Arc::clone(&db),
            discussion_repo.clone(),
            publication_repo.clone(),
            user_repo.clone(),
            notification_service.clone(),
        );
        let search_service = SearchService::new(
            db,
            publication_repo,
            user_repo,
            collection_repo,
            discussion_repo,
            tag_repo,
            history_repo,
            suggestion_repo,
        );

        Self {
            user_service,
            publication_service,
            topic_service,
            following_service,
            collection_service,
            discussion_service,
            notification_service,
            search_service,
        }
    }
}

/// Session token of the request, from `Authorization: Bearer` or the
/// session cookie.
#[must_use]
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty());

    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    CookieJar::from_headers(headers)
        .get(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|token| !token.is_empty())
}

/// Authentication middleware.
///
/// Resolves the session token to a user and stores the user model in the
/// request extensions. Unknown tokens leave the request anonymous.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(token) = session_token(req.headers()) {
        match state.user_service.authenticate_session(&token).await {
            Ok(Some(user)) => {
                req.extensions_mut().insert(user);
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Session lookup failed"),
        }
    }

    next.run(req).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_bearer_wins_over_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        headers.insert("cookie", HeaderValue::from_static("noxa_session=def"));
        assert_eq!(session_token(&headers).as_deref(), Some("abc"));
    }

    #[test]
    fn test_cookie_token() {
        let mut headers = HeaderMap::new();
        headers.insert("cookie", HeaderValue::from_static("theme=dark; noxa_session=def"));
        assert_eq!(session_token(&headers).as_deref(), Some("def"));
    }

    #[test]
    fn test_no_token() {
        assert!(session_token(&HeaderMap::new()).is_none());
    }
}
