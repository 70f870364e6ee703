//! API endpoints.

mod auth;
mod collections;
mod discussions;
mod home;
mod notifications;
mod publications;
mod search;
mod users;

use axum::Router;

use crate::middleware::AppState;

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(home::router())
        .merge(auth::router())
        .merge(users::router())
        .merge(publications::router())
        .merge(collections::router())
        .merge(discussions::router())
        .merge(notifications::router())
        .merge(search::router())
}
