//! Home page listing.

use axum::{
    Router,
    extract::{Query, State},
    routing::get,
};
use noxa_common::AppResult;
use noxa_core::CollectionSummary;
use noxa_db::entities::{publication, topic};
use serde::{Deserialize, Serialize};

use crate::{extractors::MaybeAuthUser, middleware::AppState, response::ApiResponse};

/// Free-text filter.
#[derive(Debug, Default, Deserialize)]
pub struct HomeQuery {
    pub q: Option<String>,
}

/// Home page contents.
#[derive(Serialize)]
pub struct HomeResponse {
    pub publications: Vec<publication::Model>,
    pub topics: Vec<topic::Model>,
    /// Signed-in viewer's collections; empty for anonymous visitors.
    pub collections: Vec<CollectionSummary>,
}

async fn home(
    viewer: MaybeAuthUser,
    State(state): State<AppState>,
    Query(query): Query<HomeQuery>,
) -> AppResult<ApiResponse<HomeResponse>> {
    let publications = state.publication_service.list(query.q.as_deref()).await?;
    let topics = state.topic_service.list_topics().await?;
    let collections = match viewer.id() {
        Some(user_id) => state.collection_service.list_with_counts(user_id).await?,
        None => vec![],
    };

    Ok(ApiResponse::ok(HomeResponse {
        publications,
        topics,
        collections,
    }))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(home))
}
