//! Search endpoints.

use std::str::FromStr;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use noxa_common::AppResult;
use noxa_core::{SearchHistoryView, SearchResults, SearchTab};
use noxa_db::entities::{Target, TargetKind};
use serde::{Deserialize, Serialize};

use crate::{
    extractors::{AuthUser, JsonOrForm, MaybeAuthUser},
    middleware::AppState,
    response::ApiResponse,
};

/// Suggestions returned per request.
const SUGGESTION_LIMIT: u64 = 10;

/// Search query.
#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

async fn search(
    viewer: MaybeAuthUser,
    State(state): State<AppState>,
    Path(tab): Path<String>,
    Query(query): Query<SearchQuery>,
) -> AppResult<ApiResponse<SearchResults>> {
    let tab = SearchTab::from_str(&tab)?;
    let results = state
        .search_service
        .search(viewer.id(), tab, &query.q)
        .await?;
    Ok(ApiResponse::ok(results))
}

#[derive(Serialize)]
pub struct SuggestionsResponse {
    pub suggestions: Vec<String>,
}

async fn suggestions(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> AppResult<Json<SuggestionsResponse>> {
    let suggestions = state
        .search_service
        .suggestions(&query.q, SUGGESTION_LIMIT)
        .await?;
    Ok(Json(SuggestionsResponse { suggestions }))
}

async fn history(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<SearchHistoryView>> {
    Ok(ApiResponse::ok(state.search_service.history(&user.id).await?))
}

#[derive(Serialize)]
pub struct ClearResponse {
    pub removed: u64,
}

async fn clear_history(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<ClearResponse>> {
    let removed = state.search_service.clear_history(&user.id).await?;
    Ok(ApiResponse::ok(ClearResponse { removed }).success("Search history cleared"))
}

/// A search result the user opened.
#[derive(Debug, Deserialize)]
pub struct ClickRequest {
    pub query: String,
    pub search_type: String,
    pub target_kind: TargetKind,
    pub target_id: String,
}

async fn record_click(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    JsonOrForm(req): JsonOrForm<ClickRequest>,
) -> AppResult<ApiResponse<()>> {
    let target = Target::from_parts(req.target_kind, req.target_id);
    state
        .search_service
        .record_click(&user.id, &req.query, &req.search_type, &target)
        .await?;
    Ok(ApiResponse::ok(()))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/search/{tab}", get(search))
        .route("/search-suggestions", get(suggestions))
        .route("/search-history", get(history))
        .route("/search-history/clear", post(clear_history))
        .route("/search-history/click", post(record_click))
}
