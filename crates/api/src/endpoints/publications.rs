//! Publication endpoints: detail, upload, PDF view, autocomplete and
//! favorite topics.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    response::IntoResponse,
    routing::{get, post},
};
use noxa_common::{AppError, AppResult};
use noxa_core::{
    AutocompleteItem, CollectionSummary, CreatePublicationInput, FavoriteToggle, PublicationDetail,
};
use noxa_db::entities::{publication, tag, topic};
use serde::{Deserialize, Serialize};

use crate::{
    extractors::{AuthUser, FormData, MaybeAuthUser},
    middleware::AppState,
    response::ApiResponse,
};

/// Publication page contents.
#[derive(Serialize)]
pub struct PublicationPage {
    #[serde(flatten)]
    pub detail: PublicationDetail,
    /// Signed-in viewer's collections, for the "add to collection" menu.
    pub collections: Vec<CollectionSummary>,
}

async fn detail(
    viewer: MaybeAuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<PublicationPage>> {
    let detail = state.publication_service.detail(&id).await?;
    let collections = match viewer.id() {
        Some(user_id) => state.collection_service.list_with_counts(user_id).await?,
        None => vec![],
    };

    Ok(ApiResponse::ok(PublicationPage {
        detail,
        collections,
    }))
}

/// Choices offered by the upload form.
#[derive(Serialize)]
pub struct CreatePublicationForm {
    pub topics: Vec<topic::Model>,
    pub tags: Vec<tag::Model>,
}

async fn create_form(
    AuthUser(_user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<CreatePublicationForm>> {
    Ok(ApiResponse::ok(CreatePublicationForm {
        topics: state.topic_service.list_topics().await?,
        tags: state.topic_service.list_tags().await?,
    }))
}

/// Upload a PDF with its metadata.
async fn create(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    mut form: FormData,
) -> AppResult<ApiResponse<publication::Model>> {
    let input: CreatePublicationInput = form.parse()?;
    let file = form
        .take_file("file")
        .ok_or_else(|| AppError::Validation("A PDF file is required".to_string()))?;

    let publication = state.publication_service.create(&user, input, file).await?;

    Ok(ApiResponse::ok(publication).success("Publication created successfully!"))
}

/// Serve the stored PDF inline.
async fn pdf(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let file = state.publication_service.pdf(&id).await?;
    let disposition = format!(
        "inline; filename=\"{}\"",
        file.file_name.replace(['"', '\\', '\r', '\n'], "")
    );

    Ok((
        [
            (CONTENT_TYPE, "application/pdf".to_string()),
            (CONTENT_DISPOSITION, disposition),
        ],
        file.data,
    ))
}

/// Autocomplete query.
#[derive(Debug, Default, Deserialize)]
pub struct AutocompleteQuery {
    #[serde(default)]
    pub q: String,
}

/// Autocomplete response, in the shape select widgets expect.
#[derive(Serialize)]
pub struct AutocompleteResponse {
    pub results: Vec<AutocompleteItem>,
}

async fn filter_topics(
    State(state): State<AppState>,
    Query(query): Query<AutocompleteQuery>,
) -> AppResult<Json<AutocompleteResponse>> {
    let results = state.topic_service.autocomplete_topics(&query.q).await?;
    Ok(Json(AutocompleteResponse { results }))
}

async fn filter_authors(
    State(state): State<AppState>,
    Query(query): Query<AutocompleteQuery>,
) -> AppResult<Json<AutocompleteResponse>> {
    let results = state.topic_service.autocomplete_authors(&query.q).await?;
    Ok(Json(AutocompleteResponse { results }))
}

async fn filter_tags(
    State(state): State<AppState>,
    Query(query): Query<AutocompleteQuery>,
) -> AppResult<Json<AutocompleteResponse>> {
    let results = state.topic_service.autocomplete_tags(&query.q).await?;
    Ok(Json(AutocompleteResponse { results }))
}

/// Add a topic to favorites, or remove it when already there.
async fn toggle_favorite(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(topic_id): Path<String>,
) -> AppResult<ApiResponse<FavoriteToggle>> {
    let outcome = state
        .topic_service
        .toggle_favorite(&user.id, &topic_id)
        .await?;

    let response = ApiResponse::ok(outcome);
    Ok(match outcome {
        FavoriteToggle::Added => response.success("Topic added to your favorites"),
        FavoriteToggle::Removed => response.info("Topic removed from your favorites"),
    })
}

async fn remove_favorite(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(topic_id): Path<String>,
) -> AppResult<ApiResponse<()>> {
    state
        .topic_service
        .remove_favorite(&user.id, &topic_id)
        .await?;
    Ok(ApiResponse::ok(()).success("Topic removed from your favorites"))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/publication/{id}", get(detail))
        .route("/create-publication", get(create_form).post(create))
        .route("/pdf/{id}", get(pdf))
        .route("/filter-topics", get(filter_topics))
        .route("/filter-authors", get(filter_authors))
        .route("/filter-tags", get(filter_tags))
        .route("/add-topic-to-fav/{topic_id}", post(toggle_favorite))
        .route("/remove-topic-from-fav/{topic_id}", post(remove_favorite))
}
