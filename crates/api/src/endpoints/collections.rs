//! Collection endpoints.

use axum::{
    Router,
    extract::{Path, State},
    routing::{get, post},
};
use noxa_common::AppResult;
use noxa_core::{AddToCollection, CollectionView};
use noxa_db::entities::collection;
use serde::{Deserialize, Serialize};

use crate::{
    extractors::{AuthUser, JsonOrForm},
    middleware::AppState,
    response::ApiResponse,
};

/// Request naming a collection.
#[derive(Debug, Deserialize)]
pub struct CollectionNameRequest {
    #[serde(default)]
    pub name: String,
}

async fn create(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    JsonOrForm(req): JsonOrForm<CollectionNameRequest>,
) -> AppResult<ApiResponse<collection::Model>> {
    let collection = state.collection_service.create(&user.id, &req.name).await?;
    Ok(ApiResponse::ok(collection).success("Collection created successfully!"))
}

async fn delete(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(collection_id): Path<String>,
) -> AppResult<ApiResponse<()>> {
    state
        .collection_service
        .delete(&user.id, &collection_id)
        .await?;
    Ok(ApiResponse::ok(()).success("Collection deleted successfully"))
}

/// Add a publication to a collection picked by name.
async fn add_publication(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(publication_id): Path<String>,
    JsonOrForm(req): JsonOrForm<CollectionNameRequest>,
) -> AppResult<ApiResponse<AddToCollection>> {
    let result = state
        .collection_service
        .add_publication(&user.id, &publication_id, &req.name)
        .await?;

    let text = if result.collection_created {
        format!(
            "New collection \"{}\" created and publication added!",
            result.collection.name
        )
    } else if result.publication_added {
        format!("Publication added to collection \"{}\".", result.collection.name)
    } else {
        format!(
            "Publication is already in collection \"{}\".",
            result.collection.name
        )
    };

    let added = result.publication_added;
    let response = ApiResponse::ok(result);
    Ok(if added {
        response.success(text)
    } else {
        response.info(text)
    })
}

/// Removal response.
#[derive(Serialize)]
pub struct RemoveResponse {
    pub removed: bool,
}

async fn remove_publication(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path((collection_id, publication_id)): Path<(String, String)>,
) -> AppResult<ApiResponse<RemoveResponse>> {
    let removed = state
        .collection_service
        .remove_publication(&user.id, &collection_id, &publication_id)
        .await?;
    Ok(ApiResponse::ok(RemoveResponse { removed }).success("Publication removed from collection"))
}

async fn view(
    State(state): State<AppState>,
    Path((user_id, collection_id)): Path<(String, String)>,
) -> AppResult<ApiResponse<CollectionView>> {
    let view = state.collection_service.view(&user_id, &collection_id).await?;
    Ok(ApiResponse::ok(view))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/collections/create", post(create))
        .route("/delete-collection/{id}", post(delete))
        .route("/add-to-collection/{publication_id}", post(add_publication))
        .route(
            "/delete-from-collection/{collection_id}/{publication_id}",
            post(remove_publication),
        )
        .route(
            "/profile/{user_id}/collection/{collection_id}",
            get(view),
        )
}
