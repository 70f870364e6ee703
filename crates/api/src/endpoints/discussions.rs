//! Discussion endpoints.

use axum::{
    Router,
    extract::{Path, State},
    routing::get,
};
use noxa_common::AppResult;
use noxa_core::{CreateDiscussionInput, DiscussionThread, PostMessageInput};
use noxa_db::entities::{discussion, message, publication};

use crate::{
    extractors::{AuthUser, JsonOrForm},
    middleware::AppState,
    response::ApiResponse,
};

/// The publication a new discussion would belong to.
async fn create_form(
    AuthUser(_user): AuthUser,
    State(state): State<AppState>,
    Path(publication_id): Path<String>,
) -> AppResult<ApiResponse<publication::Model>> {
    Ok(ApiResponse::ok(
        state.publication_service.get(&publication_id).await?,
    ))
}

async fn create(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(publication_id): Path<String>,
    JsonOrForm(input): JsonOrForm<CreateDiscussionInput>,
) -> AppResult<ApiResponse<discussion::Model>> {
    let discussion = state
        .discussion_service
        .create_discussion(&user, &publication_id, input)
        .await?;
    Ok(ApiResponse::ok(discussion).success("Discussion created"))
}

async fn view(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<DiscussionThread>> {
    Ok(ApiResponse::ok(state.discussion_service.view(&id).await?))
}

/// Post a message or a reply.
async fn post_message(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonOrForm(input): JsonOrForm<PostMessageInput>,
) -> AppResult<ApiResponse<message::Model>> {
    let message = state
        .discussion_service
        .post_message(&user, &id, input)
        .await?;
    Ok(ApiResponse::ok(message))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/create-discussion/{publication_id}",
            get(create_form).post(create),
        )
        .route("/discussion/{id}", get(view).post(post_message))
}
