//! Notification endpoints.

use axum::{
    Router,
    extract::{Path, State},
    routing::{get, post},
};
use noxa_common::AppResult;
use noxa_core::NotificationList;
use noxa_db::entities::notification;
use serde::Serialize;

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

async fn list(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<NotificationList>> {
    Ok(ApiResponse::ok(
        state.notification_service.list(&user.id).await?,
    ))
}

/// A read notification and where the client should go next.
#[derive(Serialize)]
pub struct ReadResponse {
    pub notification: notification::Model,
    pub redirect_to: String,
}

/// Mark one notification as read.
async fn mark_as_read(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<ReadResponse>> {
    let notification = state
        .notification_service
        .mark_as_read(&user.id, &id)
        .await?;
    let redirect_to = notification
        .action_url
        .clone()
        .unwrap_or_else(|| "/notifications".to_string());

    Ok(ApiResponse::ok(ReadResponse {
        notification,
        redirect_to,
    }))
}

async fn delete(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<()>> {
    state.notification_service.soft_delete(&user.id, &id).await?;
    Ok(ApiResponse::ok(()).success("Notification deleted"))
}

#[derive(Serialize)]
pub struct ReadAllResponse {
    pub updated: u64,
}

async fn mark_all_as_read(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<ReadAllResponse>> {
    let updated = state
        .notification_service
        .mark_all_as_read(&user.id)
        .await?;
    Ok(ApiResponse::ok(ReadAllResponse { updated }).success("All notifications marked as read"))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/notifications", get(list))
        .route("/notifications/read-all", post(mark_all_as_read))
        .route("/notification/{id}/read", get(mark_as_read).post(mark_as_read))
        .route("/notification/{id}/delete", post(delete))
}
