//! API response types.
//!
//! Every JSON endpoint answers with `{"data": ..., "message": {...}}`. The
//! optional message is the flash notice a page would show after the action.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// Severity of a flash message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashLevel {
    Success,
    Info,
    Error,
}

/// A one-shot notice for the user.
#[derive(Debug, Clone, Serialize)]
pub struct FlashMessage {
    pub level: FlashLevel,
    pub text: String,
}

/// Standard API response wrapper.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<FlashMessage>,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a success response.
    pub const fn ok(data: T) -> Self {
        Self {
            data,
            message: None,
        }
    }

    /// Attach a flash message.
    #[must_use]
    pub fn with_message(mut self, level: FlashLevel, text: impl Into<String>) -> Self {
        self.message = Some(FlashMessage {
            level,
            text: text.into(),
        });
        self
    }

    #[must_use]
    pub fn success(self, text: impl Into<String>) -> Self {
        self.with_message(FlashLevel::Success, text)
    }

    #[must_use]
    pub fn info(self, text: impl Into<String>) -> Self {
        self.with_message(FlashLevel::Info, text)
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_message_omitted_when_absent() {
        let json = serde_json::to_value(ApiResponse::ok(1)).unwrap();
        assert_eq!(json, serde_json::json!({"data": 1}));
    }

    #[test]
    fn test_flash_message_shape() {
        let json = serde_json::to_value(ApiResponse::ok(()).success("Saved")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"data": null, "message": {"level": "success", "text": "Saved"}})
        );
    }
}
