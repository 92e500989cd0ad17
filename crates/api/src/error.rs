//! JSON error responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use localcloud_core::files::FileError;
use localcloud_shared::AppError;
use serde_json::{Value, json};
use tracing::error;

/// An `AppError` rendered as `{"error": CODE, "message": ...}`.
///
/// Server-side failures are logged in full and answered with a generic message.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl ApiError {
    /// HTTP status for this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// JSON body for this error.
    #[must_use]
    pub fn body(&self) -> Value {
        let message = if self.0.is_server_error() {
            "An error occurred".to_string()
        } else {
            self.0.to_string()
        };

        json!({
            "error": self.0.error_code(),
            "message": message
        })
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl From<FileError> for ApiError {
    fn from(err: FileError) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.0.is_server_error() {
            error!(error = %self.0, "Request failed");
        }
        (self.status(), Json(self.body())).into_response()
    }
}
