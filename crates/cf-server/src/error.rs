//! Error-to-HTTP response conversion.
//!
//! Processing failures are reported in-band (`success: false`), so this is
//! only reached for requests that never make it to the orchestrator, such as
//! an unparseable body.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// Wrapper so we can implement `IntoResponse` for an external type.
#[derive(Debug)]
pub struct AppError {
    inner: cf_core::Error,
}

impl AppError {
    pub fn new(inner: cf_core::Error) -> Self {
        Self { inner }
    }
}

impl From<cf_core::Error> for AppError {
    fn from(e: cf_core::Error) -> Self {
        Self::new(e)
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(cf_core::Error::validation(rejection.body_text()))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.inner.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            tracing::error!(status = %status, error = %self.inner, "Server error in API handler");
        }

        let body = json!({
            "success": false,
            "error": self.inner.to_string(),
            "code": self.inner.kind(),
        });

        (status, axum::Json(body)).into_response()
    }
}
