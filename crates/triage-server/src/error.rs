//! Error taxonomy → HTTP status mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use triage_core::TriageError;

pub type AppResult<T> = Result<T, AppError>;

/// Wrapper carrying a pipeline error across the HTTP boundary.
#[derive(Debug)]
pub struct AppError(pub TriageError);

impl From<TriageError> for AppError {
    fn from(err: TriageError) -> Self {
        Self(err)
    }
}

impl AppError {
    /// Client input faults are 400; a missing model at startup is 503;
    /// everything else is an internal configuration or model fault.
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            TriageError::Encoding { .. } => StatusCode::BAD_REQUEST,
            TriageError::ModelNotLoaded(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(kind = self.0.kind(), "request failed: {}", self.0);
        }

        let body = Json(json!({
            "error": self.0.to_string(),
            "kind": self.0.kind(),
            "status": status.as_u16(),
        }));
        (status, body).into_response()
    }
}
