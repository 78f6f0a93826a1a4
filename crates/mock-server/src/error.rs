use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// Errors returned by mock handlers.
///
/// Rendered as `{"detail": "..."}`, the shape the real backend uses.
#[derive(Debug, thiserror::Error)]
pub enum MockError {
    #[error("Job ID not found")]
    JobNotFound,

    #[error("{0}")]
    Validation(String),
}

impl IntoResponse for MockError {
    fn into_response(self) -> Response {
        let status = match &self {
            MockError::JobNotFound => StatusCode::NOT_FOUND,
            MockError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        };
        let body = json!({ "detail": self.to_string() });
        (status, axum::Json(body)).into_response()
    }
}
