use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Survey not found")]
    SurveyNotFound,

    #[error("Unsupported locale: {0}")]
    UnknownLocale(String),

    #[error("A submission is already in progress")]
    SubmissionInFlight,

    /// The one true failure class: the backend rejected or never received
    /// the submission. Surfaced as a dismissible notice; the visitor may
    /// resubmit.
    #[error("Submission failed: {0}")]
    SubmissionFailed(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::SurveyNotFound | AppError::UnknownLocale(_) => StatusCode::NOT_FOUND,
            AppError::SubmissionInFlight => StatusCode::CONFLICT,
            AppError::SubmissionFailed(_) => StatusCode::BAD_GATEWAY,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            error!("Request failed: {}", self);
        }

        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}
