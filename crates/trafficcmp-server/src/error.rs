use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;

use trafficcmp_core::CoreError;

use crate::html::render_error;

/// Application-level errors that map directly to HTTP responses.
///
/// Every variant renders the error page with a single user-visible message,
/// so handlers can return `Result<Response, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("analysis failed: {0}")]
    Analysis(#[from] CoreError),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        AppError::Internal(e.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                format!("The upload could not be read: {msg}"),
            ),
            AppError::Analysis(e) => {
                tracing::warn!(error = %e, "Analysis rejected input");
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    format!("A critical error occurred during analysis: {e}"),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("A critical error occurred during analysis: {e}"),
                )
            }
        };

        (status, Html(render_error(&message))).into_response()
    }
}
