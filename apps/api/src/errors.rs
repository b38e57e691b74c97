use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::cadence::engine::CadenceError;
use crate::cadence::lifecycle::LifecycleError;
use crate::outreach::drafter::GenerationError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Cadence error: {0}")]
    Cadence(#[from] CadenceError),

    #[error("Lifecycle error: {0}")]
    Lifecycle(#[from] LifecycleError),

    #[error("Email generation error: {0}")]
    Generation(#[from] GenerationError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
            AppError::Cadence(CadenceError::InvalidHistory(msg)) => {
                tracing::error!("Outreach history integrity violation: {msg}");
                (StatusCode::CONFLICT, "INVALID_HISTORY", msg.clone())
            }
            AppError::Cadence(e @ CadenceError::InvalidConfig(_)) => {
                tracing::error!("{e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
            AppError::Lifecycle(e) => (StatusCode::CONFLICT, "INVALID_TRANSITION", e.to_string()),
            AppError::Generation(GenerationError::Transport(msg)) => {
                tracing::error!("LLM transport error: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    "LLM_UNAVAILABLE",
                    "The email generation service is unavailable".to_string(),
                )
            }
            AppError::Generation(GenerationError::Malformed(msg)) => {
                tracing::error!("LLM returned malformed output: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    "LLM_MALFORMED",
                    "The email generation service returned an unusable response".to_string(),
                )
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "A database error occurred".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
