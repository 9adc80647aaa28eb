//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Maps admission and store errors to HTTP status codes with a JSON body
//! carrying a machine-readable code and one human-readable message.
//! Store failure details are logged, never returned.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use sietch_core::ValidationError;
use thiserror::Error;
use utoipa::ToSchema;

use crate::state::StoreError;

/// Structured JSON error response body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "NOT_FOUND", "VALIDATION_ERROR").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

/// Application-level error type that implements [`IntoResponse`] for Axum.
#[derive(Error, Debug)]
pub enum AppError {
    /// Missing pain token (401).
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Wrong pain token (403).
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Structural or temporal validation failed (400).
    #[error("validation error: {0}")]
    Validation(String),

    /// Request body or query could not be parsed (400).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// No worm with the requested identifier (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// The record store failed (503). Message is logged but not returned to client.
    #[error("service unavailable: {0}")]
    Unavailable(String),

    /// Unexpected server-side failure (500). Message is logged but not returned to client.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Return the HTTP status code and machine-readable error code for this error.
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            Self::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            Self::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::Unavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = match &self {
            Self::Unavailable(_) => {
                tracing::error!(error = %self, "record store unavailable");
                "The sandstorm hides the sietch. Try again later.".to_string()
            }
            Self::Internal(_) => {
                tracing::error!(error = %self, "internal error");
                "An internal error occurred.".to_string()
            }
            Self::Unauthorized(msg)
            | Self::Forbidden(msg)
            | Self::Validation(msg)
            | Self::BadRequest(msg)
            | Self::NotFound(msg) => msg.clone(),
        };

        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
            },
        };

        (status, Json(body)).into_response()
    }
}

/// Admission rejections are always the caller's to fix.
impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => Self::NotFound(format!("worm {id} does not exist")),
            StoreError::Unavailable(e) => Self::Unavailable(e.to_string()),
        }
    }
}
