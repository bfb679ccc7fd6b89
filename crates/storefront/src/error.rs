//! Application-level error handling.
//!
//! Every handler returns `Result<_, AppError>`; the `IntoResponse`
//! implementation renders the uniform JSON error contract. Store and other
//! infrastructure failures are logged server-side and collapse to an opaque
//! `internal` error so that no backend detail leaks to clients.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use crate::services::token::TokenError;
use crate::store::StoreError;

/// Top-level application error.
#[derive(Debug, Error)]
pub enum AppError {
    /// A request failed validation or a business rule; carries the exact
    /// status and user-facing message to render.
    #[error("{message}")]
    Validation {
        status: StatusCode,
        message: String,
    },

    /// Bearer token problem on a token-protected route.
    #[error(transparent)]
    Token(#[from] TokenError),

    /// The credential store failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Any other internal failure.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// 400 with a user-facing message.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::Validation {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    /// 401 with a user-facing message.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Validation {
            status: StatusCode::UNAUTHORIZED,
            message: message.into(),
        }
    }

    /// 404 with a user-facing message.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::Validation {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            Self::Validation { status, message } => (
                status,
                Json(json!({ "status": "error", "payload": message })),
            )
                .into_response(),

            Self::Token(TokenError::Missing) => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "status": "error", "error": "No token provided" })),
            )
                .into_response(),

            Self::Token(TokenError::InvalidOrExpired) => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "status": "error", "error": "Unauthorized" })),
            )
                .into_response(),

            Self::Token(TokenError::Issuance(err)) => {
                tracing::error!(error = %err, "token issuance failed");
                internal_response()
            }

            Self::Store(err) => {
                tracing::error!(error = %err, "credential store failure");
                internal_response()
            }

            Self::Internal(message) => {
                tracing::error!(error = %message, "internal error");
                internal_response()
            }
        }
    }
}

fn internal_response() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "status": "error", "error": "internal" })),
    )
        .into_response()
}
