//! Authentication error types.

use axum::http::StatusCode;
use thiserror::Error;

use crate::error::AppError;
use crate::store::StoreError;

/// Errors from the authentication service.
#[derive(Debug, Error)]
pub enum AuthError {
    /// A required field was absent from the request.
    #[error("missing required fields")]
    MissingFields,

    /// Registration password and confirmation differ.
    #[error("password confirmation does not match")]
    PasswordMismatch,

    /// Registration email is already taken.
    #[error("user already exists")]
    UserAlreadyExists,

    /// Unknown email, wrong password, or an OAuth-only account on the
    /// password path. Deliberately indistinguishable from outside.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The referenced account does not exist.
    #[error("user not found")]
    UserNotFound,

    /// Password hashing or digest parsing failed.
    #[error("password hashing failed: {0}")]
    Hash(String),

    /// The credential store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingFields => Self::Validation {
                status: StatusCode::BAD_REQUEST,
                message: "Faltan campos obligatorios".to_string(),
            },
            AuthError::PasswordMismatch => Self::Validation {
                status: StatusCode::BAD_REQUEST,
                message: "Las contraseñas ingresadas, no coinciden".to_string(),
            },
            AuthError::UserAlreadyExists => Self::Validation {
                status: StatusCode::BAD_REQUEST,
                message: "El usuario ya está registrado".to_string(),
            },
            AuthError::InvalidCredentials => Self::Validation {
                status: StatusCode::UNAUTHORIZED,
                message: "Error en el usuario o contraseña".to_string(),
            },
            AuthError::UserNotFound => Self::Validation {
                status: StatusCode::NOT_FOUND,
                message: "El usuario no existe".to_string(),
            },
            AuthError::Hash(message) => Self::Internal(message),
            AuthError::Store(err) => Self::Store(err),
        }
    }
}
