//! Centralized error handling.
//!
//! Provides a unified error type for the entire application,
//! with automatic HTTP response conversion.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::{DbErr, SqlErr};
use serde::Serialize;
use thiserror::Error;

use crate::config::{UNIQUE_EMAIL_SUFFIX, UNIQUE_USERNAME_SUFFIX};

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Authentication
    #[error("Not authorized")]
    Unauthorized,

    #[error("Not authorized")]
    MalformedSession,

    #[error("Incorrect credentials")]
    IncorrectCredentials,

    // Account lifecycle
    #[error("Resource not found")]
    NotFound,

    #[error("Could not activate account")]
    ActivationFailed,

    #[error("Username is already taken")]
    DuplicateUsername,

    #[error("Email is already registered")]
    DuplicateEmail,

    // Validation
    #[error("{0}")]
    Validation(String),

    #[error("Invalid input: {0}")]
    BadRequest(String),

    // External service errors
    #[error("Database error")]
    Database(#[from] DbErr),

    #[error("Storage operation timed out")]
    StorageTimeout,

    #[error("Activation email was not sent")]
    InvitationNotSent(String),

    // Internal
    #[error("Internal server error")]
    Internal(String),
}

/// Error response body
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: String,
    message: String,
}

impl AppError {
    /// Get error code for client
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Unauthorized | AppError::MalformedSession => "UNAUTHORIZED",
            AppError::IncorrectCredentials => "INCORRECT_CREDENTIALS",
            AppError::NotFound => "NOT_FOUND",
            AppError::ActivationFailed => "ACTIVATION_FAILED",
            AppError::DuplicateUsername => "USERNAME_TAKEN",
            AppError::DuplicateEmail => "EMAIL_TAKEN",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::Database(_) => "DATABASE_ERROR",
            AppError::StorageTimeout => "STORAGE_TIMEOUT",
            AppError::InvitationNotSent(_) => "INVITATION_NOT_SENT",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Get HTTP status code
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthorized | AppError::MalformedSession | AppError::IncorrectCredentials => {
                StatusCode::UNAUTHORIZED
            }
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::ActivationFailed => StatusCode::BAD_REQUEST,
            AppError::DuplicateUsername | AppError::DuplicateEmail => StatusCode::CONFLICT,
            AppError::Validation(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::StorageTimeout => StatusCode::SERVICE_UNAVAILABLE,
            AppError::InvitationNotSent(_) => StatusCode::BAD_GATEWAY,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get user-facing message (hides internal details)
    pub fn user_message(&self) -> String {
        match self {
            AppError::Validation(msg) => msg.clone(),
            AppError::BadRequest(msg) => msg.clone(),

            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                "A database error occurred".to_string()
            }
            AppError::StorageTimeout => {
                tracing::error!("Storage statement exceeded its timeout");
                "The service is busy, please try again".to_string()
            }
            AppError::InvitationNotSent(reason) => {
                tracing::error!("Activation email failed: {}", reason);
                "Your account was created but the activation email could not be sent. \
                 Sign up again with the same details to receive a new link"
                    .to_string()
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                "An internal error occurred".to_string()
            }

            _ => self.to_string(),
        }
    }

    /// Translate a failed account insert into the taxonomy.
    ///
    /// Unique violations on `<table>_email_key` and `<table>_username_key`
    /// become distinct kinds, everything else stays a storage error.
    pub fn from_account_write(err: DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(detail)) => {
                if detail.contains(UNIQUE_EMAIL_SUFFIX) {
                    AppError::DuplicateEmail
                } else if detail.contains(UNIQUE_USERNAME_SUFFIX) {
                    AppError::DuplicateUsername
                } else {
                    AppError::Database(err)
                }
            }
            _ => AppError::Database(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.code().to_string(),
                message: self.user_message(),
            },
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias
pub type AppResult<T> = Result<T, AppError>;

/// Convenience constructors
impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        AppError::Internal(msg.into())
    }
}
