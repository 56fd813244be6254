//! Account Error Types
//!
//! Account-specific error variants that integrate with the unified
//! `kernel::error::AppError` system.
//!
//! Credential and token failures are collapsed into single variants so the
//! responses carry no account-enumeration oracle: "no such account" and
//! "wrong password" render identically, as do "expired", "consumed" and
//! "mismatched" tokens.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use thiserror::Error;

/// Account-specific result type alias
pub type AccountResult<T> = Result<T, AccountError>;

/// Account-specific error variants
#[derive(Debug, Error)]
pub enum AccountError {
    /// Wrong password or unknown identifier (indistinguishable by design)
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// An account with this email already exists
    #[error("The email is already registered")]
    DuplicateAccount,

    /// Correct credentials, but the email has not been confirmed yet
    #[error("The account email has not been confirmed")]
    AccountNotConfirmed,

    /// Single-use token mismatched, expired or already consumed
    #[error("Invalid or expired token")]
    InvalidToken,

    /// Session artifact missing, malformed or expired
    #[error("Session not found or expired")]
    SessionInvalid,

    /// Account not found
    #[error("Account not found")]
    NotFound,

    /// Caller lacks the required role
    #[error("Insufficient permissions")]
    Forbidden,

    /// Request payload failed validation
    #[error("{0}")]
    Validation(String),

    /// Password violates the password policy
    #[error("Password validation failed: {0}")]
    PasswordPolicy(#[from] platform::password::PasswordPolicyError),

    /// Credential store failure (surfaced as Unavailable, never retried here)
    #[error("Store error: {0}")]
    Store(#[from] sqlx::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AccountError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AccountError::InvalidCredentials
            | AccountError::AccountNotConfirmed
            | AccountError::SessionInvalid => StatusCode::UNAUTHORIZED,
            AccountError::DuplicateAccount => StatusCode::CONFLICT,
            AccountError::InvalidToken
            | AccountError::Validation(_)
            | AccountError::PasswordPolicy(_) => StatusCode::BAD_REQUEST,
            AccountError::NotFound => StatusCode::NOT_FOUND,
            AccountError::Forbidden => StatusCode::FORBIDDEN,
            AccountError::Store(_) => StatusCode::SERVICE_UNAVAILABLE,
            AccountError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            AccountError::InvalidCredentials
            | AccountError::AccountNotConfirmed
            | AccountError::SessionInvalid => ErrorKind::Unauthorized,
            AccountError::DuplicateAccount => ErrorKind::Conflict,
            AccountError::InvalidToken
            | AccountError::Validation(_)
            | AccountError::PasswordPolicy(_) => ErrorKind::BadRequest,
            AccountError::NotFound => ErrorKind::NotFound,
            AccountError::Forbidden => ErrorKind::Forbidden,
            AccountError::Store(_) => ErrorKind::ServiceUnavailable,
            AccountError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    /// Convert to AppError
    pub fn to_app_error(&self) -> AppError {
        AppError::new(self.kind(), self.to_string())
    }

    /// Log the error with appropriate level
    fn log(&self) {
        match self {
            AccountError::Store(e) => {
                tracing::error!(error = %e, "Credential store unavailable");
            }
            AccountError::Internal(msg) => {
                tracing::error!(message = %msg, "Account internal error");
            }
            AccountError::InvalidCredentials => {
                tracing::warn!("Invalid sign-in attempt");
            }
            AccountError::Forbidden => {
                tracing::warn!("Privileged operation denied");
            }
            _ => {
                tracing::debug!(error = %self, "Account error");
            }
        }
    }
}

impl IntoResponse for AccountError {
    fn into_response(self) -> Response {
        self.log();
        self.to_app_error().into_response()
    }
}

impl From<AppError> for AccountError {
    fn from(err: AppError) -> Self {
        match err.kind() {
            ErrorKind::BadRequest => AccountError::Validation(err.message().to_string()),
            ErrorKind::NotFound => AccountError::NotFound,
            _ => AccountError::Internal(err.to_string()),
        }
    }
}

impl From<platform::password::PasswordHashError> for AccountError {
    fn from(err: platform::password::PasswordHashError) -> Self {
        AccountError::Internal(err.to_string())
    }
}
