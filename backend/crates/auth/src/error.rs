//! Auth Error Types
//!
//! This module provides auth-specific error variants that integrate
//! with the unified `kernel::error::AppError` system.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, conversions::classify_sqlx_error, kind::ErrorKind};
use platform::password::{PasswordError, PasswordHashError, PasswordPolicyError};
use platform::token::TokenError;
use thiserror::Error;

/// Auth-specific result type alias
pub type AuthResult<T> = Result<T, AuthError>;

/// Message shared by both login flows so callers cannot probe which
/// identifiers exist or which role they belong to.
pub const USER_NOT_FOUND_MESSAGE: &str = "User not found";

/// Auth-specific error variants
#[derive(Debug, Error)]
pub enum AuthError {
    /// Malformed input (empty password, bad email, policy violation)
    #[error("{0}")]
    Validation(String),

    /// Server misconfiguration (pepper or token secrets)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Unknown login identifier, or identifier used with the wrong flow
    #[error("User not found")]
    UserNotFound,

    /// Wrong password
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// No bearer token or refresh cookie
    #[error("Authentication required")]
    MissingToken,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token expired")]
    ExpiredToken,

    /// Authenticated but not allowed
    #[error("Insufficient permissions")]
    Forbidden,

    /// Officer email already registered
    #[error("Email is already registered")]
    EmailTaken,

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.kind().status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::Validation(_) => ErrorKind::BadRequest,
            AuthError::UserNotFound => ErrorKind::NotFound,
            AuthError::InvalidCredentials
            | AuthError::MissingToken
            | AuthError::InvalidToken
            | AuthError::ExpiredToken => ErrorKind::Unauthorized,
            AuthError::Forbidden => ErrorKind::Forbidden,
            AuthError::EmailTaken => ErrorKind::Conflict,
            AuthError::Database(e) => classify_sqlx_error(e).0,
            AuthError::Configuration(_) | AuthError::Internal(_) => {
                ErrorKind::InternalServerError
            }
        }
    }

    /// Stable machine-readable code for the error envelope
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::Validation(_) => "VALIDATION_ERROR",
            AuthError::Configuration(_) => "CONFIGURATION_ERROR",
            AuthError::UserNotFound => "NOT_FOUND",
            AuthError::InvalidCredentials => "INVALID_CREDENTIALS",
            AuthError::MissingToken | AuthError::InvalidToken => "INVALID_TOKEN",
            AuthError::ExpiredToken => "EXPIRED_TOKEN",
            AuthError::Forbidden => "FORBIDDEN",
            AuthError::EmailTaken => "CONFLICT",
            AuthError::Database(e) => match classify_sqlx_error(e).0 {
                ErrorKind::Conflict => "CONFLICT",
                _ => "DATABASE_ERROR",
            },
            AuthError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Convert to AppError
    ///
    /// Server-side failures are reported with a generic message; the detail
    /// only goes to the log.
    pub fn to_app_error(&self) -> AppError {
        let message = match self {
            AuthError::Database(e) => classify_sqlx_error(e).1.to_string(),
            AuthError::Configuration(_) | AuthError::Internal(_) => {
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };
        AppError::new(self.kind(), message).with_code(self.code())
    }

    /// Log the error with appropriate level
    pub fn log(&self) {
        match self {
            AuthError::Database(e) => {
                tracing::error!(error = %e, "Auth database error");
            }
            AuthError::Configuration(msg) => {
                tracing::error!(message = %msg, "Auth configuration error");
            }
            AuthError::Internal(msg) => {
                tracing::error!(message = %msg, "Auth internal error");
            }
            AuthError::InvalidCredentials => {
                tracing::warn!("Invalid login attempt");
            }
            AuthError::InvalidToken => {
                tracing::warn!("Rejected invalid token");
            }
            _ => {
                tracing::debug!(error = %self, "Auth error");
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        self.log();
        self.to_app_error().into_response()
    }
}

impl From<AppError> for AuthError {
    fn from(err: AppError) -> Self {
        match err.kind() {
            ErrorKind::BadRequest => AuthError::Validation(err.message().to_string()),
            _ => AuthError::Internal(err.to_string()),
        }
    }
}

impl From<TokenError> for AuthError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Invalid => AuthError::InvalidToken,
            TokenError::Expired => AuthError::ExpiredToken,
            TokenError::WeakSecret { .. } | TokenError::SharedSecret => {
                AuthError::Configuration(err.to_string())
            }
            TokenError::Signing(msg) => AuthError::Internal(msg),
        }
    }
}

impl From<PasswordPolicyError> for AuthError {
    fn from(err: PasswordPolicyError) -> Self {
        AuthError::Validation(err.to_string())
    }
}

impl From<PasswordHashError> for AuthError {
    fn from(err: PasswordHashError) -> Self {
        match err {
            PasswordHashError::MissingPassword => AuthError::Validation(err.to_string()),
            PasswordHashError::MissingPepper => AuthError::Configuration(err.to_string()),
            PasswordHashError::HashingFailed(_) | PasswordHashError::InvalidHashFormat => {
                AuthError::Internal(err.to_string())
            }
        }
    }
}

impl From<PasswordError> for AuthError {
    fn from(err: PasswordError) -> Self {
        match err {
            PasswordError::Policy(e) => e.into(),
            PasswordError::Hash(e) => e.into(),
        }
    }
}

impl From<tokio::task::JoinError> for AuthError {
    fn from(err: tokio::task::JoinError) -> Self {
        AuthError::Internal(format!("blocking task failed: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_and_code_mapping() {
        let cases = [
            (AuthError::Validation("x".into()), 400, "VALIDATION_ERROR"),
            (AuthError::UserNotFound, 404, "NOT_FOUND"),
            (AuthError::InvalidCredentials, 401, "INVALID_CREDENTIALS"),
            (AuthError::InvalidToken, 401, "INVALID_TOKEN"),
            (AuthError::ExpiredToken, 401, "EXPIRED_TOKEN"),
            (AuthError::Forbidden, 403, "FORBIDDEN"),
            (AuthError::EmailTaken, 409, "CONFLICT"),
            (AuthError::Configuration("x".into()), 500, "CONFIGURATION_ERROR"),
        ];

        for (err, status, code) in cases {
            assert_eq!(err.status_code().as_u16(), status, "{err:?}");
            assert_eq!(err.code(), code, "{err:?}");
        }
    }

    #[test]
    fn test_token_errors_map_to_distinct_codes() {
        assert_eq!(AuthError::from(TokenError::Invalid).code(), "INVALID_TOKEN");
        assert_eq!(AuthError::from(TokenError::Expired).code(), "EXPIRED_TOKEN");
        assert_eq!(
            AuthError::from(TokenError::SharedSecret).code(),
            "CONFIGURATION_ERROR"
        );
    }

    #[test]
    fn test_missing_pepper_is_configuration_error() {
        let err = AuthError::from(PasswordHashError::MissingPepper);
        assert_eq!(err.code(), "CONFIGURATION_ERROR");
        let err = AuthError::from(PasswordHashError::MissingPassword);
        assert_eq!(err.code(), "VALIDATION_ERROR");
    }

    #[test]
    fn test_internal_detail_not_exposed() {
        let err = AuthError::Internal("argon2 exploded".into());
        let app = err.to_app_error();
        assert!(!app.message().contains("argon2"));
        assert_eq!(app.code(), "INTERNAL_ERROR");
    }

    #[test]
    fn test_envelope_message_for_not_found() {
        let app = AuthError::UserNotFound.to_app_error();
        assert_eq!(app.message(), USER_NOT_FOUND_MESSAGE);
    }
}
