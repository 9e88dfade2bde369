//! Points Error Types
//!
//! This module provides ledger, leaderboard and archive error variants that
//! integrate with the unified `kernel::error::AppError` system.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, conversions::classify_sqlx_error, kind::ErrorKind};
use kernel::id::{ProductId, TaskId, UserId};
use serde_json::json;
use thiserror::Error;

/// Points-specific result type alias
pub type PointsResult<T> = Result<T, PointsError>;

/// Points-specific error variants
#[derive(Debug, Error)]
pub enum PointsError {
    /// Malformed request, inactive task, unavailable product, overflow
    #[error("{0}")]
    Validation(String),

    #[error("Resident {0} not found")]
    ResidentNotFound(UserId),

    /// One or more referenced tasks do not exist
    #[error("Tasks not found: {}", join_ids(.0))]
    TasksNotFound(Vec<TaskId>),

    /// One or more referenced products do not exist
    #[error("Products not found: {}", join_ids(.0))]
    ProductsNotFound(Vec<ProductId>),

    #[error("Insufficient points: {required} required, {available} available")]
    InsufficientPoints { required: i64, available: i64 },

    /// Concurrent operation in flight (archive run, lock contention)
    #[error("{0}")]
    Conflict(String),

    #[error("Insufficient permissions")]
    Forbidden,

    /// Resident has no leaderboard entry (archived or filtered out)
    #[error("Resident {0} is not ranked")]
    PositionNotFound(UserId),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

fn join_ids<T: std::fmt::Display>(ids: &[T]) -> String {
    ids.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl PointsError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.kind().status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            PointsError::Validation(_) => ErrorKind::BadRequest,
            PointsError::ResidentNotFound(_)
            | PointsError::TasksNotFound(_)
            | PointsError::ProductsNotFound(_)
            | PointsError::PositionNotFound(_) => ErrorKind::NotFound,
            PointsError::InsufficientPoints { .. } => ErrorKind::PaymentRequired,
            PointsError::Conflict(_) => ErrorKind::Conflict,
            PointsError::Forbidden => ErrorKind::Forbidden,
            PointsError::Database(e) => classify_sqlx_error(e).0,
            PointsError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    /// Stable machine-readable code for the error envelope
    pub fn code(&self) -> &'static str {
        match self {
            PointsError::Validation(_) => "VALIDATION_ERROR",
            PointsError::ResidentNotFound(_)
            | PointsError::TasksNotFound(_)
            | PointsError::ProductsNotFound(_)
            | PointsError::PositionNotFound(_) => "NOT_FOUND",
            PointsError::InsufficientPoints { .. } => "INSUFFICIENT_POINTS",
            PointsError::Conflict(_) => "CONFLICT",
            PointsError::Forbidden => "FORBIDDEN",
            PointsError::Database(e) => match classify_sqlx_error(e).0 {
                ErrorKind::Conflict => "CONFLICT",
                _ => "DATABASE_ERROR",
            },
            PointsError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    fn details(&self) -> Option<serde_json::Value> {
        match self {
            PointsError::TasksNotFound(ids) => Some(json!({ "missingTaskIds": ids })),
            PointsError::ProductsNotFound(ids) => Some(json!({ "missingProductIds": ids })),
            PointsError::InsufficientPoints {
                required,
                available,
            } => Some(json!({ "required": required, "available": available })),
            _ => None,
        }
    }

    /// Convert to AppError
    pub fn to_app_error(&self) -> AppError {
        let message = match self {
            PointsError::Database(e) => classify_sqlx_error(e).1.to_string(),
            PointsError::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        };
        let err = AppError::new(self.kind(), message).with_code(self.code());
        match self.details() {
            Some(details) => err.with_details(details),
            None => err,
        }
    }

    /// Log the error with appropriate level
    pub fn log(&self) {
        match self {
            PointsError::Database(e) => {
                tracing::error!(error = %e, "Points database error");
            }
            PointsError::Internal(msg) => {
                tracing::error!(message = %msg, "Points internal error");
            }
            PointsError::InsufficientPoints {
                required,
                available,
            } => {
                tracing::info!(required, available, "Redemption rejected");
            }
            PointsError::Conflict(msg) => {
                tracing::warn!(message = %msg, "Points conflict");
            }
            _ => {
                tracing::debug!(error = %self, "Points error");
            }
        }
    }
}

impl IntoResponse for PointsError {
    fn into_response(self) -> Response {
        self.log();
        self.to_app_error().into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_points_envelope() {
        let err = PointsError::InsufficientPoints {
            required: 120,
            available: 100,
        };
        assert_eq!(err.status_code(), StatusCode::PAYMENT_REQUIRED);

        let app = err.to_app_error();
        assert_eq!(app.code(), "INSUFFICIENT_POINTS");
        assert_eq!(
            app.details(),
            Some(&json!({ "required": 120, "available": 100 }))
        );
    }

    #[test]
    fn test_missing_tasks_lists_ids() {
        let err = PointsError::TasksNotFound(vec![TaskId::new(3), TaskId::new(9)]);
        assert_eq!(err.to_string(), "Tasks not found: 3, 9");
        assert_eq!(err.code(), "NOT_FOUND");
        assert_eq!(
            err.to_app_error().details(),
            Some(&json!({ "missingTaskIds": [3, 9] }))
        );
    }

    #[test]
    fn test_internal_detail_is_hidden() {
        let err = PointsError::Internal("mutex poisoned at shard 4".into());
        assert_eq!(err.to_app_error().message(), "Internal server error");
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_lock_timeout_is_conflict() {
        let err = PointsError::Conflict("Archive run already in progress".into());
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(err.code(), "CONFLICT");
    }
}
