//! Error Handling
//!
//! Unified error types for the application.
//! Uses thiserror for ergonomic error definitions. Store-specific errors are
//! mapped onto the stable taxonomy at the boundary and never leak to callers.

use rusqlite::ErrorCode as SqliteCode;
use taskdeck_core::{CoreError, ErrorCode};
use thiserror::Error;

/// Application-wide error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Malformed or inconsistent input
    #[error("Validation error: {0}")]
    Validation(String),

    /// Referenced entity absent
    #[error("Not found: {0}")]
    NotFound(String),

    /// Authenticated but insufficient role
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Lock or uniqueness contention; retry the whole operation
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Session token could not be resolved
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for application errors
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a not found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a permission denied error
    pub fn permission_denied(msg: impl Into<String>) -> Self {
        Self::PermissionDenied(msg.into())
    }

    /// Create a conflict error
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Stable code reported to callers
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Validation(_) => ErrorCode::Validation,
            AppError::NotFound(_) => ErrorCode::NotFound,
            AppError::PermissionDenied(_) => ErrorCode::PermissionDenied,
            AppError::Conflict(_) => ErrorCode::Conflict,
            AppError::Unauthenticated(_) => ErrorCode::Unauthenticated,
            AppError::Config(_)
            | AppError::Io(_)
            | AppError::Serialization(_)
            | AppError::Internal(_) => ErrorCode::Internal,
        }
    }
}

/// SQLite errors are classified: contention becomes `Conflict`, anything
/// else is an `Internal` defect.
impl From<rusqlite::Error> for AppError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(failure, _) => match failure.code {
                SqliteCode::DatabaseBusy | SqliteCode::DatabaseLocked => {
                    AppError::Conflict(format!("store is busy: {}", err))
                }
                SqliteCode::ConstraintViolation
                    if failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                        || failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY =>
                {
                    AppError::Conflict(format!("uniqueness violated: {}", err))
                }
                _ => AppError::Internal(format!("store failure: {}", err)),
            },
            _ => AppError::Internal(format!("store failure: {}", err)),
        }
    }
}

/// Pool checkout only fails on timeout, which is contention.
impl From<r2d2::Error> for AppError {
    fn from(err: r2d2::Error) -> Self {
        AppError::Conflict(format!("Failed to get connection: {}", err))
    }
}

impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(msg) => AppError::Validation(msg),
            CoreError::NotFound(msg) => AppError::NotFound(msg),
            CoreError::PermissionDenied(msg) => AppError::PermissionDenied(msg),
            CoreError::Conflict(msg) => AppError::Conflict(msg),
            CoreError::Unauthenticated(msg) => AppError::Unauthenticated(msg),
            CoreError::Serialization(e) => AppError::Serialization(e),
            CoreError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

/// Convert AppError to a plain string message
impl From<AppError> for String {
    fn from(err: AppError) -> String {
        err.to_string()
    }
}
