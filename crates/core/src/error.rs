//! Core Error Types
//!
//! Defines the error taxonomy shared across the Taskdeck workspace.
//! These error types are dependency-free (only thiserror + std) to keep the core
//! crate lightweight.
//!
//! The main application crate extends these with additional variants
//! (e.g., Config, Io) and maps store errors onto the same codes.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Stable, transport-independent error code returned to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    Validation,
    NotFound,
    PermissionDenied,
    Conflict,
    Unauthenticated,
    Internal,
}

impl ErrorCode {
    /// Wire representation of the code
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::Validation => "VALIDATION",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::PermissionDenied => "PERMISSION_DENIED",
            ErrorCode::Conflict => "CONFLICT",
            ErrorCode::Unauthenticated => "UNAUTHENTICATED",
            ErrorCode::Internal => "INTERNAL",
        }
    }

    /// Whether retrying the whole operation may succeed.
    ///
    /// Only lock and uniqueness contention qualifies.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorCode::Conflict)
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Core error type for the Taskdeck workspace.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Malformed or inconsistent input
    #[error("Validation error: {0}")]
    Validation(String),

    /// Referenced entity is absent
    #[error("Not found: {0}")]
    NotFound(String),

    /// Authenticated but insufficient role
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Lock or uniqueness contention (retryable)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Token could not be resolved to an actor
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for core errors
pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
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

    /// Create an unauthenticated error
    pub fn unauthenticated(msg: impl Into<String>) -> Self {
        Self::Unauthenticated(msg.into())
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Stable code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            CoreError::Validation(_) => ErrorCode::Validation,
            CoreError::NotFound(_) => ErrorCode::NotFound,
            CoreError::PermissionDenied(_) => ErrorCode::PermissionDenied,
            CoreError::Conflict(_) => ErrorCode::Conflict,
            CoreError::Unauthenticated(_) => ErrorCode::Unauthenticated,
            CoreError::Serialization(_) | CoreError::Internal(_) => ErrorCode::Internal,
        }
    }
}

/// Convert CoreError to a string
impl From<CoreError> for String {
    fn from(err: CoreError) -> String {
        err.to_string()
    }
}
