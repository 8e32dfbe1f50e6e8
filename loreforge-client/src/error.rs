//! Data-layer error taxonomy.
//!
//! Errors are classified once, at the wire layer, from HTTP status codes
//! and backend error codes. Nothing above that layer inspects message
//! text; the presentation layer switches on the variant.

use thiserror::Error;

/// Result type for data-layer operations.
pub type DataResult<T> = Result<T, DataError>;

/// Errors that can occur in data-layer operations.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("duplicate slug: {0}")]
    DuplicateSlug(String),

    #[error("authentication required")]
    Unauthenticated,

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("validation failed: {0}")]
    ValidationFailed(String),

    #[error("request cancelled")]
    Cancelled,

    #[error("authentication failed: {0}")]
    AuthFailed(String),

    #[error("API request failed: {0}")]
    Api(String),

    #[error("storage operation failed: {0}")]
    Storage(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(reqwest::Error),
}

impl DataError {
    /// True when this error represents an intentionally cancelled request.
    ///
    /// Cancellations come from navigation-away and must never be retried
    /// or surfaced as failures.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

impl From<reqwest::Error> for DataError {
    fn from(err: reqwest::Error) -> Self {
        // A dropped connection mid-request is how an aborted fetch
        // presents itself through reqwest.
        if err.is_request() && format!("{err:?}").contains("aborted") {
            return Self::Cancelled;
        }
        Self::Http(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancellation_is_detected_by_variant() {
        assert!(DataError::Cancelled.is_cancellation());
        assert!(!DataError::Unauthenticated.is_cancellation());
        assert!(!DataError::NotFound("x".into()).is_cancellation());
    }
}
