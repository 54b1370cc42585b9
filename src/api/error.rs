//! Typed errors for store API calls
//!
//! Errors are tagged by origin, not by transport detail: the decoder builds
//! exactly one variant per failing call, and call sites match on the variant
//! instead of re-inspecting a numeric status code.

use serde_json::Value;
use thiserror::Error;

/// Store client errors
#[derive(Error, Debug)]
pub enum StoreError {
    /// Transport could not complete the exchange (DNS, refused, timeout).
    /// Carries no status code; `status()` reports 0.
    #[error("connection failed: {0}")]
    Connection(String),

    /// Resource absent (HTTP 404)
    #[error("not found: {message}")]
    NotFound {
        message: String,
        body: Option<Value>,
    },

    /// Duplicate bucket, or non-empty bucket on delete (HTTP 409)
    #[error("conflict: {message}")]
    Conflict {
        message: String,
        body: Option<Value>,
    },

    /// Concurrent mutation on the same object (HTTP 423). Retriable after a
    /// short delay; the client itself never retries.
    #[error("resource locked: {message}")]
    Locked {
        message: String,
        body: Option<Value>,
    },

    /// Request rejected by server-side throttling (HTTP 429)
    #[error("rate limited: {message}")]
    RateLimited {
        message: String,
        body: Option<Value>,
    },

    /// Any other non-2xx response, surfaced verbatim
    #[error("request failed with status {status}: {message}")]
    Server {
        status: u16,
        message: String,
        body: Option<Value>,
    },
}

pub type Result<T> = std::result::Result<T, StoreError>;

impl StoreError {
    /// Numeric status backing this error (0 for connection failures)
    pub fn status(&self) -> u16 {
        match self {
            StoreError::Connection(_) => 0,
            StoreError::NotFound { .. } => 404,
            StoreError::Conflict { .. } => 409,
            StoreError::Locked { .. } => 423,
            StoreError::RateLimited { .. } => 429,
            StoreError::Server { status, .. } => *status,
        }
    }

    /// Structured error body, when the server supplied parseable JSON
    pub fn body(&self) -> Option<&Value> {
        match self {
            StoreError::Connection(_) => None,
            StoreError::NotFound { body, .. }
            | StoreError::Conflict { body, .. }
            | StoreError::Locked { body, .. }
            | StoreError::RateLimited { body, .. }
            | StoreError::Server { body, .. } => body.as_ref(),
        }
    }

    /// Whether the caller is expected to retry after a delay (policy hint
    /// only; the client never retries on its own)
    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            StoreError::Locked { .. } | StoreError::RateLimited { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let err = StoreError::Connection("refused".to_string());
        assert_eq!(err.status(), 0);

        let err = StoreError::NotFound {
            message: "no such bucket".to_string(),
            body: None,
        };
        assert_eq!(err.status(), 404);

        let err = StoreError::Server {
            status: 503,
            message: "unavailable".to_string(),
            body: None,
        };
        assert_eq!(err.status(), 503);
    }

    #[test]
    fn test_retriable_kinds() {
        let locked = StoreError::Locked {
            message: "object locked".to_string(),
            body: None,
        };
        let conflict = StoreError::Conflict {
            message: "bucket exists".to_string(),
            body: None,
        };
        assert!(locked.is_retriable());
        assert!(!conflict.is_retriable());
        assert!(!StoreError::Connection("timeout".to_string()).is_retriable());
    }
}
