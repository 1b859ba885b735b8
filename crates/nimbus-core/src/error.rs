//! Unified error handling for nimbus-core
//!
//! Every failure the engine can produce maps to one of a small set of kinds,
//! so callers can tell apart "the request was rejected" from "the operation
//! itself failed remotely" from "we gave up waiting".
//!
//! # Example
//!
//! ```rust
//! use nimbus_core::CoreError;
//!
//! fn handle_error(err: CoreError) {
//!     if err.is_not_found() {
//!         println!("Resource not found");
//!     } else if err.is_retryable() {
//!         println!("Temporary error, can retry");
//!     }
//! }
//!
//! let err = CoreError::Api {
//!     status: 404,
//!     code: Some("ResourceNotFound".to_string()),
//!     message: "no such virtual network".to_string(),
//! };
//! assert!(err.is_not_found());
//! assert!(!err.is_retryable());
//! ```

use std::time::Duration;
use thiserror::Error;

/// Core error type for engine operations
#[derive(Error, Debug)]
pub enum CoreError {
    /// Network-level failure talking to the API; always retryable
    #[error("transport error: {message}")]
    Transport { message: String },

    /// Non-success HTTP status from the API, with the remote error document
    /// decoded where one was present
    #[error("API error (HTTP {status}): {message}")]
    Api {
        status: u16,
        code: Option<String>,
        message: String,
    },

    /// The remote operation reached a terminal failure state
    #[error("operation failed: {message}")]
    OperationFailed { message: String },

    /// No terminal state was observed before the caller's deadline
    #[error("timed out after {0:?} waiting for operation to complete")]
    Timeout(Duration),

    /// An asynchronous acceptance response carried no operation URL to poll
    #[error("response was accepted asynchronously but carried no operation URL")]
    MissingOperationUrl,

    /// A state-change wait observed a state that is neither pending nor target
    #[error("unexpected state {state:?} while waiting for {target:?}")]
    UnexpectedState { state: String, target: String },

    /// Response body could not be decoded
    #[error("failed to decode response body: {0}")]
    Decode(#[from] serde_json::Error),

    /// A resource ID did not match the expected segment layout
    #[error("parsing resource id {input:?}: {reason}")]
    InvalidResourceId { input: String, reason: String },

    /// A path or header value was not a valid URL
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, CoreError>;

impl CoreError {
    /// Returns true if this failure is worth retrying within a deadline.
    ///
    /// Transport failures, 5xx responses and 429 rate limiting are
    /// retryable; everything else is not.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            CoreError::Transport { .. } => true,
            CoreError::Api { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }

    /// Returns true if this is a "not found" error (404)
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, CoreError::Api { status: 404, .. })
    }

    /// Returns true if the request itself was rejected (4xx other than 429)
    #[must_use]
    pub fn is_fatal_request(&self) -> bool {
        match self {
            CoreError::Api { status, .. } => (400..500).contains(status) && *status != 429,
            _ => false,
        }
    }

    /// Returns true if this is a server error (5xx)
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        matches!(self, CoreError::Api { status, .. } if *status >= 500)
    }

    /// Returns true if this is a local deadline expiry, as opposed to a
    /// remote-side failure
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, CoreError::Timeout(_))
    }
}

impl From<reqwest::Error> for CoreError {
    fn from(err: reqwest::Error) -> Self {
        CoreError::Transport {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api(status: u16) -> CoreError {
        CoreError::Api {
            status,
            code: None,
            message: "test".to_string(),
        }
    }

    #[test]
    fn test_server_errors_are_retryable() {
        assert!(api(500).is_retryable());
        assert!(api(503).is_retryable());
        assert!(api(500).is_server_error());
        assert!(!api(500).is_fatal_request());
    }

    #[test]
    fn test_rate_limiting_is_retryable_but_not_fatal() {
        assert!(api(429).is_retryable());
        assert!(!api(429).is_fatal_request());
    }

    #[test]
    fn test_client_errors_are_fatal() {
        assert!(api(400).is_fatal_request());
        assert!(api(403).is_fatal_request());
        assert!(!api(400).is_retryable());
    }

    #[test]
    fn test_not_found() {
        assert!(api(404).is_not_found());
        assert!(api(404).is_fatal_request());
        assert!(!api(500).is_not_found());
    }

    #[test]
    fn test_transport_is_retryable() {
        let err = CoreError::Transport {
            message: "connection reset".to_string(),
        };
        assert!(err.is_retryable());
        assert!(!err.is_fatal_request());
    }

    #[test]
    fn test_timeout_is_distinct_from_remote_failure() {
        let timeout = CoreError::Timeout(Duration::from_secs(60));
        assert!(timeout.is_timeout());
        assert!(!timeout.is_retryable());

        let failed = CoreError::OperationFailed {
            message: "provisioning failed".to_string(),
        };
        assert!(!failed.is_timeout());
        assert!(failed.to_string().contains("provisioning failed"));
    }
}
