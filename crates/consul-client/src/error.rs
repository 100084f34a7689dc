//! Client error types
//!
//! Three classes of failure reach callers: the request never completed
//! (`Transport`, `Timeout`), Consul answered with a non-2xx status (`Api`),
//! or the client itself rejected the call. A missing key is not an error;
//! resource clients return `None` for it.

use std::time::Duration;

/// Error type for Consul client operations
#[derive(Debug, thiserror::Error)]
pub enum ConsulError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("consul returned status {status}: {message}")]
    Api {
        status: u16,
        message: String,
        /// `X-Consul-Index` of the error response, when the agent sent one
        index: Option<u64>,
    },

    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("session {0} is no longer active")]
    SessionInvalidated(String),
}

impl ConsulError {
    /// Build an API error from a status and response body
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        ConsulError::Api {
            status,
            message: message.into(),
            index: None,
        }
    }

    /// Connection-level failures that may succeed when repeated
    pub fn is_retryable(&self) -> bool {
        matches!(self, ConsulError::Transport(_) | ConsulError::Timeout(_))
    }

    /// Consul answered 404
    pub fn is_not_found(&self) -> bool {
        matches!(self, ConsulError::Api { status: 404, .. })
    }

    /// HTTP status for API errors
    pub fn status(&self) -> Option<u16> {
        match self {
            ConsulError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ConsulError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ConsulError::Transport("connection refused".to_string());
        assert_eq!(err.to_string(), "transport error: connection refused");

        let err = ConsulError::Timeout(Duration::from_secs(5));
        assert_eq!(err.to_string(), "request timed out after 5s");

        let err = ConsulError::api(403, "Permission denied");
        assert_eq!(
            err.to_string(),
            "consul returned status 403: Permission denied"
        );

        let err = ConsulError::SessionInvalidated("abc".to_string());
        assert_eq!(err.to_string(), "session abc is no longer active");
    }

    #[test]
    fn test_classification() {
        assert!(ConsulError::Transport("reset".into()).is_retryable());
        assert!(ConsulError::Timeout(Duration::from_secs(1)).is_retryable());
        assert!(!ConsulError::api(500, "boom").is_retryable());
        assert!(!ConsulError::InvalidRequest("bad".into()).is_retryable());

        assert!(ConsulError::api(404, "").is_not_found());
        assert!(!ConsulError::api(403, "").is_not_found());
        assert_eq!(ConsulError::api(409, "").status(), Some(409));
        assert_eq!(ConsulError::Transport("x".into()).status(), None);
    }

    #[test]
    fn test_from_serde_error() {
        let err: ConsulError = serde_json::from_str::<u32>("nope").unwrap_err().into();
        assert!(matches!(err, ConsulError::Decode(_)));
    }
}
