//! Error types for reply resolution
//!
//! Every failure a `/chat` request can hit maps to exactly one variant here,
//! and every variant maps to exactly one HTTP status.

use thiserror::Error;

use crate::llm::CompletionError;

/// Errors that can occur while resolving a reply
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RelayError {
    /// Malformed or missing input from the caller
    #[error("{0}")]
    BadRequest(String),

    /// The model backend could not be reached
    #[error("The model service is unavailable: {0}")]
    Connection(String),

    /// The model backend did not answer in time
    #[error("The model service timed out: {0}")]
    Timeout(String),

    /// The model backend answered with an error or an unusable payload
    #[error("The model service returned an error: {0}")]
    Upstream(String),

    /// Anything else that went wrong inside the relay
    #[error("Internal error: {0}")]
    Internal(String),
}

impl RelayError {
    /// HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            RelayError::BadRequest(_) => 400,
            RelayError::Timeout(_) => 408,
            RelayError::Upstream(_) | RelayError::Internal(_) => 500,
            RelayError::Connection(_) => 503,
        }
    }
}

impl From<CompletionError> for RelayError {
    fn from(err: CompletionError) -> Self {
        match err {
            CompletionError::Connection(msg) => RelayError::Connection(msg),
            CompletionError::Timeout(after) => {
                RelayError::Timeout(format!("no response after {:?}", after))
            }
            CompletionError::Upstream(msg) => RelayError::Upstream(msg),
        }
    }
}

/// Result type alias for relay operations
pub type RelayResult<T> = Result<T, RelayError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_completion_errors_map_to_statuses() {
        let cases = [
            (CompletionError::Connection("refused".into()), 503),
            (CompletionError::Timeout(Duration::from_secs(200)), 408),
            (CompletionError::Upstream("empty completion".into()), 500),
        ];
        for (err, status) in cases {
            assert_eq!(RelayError::from(err).status_code(), status);
        }
    }

    #[test]
    fn test_messages_are_human_readable() {
        let err = RelayError::from(CompletionError::Timeout(Duration::from_secs(200)));
        assert_eq!(
            err.to_string(),
            "The model service timed out: no response after 200s"
        );
        assert_eq!(RelayError::BadRequest("bad".into()).status_code(), 400);
    }
}
