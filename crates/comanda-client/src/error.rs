//! # Client Error Types
//!
//! Errors crossing the request/response boundary.
//!
//! Every variant renders as a single message suitable for direct
//! display at the station; nothing here is retried automatically
//! (retry is a user re-action).

use thiserror::Error;

/// Result type alias for settlement service calls.
pub type ClientResult<T> = Result<T, ClientError>;

/// Settlement service client errors.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The service rejected the request as invalid.
    #[error("{0}")]
    Validation(String),

    /// The requested resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Any other service-side failure, with the service's own message.
    #[error("{message}")]
    Api { status: u16, message: String },

    /// Network-level failure (connect, timeout, TLS).
    #[error("service unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    /// The service answered with a body we cannot interpret.
    #[error("invalid response from service: {0}")]
    InvalidResponse(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_are_displayable() {
        let err = ClientError::Api {
            status: 500,
            message: "no open order for table 7".into(),
        };
        assert_eq!(err.to_string(), "no open order for table 7");

        let err = ClientError::Validation("payment already recorded".into());
        assert_eq!(err.to_string(), "payment already recorded");
    }
}
