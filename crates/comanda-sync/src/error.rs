//! # Sync Error Types
//!
//! Error types for the push channel bridge.
//!
//! Transport failures surface as a single displayable message; they
//! never mutate queue or ledger state. Best-effort calls (unsubscribe
//! on teardown) log their failures instead of propagating them.

use thiserror::Error;

/// Result type alias for channel operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Channel error type covering configuration, transport and protocol
/// failures.
#[derive(Debug, Error)]
pub enum SyncError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Invalid station configuration.
    #[error("invalid station configuration: {0}")]
    InvalidConfig(String),

    /// Invalid channel or service URL.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// Failed to load the config file.
    #[error("failed to load config: {0}")]
    ConfigLoadFailed(String),

    /// Failed to save the config file.
    #[error("failed to save config: {0}")]
    ConfigSaveFailed(String),

    // =========================================================================
    // Transport Errors
    // =========================================================================
    /// Failed to establish the WebSocket connection.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Channel disconnected unexpectedly.
    #[error("disconnected from push channel")]
    Disconnected,

    /// Connection timeout.
    #[error("connection timeout after {0} seconds")]
    Timeout(u64),

    /// WebSocket protocol error.
    #[error("websocket error: {0}")]
    WebSocketError(String),

    // =========================================================================
    // Protocol Errors
    // =========================================================================
    /// Failed to serialize an outbound message.
    #[error("serialization failed: {0}")]
    SerializationFailed(String),

    // =========================================================================
    // Internal Errors
    // =========================================================================
    /// An internal channel between bridge components closed.
    #[error("channel error: {0}")]
    ChannelError(String),
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        SyncError::SerializationFailed(err.to_string())
    }
}

impl From<url::ParseError> for SyncError {
    fn from(err: url::ParseError) -> Self {
        SyncError::InvalidUrl(err.to_string())
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for SyncError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        use tokio_tungstenite::tungstenite::Error as WsError;
        match err {
            WsError::ConnectionClosed => SyncError::Disconnected,
            WsError::AlreadyClosed => SyncError::Disconnected,
            WsError::Protocol(p) => SyncError::WebSocketError(p.to_string()),
            WsError::Io(io) => SyncError::ConnectionFailed(io.to_string()),
            WsError::Tls(tls) => SyncError::ConnectionFailed(tls.to_string()),
            other => SyncError::WebSocketError(other.to_string()),
        }
    }
}

impl From<std::io::Error> for SyncError {
    fn from(err: std::io::Error) -> Self {
        SyncError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for SyncError {
    fn from(err: toml::de::Error) -> Self {
        SyncError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for SyncError {
    fn from(err: toml::ser::Error) -> Self {
        SyncError::ConfigSaveFailed(err.to_string())
    }
}

// =============================================================================
// Error Categorization
// =============================================================================

impl SyncError {
    /// Returns true if the transport will recover from this error on
    /// its own (reconnect loop keeps running).
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SyncError::ConnectionFailed(_)
                | SyncError::Disconnected
                | SyncError::Timeout(_)
                | SyncError::WebSocketError(_)
        )
    }

    /// Returns true if this error indicates a configuration problem
    /// that no amount of retrying will fix.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            SyncError::InvalidConfig(_)
                | SyncError::InvalidUrl(_)
                | SyncError::ConfigLoadFailed(_)
                | SyncError::ConfigSaveFailed(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_errors() {
        assert!(SyncError::ConnectionFailed("refused".into()).is_retryable());
        assert!(SyncError::Disconnected.is_retryable());
        assert!(SyncError::Timeout(10).is_retryable());

        assert!(!SyncError::InvalidUrl("not a url".into()).is_retryable());
        assert!(!SyncError::SerializationFailed("bad json".into()).is_retryable());
    }

    #[test]
    fn test_config_errors() {
        assert!(SyncError::InvalidUrl("x".into()).is_config_error());
        assert!(!SyncError::Disconnected.is_config_error());
    }
}
