/*
[INPUT]:  Error sources (server error frames, transport, serialization, local misuse)
[OUTPUT]: Structured, cloneable error type shared by every pending watcher
[POS]:    Error handling layer - unified error types for entire crate
[UPDATE]: When adding new error sources or extending the server code tables
*/

use thiserror::Error;

/// Classification of a server-reported error code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeErrorKind {
    Authentication,
    PermissionDenied,
    BadRequest,
    BadSymbol,
    InvalidNonce,
    InvalidOrder,
    InsufficientFunds,
    RateLimit,
    OnMaintenance,
    Generic,
}

impl ExchangeErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExchangeErrorKind::Authentication => "authentication",
            ExchangeErrorKind::PermissionDenied => "permission_denied",
            ExchangeErrorKind::BadRequest => "bad_request",
            ExchangeErrorKind::BadSymbol => "bad_symbol",
            ExchangeErrorKind::InvalidNonce => "invalid_nonce",
            ExchangeErrorKind::InvalidOrder => "invalid_order",
            ExchangeErrorKind::InsufficientFunds => "insufficient_funds",
            ExchangeErrorKind::RateLimit => "rate_limit",
            ExchangeErrorKind::OnMaintenance => "on_maintenance",
            ExchangeErrorKind::Generic => "exchange",
        }
    }
}

impl std::fmt::Display for ExchangeErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Main error type for the streaming client
///
/// Cloneable so that one failure can be delivered to every caller waiting
/// on the same registry entry.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StreamError {
    /// Channel not available for the requested market kind
    #[error("Not supported: {0}")]
    NotSupported(String),

    /// Signed handshake rejected, expired, or credentials missing
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// Server returned an error frame
    #[error("Exchange error [{kind}] (code {code}): {message}")]
    Exchange {
        kind: ExchangeErrorKind,
        code: i64,
        message: String,
    },

    /// Transport-level failure
    #[error("Network error: {0}")]
    Network(String),

    /// Connection was closed while a request was pending
    #[error("Connection closed")]
    ConnectionClosed,

    /// Serialization/deserialization failed
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// A watch resolved with a payload of the wrong shape
    #[error("Unexpected payload: expected {expected}")]
    UnexpectedPayload { expected: &'static str },
}

impl StreamError {
    /// Build the error for a classified server code
    pub fn from_exchange(kind: ExchangeErrorKind, code: i64, message: impl Into<String>) -> Self {
        let message = message.into();
        match kind {
            ExchangeErrorKind::Authentication => StreamError::Authentication { message },
            kind => StreamError::Exchange {
                kind,
                code,
                message,
            },
        }
    }

    /// Check if error indicates authentication failure
    pub fn is_auth_error(&self) -> bool {
        matches!(self, StreamError::Authentication { .. })
    }

    /// Check if the error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            StreamError::Network(_)
                | StreamError::ConnectionClosed
                | StreamError::Exchange {
                    kind: ExchangeErrorKind::RateLimit | ExchangeErrorKind::OnMaintenance,
                    ..
                }
        )
    }
}

impl From<serde_json::Error> for StreamError {
    fn from(err: serde_json::Error) -> Self {
        StreamError::Serialization(err.to_string())
    }
}

impl From<url::ParseError> for StreamError {
    fn from(err: url::ParseError) -> Self {
        StreamError::Config(format!("invalid url: {err}"))
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for StreamError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        StreamError::Network(err.to_string())
    }
}

/// Result type alias for streaming operations
pub type Result<T> = std::result::Result<T, StreamError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_retryable() {
        assert!(StreamError::ConnectionClosed.is_retryable());
        assert!(StreamError::Network("reset".to_string()).is_retryable());

        let auth_err = StreamError::Authentication {
            message: "bad sig".to_string(),
        };
        assert!(!auth_err.is_retryable());
    }

    #[test]
    fn test_from_exchange_authentication_collapses_to_auth_variant() {
        let err = StreamError::from_exchange(ExchangeErrorKind::Authentication, 10002, "UNAUTHORIZED");
        assert!(err.is_auth_error());
        assert_eq!(err.to_string(), "Authentication failed: UNAUTHORIZED");
    }

    #[test]
    fn test_exchange_error_display() {
        let err = StreamError::from_exchange(ExchangeErrorKind::BadRequest, 10004, "invalid channel");
        match &err {
            StreamError::Exchange { kind, code, .. } => {
                assert_eq!(*kind, ExchangeErrorKind::BadRequest);
                assert_eq!(*code, 10004);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(
            err.to_string(),
            "Exchange error [bad_request] (code 10004): invalid channel"
        );
    }
}
