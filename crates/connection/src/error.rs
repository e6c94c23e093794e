//! Error types for single-endpoint connections.
//!
//! Which of these a caller sees is a local decision: whichever outcome of an
//! exchange fires first. Whether to retry elsewhere is decided by the
//! failover layer through [`ConnectionError::is_retryable`].

use std::time::Duration;

use corelib::CodecError;
use thiserror::Error;

/// Failure reported by a transport adapter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// I/O failure (refused, reset, unreachable, ...).
    #[error("io error: {0}")]
    Io(String),

    /// Peer violated the transport protocol.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Adapter stopped producing events without a close.
    #[error("connection lost")]
    Disconnected,
}

/// Terminal outcome of a failed exchange.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectionError {
    /// Request or response type is not registered. Raised before any I/O.
    #[error("message type `{0}` is not registered")]
    UnregisteredType(&'static str),

    /// Request could not be serialized. Raised before any I/O.
    #[error("failed to encode `{type_name}`: {message}")]
    Encode {
        type_name: &'static str,
        message: String,
    },

    /// Connection URL could not be parsed.
    #[error("invalid url `{url}`: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Peer closed with a code other than [`crate::NORMAL_CLOSURE`].
    #[error("{reason}")]
    AbnormalClose { code: u16, reason: String },

    /// No reply within the configured duration.
    #[error("timeout after {0:?}")]
    Timeout(Duration),

    /// Reply bytes did not parse as the expected type.
    #[error("failed to decode `{type_name}` reply: {message}")]
    Decode {
        type_name: &'static str,
        message: String,
    },
}

impl ConnectionError {
    /// True when another node may well succeed where this one failed.
    ///
    /// Registration and encoding problems are the same on every node.
    pub fn is_retryable(&self) -> bool {
        match self {
            ConnectionError::UnregisteredType(_)
            | ConnectionError::Encode { .. }
            | ConnectionError::InvalidUrl { .. } => false,
            ConnectionError::Transport(_)
            | ConnectionError::AbnormalClose { .. }
            | ConnectionError::Timeout(_)
            | ConnectionError::Decode { .. } => true,
        }
    }
}

impl From<CodecError> for ConnectionError {
    fn from(err: CodecError) -> Self {
        match err {
            CodecError::Unregistered(name) => ConnectionError::UnregisteredType(name),
            CodecError::Encode { type_name, message } => {
                ConnectionError::Encode { type_name, message }
            }
            CodecError::Decode { type_name, message } => {
                ConnectionError::Decode { type_name, message }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_classification() {
        assert!(!ConnectionError::UnregisteredType("Roster").is_retryable());
        assert!(ConnectionError::Timeout(Duration::from_secs(1)).is_retryable());
        assert!(ConnectionError::Transport(TransportError::Disconnected).is_retryable());
        assert!(ConnectionError::AbnormalClose {
            code: 4001,
            reason: "bye".into()
        }
        .is_retryable());
    }

    #[test]
    fn test_abnormal_close_displays_reason() {
        let err = ConnectionError::AbnormalClose {
            code: 1001,
            reason: "reason to close".into(),
        };
        assert_eq!(err.to_string(), "reason to close");
    }

    #[test]
    fn test_codec_error_mapping() {
        let err: ConnectionError = CodecError::Unregistered("Foo").into();
        assert_eq!(err, ConnectionError::UnregisteredType("Foo"));
    }
}
