//! Error types for roster-level connections.

use connection::ConnectionError;
use thiserror::Error;

/// Result type alias for roster-level connections.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Failure that would repeat on every node, returned without retrying.
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// Every candidate was tried and none answered.
    #[error("no node answered after {attempts} attempt(s){}", last_error(.last))]
    Exhausted {
        attempts: usize,
        last: Option<Box<ConnectionError>>,
    },

    /// A leader connection needs at least one node.
    #[error("roster is empty")]
    EmptyRoster,

    /// Client URL of a node could not be derived.
    #[error(transparent)]
    Address(#[from] corelib::Error),
}

fn last_error(last: &Option<Box<ConnectionError>>) -> String {
    match last {
        Some(err) => format!(", last error: {err}"),
        None => String::new(),
    }
}

impl Error {
    /// Last per-node failure of an exhausted send.
    pub fn last_attempt(&self) -> Option<&ConnectionError> {
        match self {
            Error::Exhausted { last, .. } => last.as_deref(),
            Error::Connection(err) => Some(err),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_exhausted_display() {
        let err = Error::Exhausted {
            attempts: 2,
            last: Some(Box::new(ConnectionError::Timeout(Duration::from_millis(5)))),
        };
        assert_eq!(
            err.to_string(),
            "no node answered after 2 attempt(s), last error: timeout after 5ms"
        );

        let empty = Error::Exhausted {
            attempts: 0,
            last: None,
        };
        assert_eq!(empty.to_string(), "no node answered after 0 attempt(s)");
        assert!(empty.last_attempt().is_none());
    }
}
