//! Error types for the core library.

use thiserror::Error;

use crate::codec::CodecError;

/// Result type alias for the core library.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the core library.
#[derive(Debug, Error)]
pub enum Error {
    /// Address does not follow `conn_type://host:port`
    #[error("Invalid address `{address}`: {reason}")]
    InvalidAddress { address: String, reason: &'static str },

    /// Public key is not valid hex
    #[error("Invalid public key: {0}")]
    InvalidPublicKey(String),

    /// URL could not be parsed or uses an unsupported scheme
    #[error("Invalid URL `{url}`: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// Port offset pushed the client port outside of 0..=65535
    #[error("Client port {port} + {offset} is out of range")]
    PortOutOfRange { port: u16, offset: i32 },

    /// Group description could not be read
    #[error("Roster error: {0}")]
    Roster(String),

    /// Codec registry failure
    #[error(transparent)]
    Codec(#[from] CodecError),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Roster(err.to_string())
    }
}
