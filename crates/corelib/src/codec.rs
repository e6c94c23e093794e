//! Typed message codecs and the registry of known message types.
//!
//! Every message crossing a connection is a Rust type implementing
//! [`Message`]. The [`Registry`] is the single source of truth for which
//! message identities may be encoded or decoded; asking it to handle anything
//! else fails before any bytes are produced.
//!
//! # Example
//!
//! ```rust
//! use corelib::codec::{Message, Registry};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize, Deserialize, Debug, PartialEq)]
//! struct Ping { seq: u32 }
//!
//! impl Message for Ping {
//!     const TYPE_NAME: &'static str = "Ping";
//! }
//!
//! let registry = Registry::bincode().with::<Ping>();
//! let bytes = registry.encode(&Ping { seq: 1 }).unwrap();
//! let back: Ping = registry.decode(&bytes).unwrap();
//! assert_eq!(back, Ping { seq: 1 });
//! ```

use std::collections::HashSet;

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

/// Errors raised by codecs and the registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// Type identity was never registered.
    #[error("message type `{0}` is not registered")]
    Unregistered(&'static str),

    /// Failed to encode a message to bytes.
    #[error("encode error for `{type_name}`: {message}")]
    Encode {
        type_name: &'static str,
        message: String,
    },

    /// Bytes did not parse as the expected type.
    #[error("decode error for `{type_name}`: {message}")]
    Decode {
        type_name: &'static str,
        message: String,
    },
}

/// A typed message with a stable identity.
///
/// The identity is used both by the registry and as the last segment of the
/// request path, so it must not contain `/`.
pub trait Message: Serialize + DeserializeOwned + Send + 'static {
    const TYPE_NAME: &'static str;
}

/// Pluggable serialization format.
///
/// Codec instances are shared by every connection of a context, hence the
/// `Send + Sync` bound.
pub trait MessageCodec: Clone + Send + Sync + 'static {
    /// Encode a serializable message to bytes.
    fn encode<T: Serialize>(&self, msg: &T) -> Result<Vec<u8>, String>;

    /// Decode bytes to a deserializable message.
    fn decode<T: DeserializeOwned>(&self, buf: &[u8]) -> Result<T, String>;
}

/// Compact binary codec, the default wire format.
#[derive(Clone, Copy, Debug, Default)]
pub struct BincodeCodec;

impl MessageCodec for BincodeCodec {
    fn encode<T: Serialize>(&self, msg: &T) -> Result<Vec<u8>, String> {
        bincode::serialize(msg).map_err(|e| e.to_string())
    }

    fn decode<T: DeserializeOwned>(&self, buf: &[u8]) -> Result<T, String> {
        bincode::deserialize(buf).map_err(|e| e.to_string())
    }
}

/// JSON codec, handy when debugging against a text transport.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonCodec;

impl MessageCodec for JsonCodec {
    fn encode<T: Serialize>(&self, msg: &T) -> Result<Vec<u8>, String> {
        serde_json::to_vec(msg).map_err(|e| e.to_string())
    }

    fn decode<T: DeserializeOwned>(&self, buf: &[u8]) -> Result<T, String> {
        serde_json::from_slice(buf).map_err(|e| e.to_string())
    }
}

/// Set of registered message identities plus the codec used for them.
#[derive(Clone, Debug, Default)]
pub struct Registry<C: MessageCodec = BincodeCodec> {
    codec: C,
    types: HashSet<&'static str>,
}

impl Registry<BincodeCodec> {
    /// Empty registry using [`BincodeCodec`].
    pub fn bincode() -> Self {
        Self::new(BincodeCodec)
    }
}

impl<C: MessageCodec> Registry<C> {
    pub fn new(codec: C) -> Self {
        Self {
            codec,
            types: HashSet::new(),
        }
    }

    /// Registers `M`; registering twice is a no-op.
    pub fn register<M: Message>(&mut self) -> &mut Self {
        self.types.insert(M::TYPE_NAME);
        self
    }

    /// Builder form of [`Registry::register`].
    pub fn with<M: Message>(mut self) -> Self {
        self.register::<M>();
        self
    }

    pub fn is_registered(&self, type_name: &str) -> bool {
        self.types.contains(type_name)
    }

    pub fn ensure_registered<M: Message>(&self) -> Result<(), CodecError> {
        if self.is_registered(M::TYPE_NAME) {
            Ok(())
        } else {
            Err(CodecError::Unregistered(M::TYPE_NAME))
        }
    }

    pub fn encode<M: Message>(&self, msg: &M) -> Result<Bytes, CodecError> {
        self.ensure_registered::<M>()?;
        self.codec
            .encode(msg)
            .map(Bytes::from)
            .map_err(|message| CodecError::Encode {
                type_name: M::TYPE_NAME,
                message,
            })
    }

    pub fn decode<M: Message>(&self, buf: &[u8]) -> Result<M, CodecError> {
        self.ensure_registered::<M>()?;
        self.codec.decode(buf).map_err(|message| CodecError::Decode {
            type_name: M::TYPE_NAME,
            message,
        })
    }

    pub fn codec(&self) -> &C {
        &self.codec
    }
}
