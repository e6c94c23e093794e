//! Core library for the roster client.
//!
//! This crate provides the data every connection layer shares:
//! - Server-facing node addresses and connection types
//! - Node descriptors and identifiers
//! - The ordered roster and group description files
//! - Typed messages and the codec registry
//! - The client-facing URL convention

pub mod address;
pub mod codec;
pub mod endpoint;
pub mod error;
pub mod node;
pub mod roster;

pub use address::{ConnType, NodeAddress};
pub use codec::{BincodeCodec, CodecError, JsonCodec, Message, MessageCodec, Registry};
pub use endpoint::ClientUrlMapping;
pub use error::{Error, Result};
pub use node::{NodeDescriptor, NodeId, PublicKey};
pub use roster::{GroupDescription, Roster};
