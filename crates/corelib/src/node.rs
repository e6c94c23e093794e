//! Node abstractions for the roster.
//!
//! A node is one server instance reachable at a network address and holding
//! an identity key. Nodes are identified by a compact `NodeId` derived from
//! the key, which is cheap to compare, hash and log.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::address::NodeAddress;
use crate::error::{Error, Result};

/// Compact identifier for a node in the roster.
///
/// Newtype over `u128` holding the first 16 bytes of the BLAKE3 hash of the
/// node's public key.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct NodeId(pub u128);

impl NodeId {
    /// Derives the identifier of the node owning `key`.
    pub fn from_public_key(key: &PublicKey) -> Self {
        let hash = blake3::hash(key.as_bytes());
        let mut prefix = [0u8; 16];
        prefix.copy_from_slice(&hash.as_bytes()[..16]);
        NodeId(u128::from_be_bytes(prefix))
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", self.0)
    }
}

/// Opaque public identity key, hex encoded on the wire and in group files.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PublicKey(Vec<u8>);

impl PublicKey {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        PublicKey(bytes.into())
    }

    pub fn from_hex(s: &str) -> Result<Self> {
        hex::decode(s.trim())
            .map(PublicKey)
            .map_err(|e| Error::InvalidPublicKey(e.to_string()))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl TryFrom<String> for PublicKey {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::from_hex(&value)
    }
}

impl From<PublicKey> for String {
    fn from(key: PublicKey) -> Self {
        key.to_hex()
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", self.to_hex())
    }
}

/// One server of the roster.
///
/// Keep this struct small and cheap to clone; connection state lives in the
/// connection crates.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeDescriptor {
    /// Server-facing address.
    pub address: NodeAddress,
    /// Identity key.
    pub public: PublicKey,
    /// Explicit client-facing URL, overriding the port convention.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Human-readable description of the operator or host.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl NodeDescriptor {
    /// Construct a descriptor with only the mandatory parts.
    pub fn new(address: NodeAddress, public: PublicKey) -> Self {
        Self {
            address,
            public,
            url: None,
            description: None,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn id(&self) -> NodeId {
        NodeId::from_public_key(&self.public)
    }
}

impl fmt::Display for NodeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.address, self.id())
    }
}
