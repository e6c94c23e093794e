//! Ordered roster of equivalent nodes.
//!
//! Order is significant: the first node is the leader and the list order is
//! the failover priority. A roster may be empty; the layers that need a node
//! reject it themselves.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::node::{NodeDescriptor, NodeId};

/// Ordered membership list.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roster {
    #[serde(rename = "servers", default)]
    list: Vec<NodeDescriptor>,
}

impl Roster {
    pub fn new(list: Vec<NodeDescriptor>) -> Self {
        Self { list }
    }

    /// First node of the list, if any.
    pub fn leader(&self) -> Option<&NodeDescriptor> {
        self.list.first()
    }

    pub fn get(&self, index: usize) -> Option<&NodeDescriptor> {
        self.list.get(index)
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, NodeDescriptor> {
        self.list.iter()
    }

    pub fn node_ids(&self) -> Vec<NodeId> {
        self.list.iter().map(NodeDescriptor::id).collect()
    }

    pub fn as_slice(&self) -> &[NodeDescriptor] {
        &self.list
    }
}

impl FromIterator<NodeDescriptor> for Roster {
    fn from_iter<I: IntoIterator<Item = NodeDescriptor>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Roster {
    type Item = &'a NodeDescriptor;
    type IntoIter = std::slice::Iter<'a, NodeDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.list.iter()
    }
}

/// Group description file: a roster plus a free-text description.
///
/// ```json
/// {
///   "description": "Default cothority",
///   "servers": [
///     { "address": "tls://10.0.0.1:7770", "public": "94b8...", "description": "node 1" }
///   ]
/// }
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupDescription {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(flatten)]
    pub roster: Roster,
}

impl GroupDescription {
    pub fn from_json(input: &str) -> Result<Self> {
        Ok(serde_json::from_str(input)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
