//! Identifiers for circuit entities.
//!
//! Node ids are host-chosen strings. They order lexicographically, which is the
//! order every deterministic traversal in the engine uses.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Node identifier - unique within one circuit
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Create from any string-like value
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get as string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume into the inner string
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for NodeId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl Borrow<str> for NodeId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for NodeId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_node_id_ordering() {
        let a = NodeId::new("a");
        let b = NodeId::from("b");
        assert!(a < b);
    }

    #[test]
    fn test_node_id_serializes_as_plain_string() {
        let id = NodeId::new("sw1");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"sw1\"");
        let back: NodeId = serde_json::from_str("\"sw1\"").unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_borrow_lookup() {
        let mut map = BTreeMap::new();
        map.insert(NodeId::new("gate"), 1);
        assert_eq!(map.get("gate"), Some(&1));
    }
}
