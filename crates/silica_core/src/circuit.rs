//! Circuit documents: nodes, connections and the graph they form.
//!
//! A circuit is a directed, possibly cyclic graph. `Clone` is a total deep copy:
//! cloned circuits share nothing with their source.

use crate::error::{CoreError, CoreResult};
use crate::id::NodeId;
use crate::value::{NodeConfig, NodeState};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Circuit schema version understood by this build
pub const CIRCUIT_VERSION: u32 = 1;

fn default_version() -> u32 {
    CIRCUIT_VERSION
}

/// Canvas position. Presentation-only, but part of the hashed state.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    /// Horizontal offset
    pub x: f64,
    /// Vertical offset
    pub y: f64,
}

/// A node instance in a circuit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Unique within the circuit
    pub id: NodeId,
    /// Registry key selecting the node's behavior
    #[serde(rename = "type")]
    pub node_type: String,
    /// Canvas placement
    #[serde(default)]
    pub position: Position,
    /// Degrees
    #[serde(default)]
    pub rotation: f64,
    /// Static parameters read by the behavior
    #[serde(default)]
    pub config: NodeConfig,
    /// Mutable state carried between ticks
    #[serde(default)]
    pub state: NodeState,
}

impl Node {
    /// Create a node at the origin with empty config and state
    #[must_use]
    pub fn new(id: impl Into<NodeId>, node_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            node_type: node_type.into(),
            position: Position::default(),
            rotation: 0.0,
            config: NodeConfig::new(),
            state: NodeState::new(),
        }
    }

    /// Set position
    #[must_use]
    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.position = Position { x, y };
        self
    }

    /// Add a config entry
    #[must_use]
    pub fn with_config(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.config.insert(key.to_string(), value.into());
        self
    }

    /// Add a state entry
    #[must_use]
    pub fn with_state(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.state.insert(key.to_string(), value.into());
        self
    }
}

/// A `(node, port)` endpoint
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortRef {
    /// Owning node
    pub node_id: NodeId,
    /// Port on that node
    pub port_name: String,
}

impl PortRef {
    /// Create an endpoint
    #[must_use]
    pub fn new(node_id: impl Into<NodeId>, port_name: impl Into<String>) -> Self {
        Self {
            node_id: node_id.into(),
            port_name: port_name.into(),
        }
    }

    /// Parse `nodeId.port`. The split happens at the last dot so node ids may
    /// themselves contain dots.
    ///
    /// # Errors
    ///
    /// Returns error if there is no dot or either side is empty
    pub fn parse(path: &str) -> CoreResult<Self> {
        match path.rsplit_once('.') {
            Some((node, port)) if !node.is_empty() && !port.is_empty() => Ok(Self::new(node, port)),
            _ => Err(CoreError::validation(
                "port path",
                format!("expected `nodeId.port`, got `{}`", path),
            )),
        }
    }
}

impl fmt::Display for PortRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.node_id, self.port_name)
    }
}

/// A directed wire from an output port to an input port
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Connection {
    /// Driving output
    pub from: PortRef,
    /// Driven input
    pub to: PortRef,
}

impl Connection {
    /// Connect `from_node.from_port` to `to_node.to_port`
    #[must_use]
    pub fn new(
        from_node: impl Into<NodeId>,
        from_port: impl Into<String>,
        to_node: impl Into<NodeId>,
        to_port: impl Into<String>,
    ) -> Self {
        Self {
            from: PortRef::new(from_node, from_port),
            to: PortRef::new(to_node, to_port),
        }
    }

    /// Stable identity: `from.nodeId:from.port:to.nodeId:to.port`
    #[must_use]
    pub fn key(&self) -> String {
        format!(
            "{}:{}:{}:{}",
            self.from.node_id, self.from.port_name, self.to.node_id, self.to.port_name
        )
    }
}

/// A circuit document (schema v1)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Circuit {
    /// Document schema version
    #[serde(default = "default_version")]
    pub version: u32,
    /// Nodes in document order
    #[serde(default)]
    pub nodes: Vec<Node>,
    /// Wires in document order
    #[serde(default)]
    pub connections: Vec<Connection>,
}

impl Circuit {
    /// Create an empty circuit
    #[must_use]
    pub fn new() -> Self {
        Self {
            version: CIRCUIT_VERSION,
            nodes: Vec::new(),
            connections: Vec::new(),
        }
    }

    /// Add a node
    #[must_use]
    pub fn with_node(mut self, node: Node) -> Self {
        self.nodes.push(node);
        self
    }

    /// Add a connection
    #[must_use]
    pub fn with_connection(mut self, connection: Connection) -> Self {
        self.connections.push(connection);
        self
    }

    /// Wire `from.port -> to.port`
    #[must_use]
    pub fn connect(self, from: &str, from_port: &str, to: &str, to_port: &str) -> Self {
        self.with_connection(Connection::new(from, from_port, to, to_port))
    }

    /// Look up a node
    #[must_use]
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id.as_str() == id)
    }

    /// Look up a node mutably
    pub fn node_mut(&mut self, id: &str) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|n| n.id.as_str() == id)
    }

    /// Whether a node with this id exists
    #[must_use]
    pub fn contains_node(&self, id: &str) -> bool {
        self.node(id).is_some()
    }

    /// Node ids in lexicographic order
    #[must_use]
    pub fn node_ids(&self) -> BTreeSet<NodeId> {
        self.nodes.iter().map(|n| n.id.clone()).collect()
    }

    /// Check structural invariants: supported version and unique node ids
    ///
    /// # Errors
    ///
    /// Returns error on an unsupported version or a duplicate id
    pub fn validate(&self) -> CoreResult<()> {
        if self.version != CIRCUIT_VERSION {
            return Err(CoreError::UnsupportedVersion {
                kind: "circuit".to_string(),
                found: self.version.to_string(),
            });
        }
        let mut seen = BTreeSet::new();
        for node in &self.nodes {
            if !seen.insert(node.id.as_str()) {
                return Err(CoreError::DuplicateNode {
                    id: node.id.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Input ports driven by more than one connection, with their drivers
    #[must_use]
    pub fn driver_conflicts(&self) -> BTreeMap<PortRef, Vec<PortRef>> {
        let mut drivers: BTreeMap<PortRef, Vec<PortRef>> = BTreeMap::new();
        for conn in &self.connections {
            drivers
                .entry(conn.to.clone())
                .or_default()
                .push(conn.from.clone());
        }
        drivers.retain(|_, from| from.len() > 1);
        drivers
    }
}

impl Default for Circuit {
    fn default() -> Self {
        Self::new()
    }
}
