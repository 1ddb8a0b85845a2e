//! Composite chips: a sub-circuit packaged as a single node type.
//!
//! A chip's external input ports drive `Switch`/`INPUT` nodes inside the
//! sub-circuit; its external output ports read signals of inner nodes. Each
//! chip instance owns a nested evaluator, created on first use.

use crate::builtin::BuiltinGate;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use silica_core::{Circuit, CoreError, CoreResult, PortRef};
use std::fmt;

/// `nodeId.port` inside a chip's sub-circuit
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PortPath(PortRef);

impl PortPath {
    /// Create from parts
    #[must_use]
    pub fn new(node_id: &str, port: &str) -> Self {
        Self(PortRef::new(node_id, port))
    }

    /// Parse `nodeId.port`
    ///
    /// # Errors
    ///
    /// Returns error if the path has no `.` separator
    pub fn parse(path: &str) -> CoreResult<Self> {
        PortRef::parse(path).map(Self)
    }

    /// Inner node id
    #[must_use]
    pub fn node_id(&self) -> &str {
        self.0.node_id.as_str()
    }

    /// Inner port name
    #[must_use]
    pub fn port(&self) -> &str {
        &self.0.port_name
    }

    /// As a port reference
    #[must_use]
    pub fn as_port_ref(&self) -> &PortRef {
        &self.0
    }
}

impl TryFrom<String> for PortPath {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<PortPath> for String {
    fn from(path: PortPath) -> Self {
        path.to_string()
    }
}

impl fmt::Display for PortPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Definition of a composite node type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositeNodeDef {
    /// Type name the chip registers under
    pub name: String,
    /// Sub-circuit template; every instance evaluates its own copy
    pub circuit: Circuit,
    /// External input port -> inner input node
    #[serde(default)]
    pub input_mapping: IndexMap<String, PortPath>,
    /// External output port -> inner signal
    #[serde(default)]
    pub output_mapping: IndexMap<String, PortPath>,
}

impl CompositeNodeDef {
    /// Create a chip with no ports
    #[must_use]
    pub fn new(name: impl Into<String>, circuit: Circuit) -> Self {
        Self {
            name: name.into(),
            circuit,
            input_mapping: IndexMap::new(),
            output_mapping: IndexMap::new(),
        }
    }

    /// Map an external input port onto an inner input node
    #[must_use]
    pub fn with_input(mut self, port: &str, inner_node: &str) -> Self {
        self.input_mapping
            .insert(port.to_string(), PortPath::new(inner_node, "out"));
        self
    }

    /// Map an external output port onto an inner `node.port` signal
    #[must_use]
    pub fn with_output(mut self, port: &str, inner_node: &str, inner_port: &str) -> Self {
        self.output_mapping
            .insert(port.to_string(), PortPath::new(inner_node, inner_port));
        self
    }

    /// Check the sub-circuit and that every mapping lands on an existing node.
    /// Input mappings must target `Switch`/`INPUT` nodes, since those are the
    /// only nodes whose level can be set from outside.
    ///
    /// # Errors
    ///
    /// Returns the first problem found
    pub fn validate(&self) -> CoreResult<()> {
        if self.name.is_empty() {
            return Err(CoreError::validation("name", "composite name is empty"));
        }
        self.circuit.validate()?;

        for (port, path) in &self.input_mapping {
            let node = self.circuit.node(path.node_id()).ok_or_else(|| {
                CoreError::validation(
                    format!("inputMapping.{}", port),
                    format!("unknown inner node `{}`", path.node_id()),
                )
            })?;
            if !BuiltinGate::is_input_type(&node.node_type) {
                return Err(CoreError::validation(
                    format!("inputMapping.{}", port),
                    format!(
                        "inner node `{}` has type `{}`, expected Switch or INPUT",
                        node.id, node.node_type
                    ),
                ));
            }
        }

        for (port, path) in &self.output_mapping {
            if !self.circuit.contains_node(path.node_id()) {
                return Err(CoreError::validation(
                    format!("outputMapping.{}", port),
                    format!("unknown inner node `{}`", path.node_id()),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use silica_core::Node;

    fn and_chip() -> CompositeNodeDef {
        let circuit = Circuit::new()
            .with_node(Node::new("x", "INPUT"))
            .with_node(Node::new("y", "INPUT"))
            .with_node(Node::new("g", "AND"))
            .connect("x", "out", "g", "a")
            .connect("y", "out", "g", "b");
        CompositeNodeDef::new("AndChip", circuit)
            .with_input("a", "x")
            .with_input("b", "y")
            .with_output("out", "g", "out")
    }

    #[test]
    fn test_valid_chip() {
        assert!(and_chip().validate().is_ok());
    }

    #[test]
    fn test_input_must_target_switch() {
        let mut chip = and_chip();
        chip.input_mapping
            .insert("c".to_string(), PortPath::new("g", "out"));
        let err = chip.validate().unwrap_err();
        assert!(err.to_string().contains("expected Switch or INPUT"));
    }

    #[test]
    fn test_unknown_output_node() {
        let chip = and_chip().with_output("q", "nope", "out");
        assert!(chip.validate().is_err());
    }

    #[test]
    fn test_json_shape() {
        let json = serde_json::to_value(and_chip()).unwrap();
        assert_eq!(json["inputMapping"]["a"], "x.out");
        assert_eq!(json["outputMapping"]["out"], "g.out");

        let back: CompositeNodeDef = serde_json::from_value(json).unwrap();
        assert_eq!(back, and_chip());
    }

    #[test]
    fn test_bad_port_path_rejected() {
        let json = serde_json::json!({
            "name": "Broken",
            "circuit": {"version": 1, "nodes": [], "connections": []},
            "inputMapping": {"a": "nodot"}
        });
        assert!(serde_json::from_value::<CompositeNodeDef>(json).is_err());
    }
}
