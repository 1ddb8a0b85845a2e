//! Structural diff between two snapshots.

use crate::snapshot::CircuitStateSnapshot;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use silica_core::{CanonicalValue, LogicValue, NodeId, PortValues};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// One node-state key that differs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateChange {
    /// Node present on both sides
    pub node_id: NodeId,
    /// State key
    pub key: String,
    /// `None` if the key was added
    pub old: Option<Value>,
    /// `None` if the key was removed
    pub new: Option<Value>,
}

/// One `(node, port)` signal that differs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalChange {
    /// Node owning the port
    pub node_id: NodeId,
    /// Port name
    pub port: String,
    /// `None` if the signal appeared
    pub old: Option<LogicValue>,
    /// `None` if the signal disappeared
    pub new: Option<LogicValue>,
}

/// Differences between two snapshots, every list in sorted order
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateDiff {
    /// Nodes only in the later snapshot
    pub added_nodes: Vec<NodeId>,
    /// Nodes only in the earlier snapshot
    pub removed_nodes: Vec<NodeId>,
    /// State keys that differ on shared nodes
    pub state_changes: Vec<StateChange>,
    /// Port levels that differ
    pub signal_changes: Vec<SignalChange>,
    /// Connection keys, `from.nodeId:from.port:to.nodeId:to.port`
    pub added_connections: Vec<String>,
    /// Same format as `added_connections`
    pub removed_connections: Vec<String>,
}

/// Count per diff category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffSummary {
    /// Length of [`StateDiff::added_nodes`]
    pub added_nodes: usize,
    /// Length of [`StateDiff::removed_nodes`]
    pub removed_nodes: usize,
    /// Length of [`StateDiff::state_changes`]
    pub state_changes: usize,
    /// Length of [`StateDiff::signal_changes`]
    pub signal_changes: usize,
    /// Length of [`StateDiff::added_connections`]
    pub added_connections: usize,
    /// Length of [`StateDiff::removed_connections`]
    pub removed_connections: usize,
}

impl DiffSummary {
    /// Sum of all categories
    #[must_use]
    pub fn total(&self) -> usize {
        self.added_nodes
            + self.removed_nodes
            + self.state_changes
            + self.signal_changes
            + self.added_connections
            + self.removed_connections
    }
}

impl StateDiff {
    /// True iff any category is non-empty
    #[must_use]
    pub fn has_changes(&self) -> bool {
        !(self.added_nodes.is_empty()
            && self.removed_nodes.is_empty()
            && self.state_changes.is_empty()
            && self.signal_changes.is_empty()
            && self.added_connections.is_empty()
            && self.removed_connections.is_empty())
    }

    /// Counts per category
    #[must_use]
    pub fn summary(&self) -> DiffSummary {
        DiffSummary {
            added_nodes: self.added_nodes.len(),
            removed_nodes: self.removed_nodes.len(),
            state_changes: self.state_changes.len(),
            signal_changes: self.signal_changes.len(),
            added_connections: self.added_connections.len(),
            removed_connections: self.removed_connections.len(),
        }
    }
}

/// Compare two snapshots. Neither argument is modified.
#[must_use]
pub fn diff_state(before: &CircuitStateSnapshot, after: &CircuitStateSnapshot) -> StateDiff {
    let before_nodes: BTreeMap<&NodeId, _> = before.circuit.nodes.iter().map(|n| (&n.id, n)).collect();
    let after_nodes: BTreeMap<&NodeId, _> = after.circuit.nodes.iter().map(|n| (&n.id, n)).collect();

    let mut diff = StateDiff::default();

    for (id, node) in &after_nodes {
        match before_nodes.get(id) {
            None => diff.added_nodes.push((*id).clone()),
            Some(old) => {
                let keys: BTreeSet<&String> = old.state.keys().chain(node.state.keys()).collect();
                for key in keys {
                    let (was, now) = (old.state.get(key), node.state.get(key));
                    if !same_value(was, now) {
                        diff.state_changes.push(StateChange {
                            node_id: (*id).clone(),
                            key: key.clone(),
                            old: was.cloned(),
                            new: now.cloned(),
                        });
                    }
                }
            }
        }
    }
    diff.removed_nodes = before_nodes
        .keys()
        .filter(|id| !after_nodes.contains_key(*id))
        .map(|id| (*id).clone())
        .collect();

    diff.signal_changes = diff_signals(&before.signals, &after.signals);

    let before_keys: BTreeSet<String> = before.circuit.connections.iter().map(|c| c.key()).collect();
    let after_keys: BTreeSet<String> = after.circuit.connections.iter().map(|c| c.key()).collect();
    diff.added_connections = after_keys.difference(&before_keys).cloned().collect();
    diff.removed_connections = before_keys.difference(&after_keys).cloned().collect();

    diff
}

/// Deep equality as the state hash sees it: `1` and `1.0` are equal, `1` and
/// `true` are not
fn same_value(a: Option<&Value>, b: Option<&Value>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => CanonicalValue::from(a) == CanonicalValue::from(b),
        (None, None) => true,
        _ => false,
    }
}

fn diff_signals(
    before: &BTreeMap<NodeId, PortValues>,
    after: &BTreeMap<NodeId, PortValues>,
) -> Vec<SignalChange> {
    let empty = PortValues::new();
    let nodes: BTreeSet<&NodeId> = before.keys().chain(after.keys()).collect();
    let mut changes = Vec::new();
    for node_id in nodes {
        let was = before.get(node_id).unwrap_or(&empty);
        let now = after.get(node_id).unwrap_or(&empty);
        let ports: BTreeSet<&String> = was.keys().chain(now.keys()).collect();
        for port in ports {
            let (old, new) = (was.get(port).copied(), now.get(port).copied());
            if old != new {
                changes.push(SignalChange {
                    node_id: node_id.clone(),
                    port: port.clone(),
                    old,
                    new,
                });
            }
        }
    }
    changes
}

fn show_value(value: Option<&Value>) -> String {
    value.map_or_else(|| "-".to_string(), Value::to_string)
}

fn show_level(value: Option<LogicValue>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

impl fmt::Display for StateDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.has_changes() {
            return writeln!(f, "no changes");
        }
        for id in &self.added_nodes {
            writeln!(f, "+ node {}", id)?;
        }
        for id in &self.removed_nodes {
            writeln!(f, "- node {}", id)?;
        }
        for change in &self.state_changes {
            writeln!(
                f,
                "~ state {}.{}: {} -> {}",
                change.node_id,
                change.key,
                show_value(change.old.as_ref()),
                show_value(change.new.as_ref())
            )?;
        }
        for change in &self.signal_changes {
            writeln!(
                f,
                "~ signal {}.{}: {} -> {}",
                change.node_id,
                change.port,
                show_level(change.old),
                show_level(change.new)
            )?;
        }
        for key in &self.added_connections {
            writeln!(f, "+ wire {}", key)?;
        }
        for key in &self.removed_connections {
            writeln!(f, "- wire {}", key)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;
    use silica_core::{Circuit, Node};

    fn snapshot(circuit: Circuit, signals: &[(&str, &str, LogicValue)]) -> CircuitStateSnapshot {
        let mut map = BTreeMap::<NodeId, PortValues>::new();
        for (node, port, value) in signals {
            map.entry(NodeId::from(*node))
                .or_default()
                .insert((*port).to_string(), *value);
        }
        CircuitStateSnapshot {
            circuit,
            signals: map,
            event_index: 0,
            total_events: 1,
        }
    }

    #[test]
    fn test_identical_no_changes() {
        let s = snapshot(
            Circuit::new().with_node(Node::new("a", "Switch").with_state("isOn", true)),
            &[("a", "out", LogicValue::High)],
        );
        let diff = diff_state(&s, &s);
        assert!(!diff.has_changes());
        assert_eq!(diff.summary().total(), 0);
        assert_eq!(diff.to_string(), "no changes\n");
    }

    #[test]
    fn test_every_category() {
        let before = snapshot(
            Circuit::new()
                .with_node(Node::new("a", "Switch").with_state("isOn", false))
                .with_node(Node::new("gone", "Lamp"))
                .connect("a", "out", "gone", "in"),
            &[("a", "out", LogicValue::Low), ("gone", "out", LogicValue::Low)],
        );
        let after = snapshot(
            Circuit::new()
                .with_node(Node::new("a", "Switch").with_state("isOn", true))
                .with_node(Node::new("new", "Lamp"))
                .connect("a", "out", "new", "in"),
            &[("a", "out", LogicValue::High)],
        );
        let before_copy = before.clone();
        let diff = diff_state(&before, &after);
        assert_eq!(before, before_copy);

        assert_eq!(diff.added_nodes, vec![NodeId::from("new")]);
        assert_eq!(diff.removed_nodes, vec![NodeId::from("gone")]);
        assert_eq!(diff.state_changes.len(), 1);
        assert_eq!(diff.state_changes[0].old, Some(json!(false)));
        assert_eq!(diff.state_changes[0].new, Some(json!(true)));
        assert_eq!(diff.signal_changes.len(), 2);
        assert_eq!(diff.added_connections, vec!["a:out:new:in".to_string()]);
        assert_eq!(diff.removed_connections, vec!["a:out:gone:in".to_string()]);

        let text = diff.to_string();
        assert!(text.contains("~ signal a.out: 0 -> 1"));
        assert!(text.contains("- wire a:out:gone:in"));
    }

    #[test]
    fn test_numeric_state_compared_by_value() {
        let before = snapshot(Circuit::new().with_node(Node::new("c", "Clock").with_state("tick", 1)), &[]);
        let after = snapshot(Circuit::new().with_node(Node::new("c", "Clock").with_state("tick", 1.0)), &[]);
        assert!(!diff_state(&before, &after).has_changes());

        let flag = snapshot(Circuit::new().with_node(Node::new("c", "Clock").with_state("tick", true)), &[]);
        assert_eq!(diff_state(&before, &flag).state_changes.len(), 1);
    }

    #[test]
    fn test_state_key_removed() {
        let before = snapshot(Circuit::new().with_node(Node::new("d", "Delay").with_state("buffer", json!([1]))), &[]);
        let after = snapshot(Circuit::new().with_node(Node::new("d", "Delay")), &[]);
        let diff = diff_state(&before, &after);
        assert_eq!(diff.state_changes[0].new, None);
    }

    proptest! {
        #[test]
        fn prop_self_diff_is_empty(ids in proptest::collection::btree_set("[a-z]{1,4}", 0..8), high in any::<bool>()) {
            let mut circuit = Circuit::new();
            let mut signals = Vec::new();
            let ids: Vec<String> = ids.into_iter().collect();
            for id in &ids {
                circuit = circuit.with_node(Node::new(id.as_str(), "Switch").with_state("isOn", high));
            }
            for pair in ids.windows(2) {
                circuit = circuit.connect(&pair[0], "out", &pair[1], "in");
            }
            for id in &ids {
                signals.push((id.as_str(), "out", LogicValue::from_bool(high)));
            }
            let s = snapshot(circuit, &signals);
            prop_assert!(!diff_state(&s, &s).has_changes());
        }
    }
}
