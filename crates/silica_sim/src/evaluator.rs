//! The evaluator: topology, node state and the signal cache.
//!
//! A tick is synchronous. Every node reads the signal cache as it stood at the
//! end of the previous tick, nodes are evaluated in node-id order, and the
//! outputs of all nodes replace the cache together once the pass completes.
//! Node-id order matters only for behaviors with side effects; the signals a
//! tick produces do not depend on it.

use crate::behavior::{Behavior, Evaluation};
use crate::builtin::BuiltinGate;
use crate::composite::CompositeNodeDef;
use crate::config::{DriverPolicy, EvaluatorConfig};
use crate::registry::Registry;
use serde_json::Value;
use silica_core::{
    Circuit, CoreError, CoreResult, LogicValue, NodeId, NodeState, PortRef, PortValues, SignalMap,
};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Node state key holding a Switch/INPUT level
pub const IS_ON: &str = "isOn";

/// Evaluator over one circuit
#[derive(Debug, Clone)]
pub struct Evaluator {
    registry: Arc<Registry>,
    config: EvaluatorConfig,
    circuit: Circuit,
    signals: SignalMap,
    /// Nested evaluators of composite nodes, keyed by the composite's node id
    chips: BTreeMap<NodeId, Evaluator>,
    /// Node indices sorted by id
    order: Vec<usize>,
    /// Destination node -> indices of its incoming connections, circuit order
    incoming: BTreeMap<NodeId, Vec<usize>>,
    depth: usize,
    /// Forces the next tick to report a change
    stale: bool,
}

impl Evaluator {
    /// Create an evaluator with default config
    ///
    /// # Errors
    ///
    /// Returns error if the circuit fails validation
    pub fn new(registry: Arc<Registry>, circuit: Circuit) -> CoreResult<Self> {
        circuit.validate()?;
        Ok(Self::build(registry, circuit, EvaluatorConfig::default(), 0))
    }

    fn build(registry: Arc<Registry>, circuit: Circuit, config: EvaluatorConfig, depth: usize) -> Self {
        let mut evaluator = Self {
            registry,
            config,
            circuit,
            signals: SignalMap::new(),
            chips: BTreeMap::new(),
            order: Vec::new(),
            incoming: BTreeMap::new(),
            depth,
            stale: true,
        };
        evaluator.index();
        evaluator
    }

    /// Set config
    #[must_use]
    pub fn with_config(mut self, config: EvaluatorConfig) -> Self {
        self.config = config;
        self
    }

    fn index(&mut self) {
        let nodes = &self.circuit.nodes;
        let mut order: Vec<usize> = (0..nodes.len()).collect();
        order.sort_by(|a, b| nodes[*a].id.cmp(&nodes[*b].id));
        self.order = order;

        self.incoming.clear();
        for (i, conn) in self.circuit.connections.iter().enumerate() {
            self.incoming
                .entry(conn.to.node_id.clone())
                .or_default()
                .push(i);
        }
    }

    /// Replace the topology.
    ///
    /// Nodes whose id survives keep their current state; other nodes start
    /// with whatever state the new document gives them. Signals and nested
    /// evaluators of removed nodes are dropped, and the next tick reports a
    /// change.
    ///
    /// # Errors
    ///
    /// Returns error if the circuit fails validation; the evaluator is left
    /// unchanged in that case
    pub fn set_circuit(&mut self, mut circuit: Circuit) -> CoreResult<()> {
        circuit.validate()?;

        for node in &mut circuit.nodes {
            if let Some(old) = self.circuit.node(node.id.as_str()) {
                node.state = old.state.clone();
            }
        }

        self.signals.retain(|id, _| circuit.contains_node(id.as_str()));
        let old = std::mem::replace(&mut self.circuit, circuit);
        let circuit = &self.circuit;
        self.chips.retain(|id, _| {
            match (old.node(id.as_str()), circuit.node(id.as_str())) {
                (Some(before), Some(after)) => before.node_type == after.node_type,
                _ => false,
            }
        });

        self.index();
        self.stale = true;
        tracing::debug!(
            nodes = self.circuit.nodes.len(),
            connections = self.circuit.connections.len(),
            "circuit replaced"
        );
        Ok(())
    }

    /// Run one synchronous pass over every node.
    ///
    /// Returns whether any cached signal differs from the previous tick, or
    /// the cache was invalidated since.
    pub fn tick(&mut self) -> bool {
        let registry = Arc::clone(&self.registry);
        let order = std::mem::take(&mut self.order);
        let mut next = SignalMap::new();

        for &idx in &order {
            let inputs = self.gather_inputs(idx);
            let node = &self.circuit.nodes[idx];
            let behavior = match registry.get(&node.node_type) {
                Ok(behavior) => behavior,
                Err(e) => {
                    tracing::warn!(node = %node.id, error = %e, "skipping node");
                    continue;
                }
            };

            let evaluation = match behavior {
                Behavior::Builtin(gate) => gate.evaluate(&inputs, &node.state, &node.config),
                Behavior::Custom(custom) => custom.evaluate(&inputs, &node.state, &node.config),
                Behavior::Composite(def) => {
                    let id = node.id.clone();
                    let state = node.state.clone();
                    Evaluation::new(self.evaluate_chip(&id, def, &inputs), state)
                }
            };

            let node = &mut self.circuit.nodes[idx];
            node.state = evaluation.state;
            next.insert(node.id.clone(), evaluation.outputs);
        }

        self.order = order;
        let changed = std::mem::take(&mut self.stale) || next != self.signals;
        self.signals = next;
        changed
    }

    /// Tick until a tick reports no change or `max_iterations` ticks ran.
    /// Returns the number of ticks run.
    pub fn stabilize(&mut self, max_iterations: usize) -> usize {
        for iteration in 1..=max_iterations {
            if !self.tick() {
                tracing::trace!(iterations = iteration, depth = self.depth, "stable");
                return iteration;
            }
        }
        if max_iterations > 0 {
            tracing::warn!(
                iterations = max_iterations,
                depth = self.depth,
                "circuit did not stabilize; possible oscillation"
            );
        }
        max_iterations
    }

    /// Stabilize with the configured budget
    pub fn settle(&mut self) -> usize {
        self.stabilize(self.config.max_iterations)
    }

    fn signal_of(&self, port: &PortRef) -> LogicValue {
        self.signals
            .get(port.node_id.as_str())
            .and_then(|ports| ports.get(&port.port_name))
            .copied()
            .unwrap_or_default()
    }

    fn gather_inputs(&self, idx: usize) -> PortValues {
        let mut inputs = PortValues::new();
        let Some(connections) = self.incoming.get(&self.circuit.nodes[idx].id) else {
            return inputs;
        };
        for &ci in connections {
            let conn = &self.circuit.connections[ci];
            let value = self.signal_of(&conn.from);
            match self.config.driver_policy {
                DriverPolicy::WiredOr => {
                    let slot = inputs.entry(conn.to.port_name.clone()).or_default();
                    *slot = slot.or(value);
                }
                DriverPolicy::LastWriter => {
                    inputs.insert(conn.to.port_name.clone(), value);
                }
            }
        }
        inputs
    }

    fn evaluate_chip(&mut self, id: &NodeId, def: &CompositeNodeDef, inputs: &PortValues) -> PortValues {
        if self.depth >= self.config.max_composite_depth {
            tracing::warn!(
                node = %id,
                chip = %def.name,
                depth = self.depth,
                "composite nesting limit reached; chip produces no outputs"
            );
            return PortValues::new();
        }

        let registry = &self.registry;
        let config = &self.config;
        let depth = self.depth;
        let chip = self.chips.entry(id.clone()).or_insert_with(|| {
            tracing::debug!(node = %id, chip = %def.name, depth = depth + 1, "instantiating composite");
            Evaluator::build(Arc::clone(registry), def.circuit.clone(), config.clone(), depth + 1)
        });

        for (port, path) in &def.input_mapping {
            let level = inputs.get(port).copied().unwrap_or_default();
            chip.drive_input(path.node_id(), level);
        }
        chip.stabilize(self.config.max_iterations);

        def.output_mapping
            .iter()
            .map(|(port, path)| (port.clone(), chip.get_signal(path.node_id(), path.port())))
            .collect()
    }

    /// Set an inner Switch level, touching state only when it differs
    fn drive_input(&mut self, id: &str, level: LogicValue) {
        let Some(node) = self.circuit.node_mut(id) else {
            return;
        };
        let current = node.state.get(IS_ON).map(LogicValue::from_json).unwrap_or_default();
        if current != level || !node.state.contains_key(IS_ON) {
            node.state.insert(IS_ON.to_string(), Value::Bool(level.is_high()));
            self.stale = true;
        }
    }

    /// The whole signal cache
    #[must_use]
    pub fn get_all_signals(&self) -> &SignalMap {
        &self.signals
    }

    /// One cached signal; `Low` if never produced
    #[must_use]
    pub fn get_signal(&self, id: &str, port: &str) -> LogicValue {
        self.signals
            .get(id)
            .and_then(|ports| ports.get(port))
            .copied()
            .unwrap_or_default()
    }

    /// Overwrite one cached signal
    pub fn set_signal(&mut self, id: impl Into<NodeId>, port: impl Into<String>, value: LogicValue) {
        self.signals
            .entry(id.into())
            .or_default()
            .insert(port.into(), value);
    }

    /// Replace a node's state
    ///
    /// # Errors
    ///
    /// Returns error if the node does not exist
    pub fn set_node_state(&mut self, id: &str, state: NodeState) -> CoreResult<()> {
        let node = self
            .circuit
            .node_mut(id)
            .ok_or_else(|| CoreError::node_not_found(id))?;
        node.state = state;
        self.stale = true;
        Ok(())
    }

    /// Shallow-merge `partial` into a node's state
    ///
    /// # Errors
    ///
    /// Returns error if the node does not exist
    pub fn merge_node_state(&mut self, id: &str, partial: &NodeState) -> CoreResult<()> {
        let node = self
            .circuit
            .node_mut(id)
            .ok_or_else(|| CoreError::node_not_found(id))?;
        for (key, value) in partial {
            node.state.insert(key.clone(), value.clone());
        }
        self.stale = true;
        Ok(())
    }

    /// Drive an input. Switch/INPUT nodes record the level in their state;
    /// every node gets the level written straight into the signal cache so it
    /// is visible before the next tick.
    ///
    /// # Errors
    ///
    /// Returns error if the node does not exist
    pub fn toggle_input(&mut self, id: &str, port: &str, value: LogicValue) -> CoreResult<()> {
        let node = self
            .circuit
            .node_mut(id)
            .ok_or_else(|| CoreError::node_not_found(id))?;
        if BuiltinGate::is_input_type(&node.node_type) {
            node.state
                .insert(IS_ON.to_string(), Value::Bool(value.is_high()));
        }
        let node_id = node.id.clone();
        self.set_signal(node_id, port, value);
        self.stale = true;
        Ok(())
    }

    /// Current circuit, including live node state
    #[must_use]
    pub fn circuit(&self) -> &Circuit {
        &self.circuit
    }

    /// A node's live state
    #[must_use]
    pub fn node_state(&self, id: &str) -> Option<&NodeState> {
        self.circuit.node(id).map(|n| &n.state)
    }

    /// Nested evaluator of a composite node, once it has been evaluated
    #[must_use]
    pub fn chip(&self, id: &str) -> Option<&Evaluator> {
        self.chips.get(id)
    }

    /// Config
    #[must_use]
    pub fn config(&self) -> &EvaluatorConfig {
        &self.config
    }

    /// Registry
    #[must_use]
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Composite nesting depth; 0 for a top-level evaluator
    #[must_use]
    pub fn depth(&self) -> usize {
        self.depth
    }
}
