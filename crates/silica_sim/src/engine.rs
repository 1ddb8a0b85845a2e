//! Engine boundary used by replay, inspection and verification.
//!
//! Replay only needs to load a circuit, apply the three mutation events and
//! read back signals. Anything implementing [`SimulationEngine`] can be driven
//! from a log; [`EngineFactory`] creates one per replay.

use crate::config::EvaluatorConfig;
use crate::evaluator::Evaluator;
use crate::registry::Registry;
use silica_core::{Circuit, CoreResult, LogicValue, NodeState, SignalMap};
use std::sync::Arc;

/// A simulation engine driven by log events
pub trait SimulationEngine {
    /// Replace topology (`circuit_loaded` after the first event)
    ///
    /// # Errors
    ///
    /// Returns error if the circuit is rejected
    fn load_circuit(&mut self, circuit: Circuit) -> CoreResult<()>;

    /// Current circuit with live node state
    fn circuit(&self) -> &Circuit;

    /// Current signal cache
    fn signals(&self) -> &SignalMap;

    /// Apply an `input_toggled` event
    ///
    /// # Errors
    ///
    /// Returns error if the node does not exist
    fn toggle_input(&mut self, node_id: &str, port: &str, value: LogicValue) -> CoreResult<()>;

    /// Apply a `node_state_modified` event (shallow merge)
    ///
    /// # Errors
    ///
    /// Returns error if the node does not exist
    fn modify_node_state(&mut self, node_id: &str, partial: &NodeState) -> CoreResult<()>;

    /// Apply a `simulation_tick` event: exactly one tick, whatever `dt` says.
    /// Returns whether any signal changed.
    fn advance(&mut self, dt: f64, tick_index: u64) -> bool;
}

/// Creates engines seeded with a circuit
pub trait EngineFactory {
    /// Engine type produced
    type Engine: SimulationEngine;

    /// Build an engine over `circuit`
    ///
    /// # Errors
    ///
    /// Returns error if the circuit is rejected
    fn create(&self, circuit: Circuit) -> CoreResult<Self::Engine>;
}

impl<F, E> EngineFactory for F
where
    F: Fn(Circuit) -> CoreResult<E>,
    E: SimulationEngine,
{
    type Engine = E;

    fn create(&self, circuit: Circuit) -> CoreResult<E> {
        self(circuit)
    }
}

impl SimulationEngine for Evaluator {
    fn load_circuit(&mut self, circuit: Circuit) -> CoreResult<()> {
        self.set_circuit(circuit)
    }

    fn circuit(&self) -> &Circuit {
        Evaluator::circuit(self)
    }

    fn signals(&self) -> &SignalMap {
        self.get_all_signals()
    }

    fn toggle_input(&mut self, node_id: &str, port: &str, value: LogicValue) -> CoreResult<()> {
        Evaluator::toggle_input(self, node_id, port, value)
    }

    fn modify_node_state(&mut self, node_id: &str, partial: &NodeState) -> CoreResult<()> {
        self.merge_node_state(node_id, partial)
    }

    fn advance(&mut self, _dt: f64, tick_index: u64) -> bool {
        let changed = self.tick();
        tracing::trace!(tick_index, changed, "tick");
        changed
    }
}

/// Factory producing [`Evaluator`]s over a shared registry
#[derive(Debug, Clone)]
pub struct EvaluatorFactory {
    registry: Arc<Registry>,
    config: EvaluatorConfig,
}

impl EvaluatorFactory {
    /// Create with default config
    #[must_use]
    pub fn new(registry: Arc<Registry>) -> Self {
        Self {
            registry,
            config: EvaluatorConfig::default(),
        }
    }

    /// Factory over the built-in gates only
    #[must_use]
    pub fn builtin() -> Self {
        Self::new(Arc::new(Registry::with_builtins()))
    }

    /// Set config
    #[must_use]
    pub fn with_config(mut self, config: EvaluatorConfig) -> Self {
        self.config = config;
        self
    }

    /// Registry handed to every evaluator
    #[must_use]
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Config handed to every evaluator
    #[must_use]
    pub fn config(&self) -> &EvaluatorConfig {
        &self.config
    }
}

impl EngineFactory for EvaluatorFactory {
    type Engine = Evaluator;

    fn create(&self, circuit: Circuit) -> CoreResult<Evaluator> {
        Ok(Evaluator::new(Arc::clone(&self.registry), circuit)?.with_config(self.config.clone()))
    }
}
