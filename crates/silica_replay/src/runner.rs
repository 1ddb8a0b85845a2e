//! Replay runner: folds a log over a fresh engine.

use crate::error::{ReplayError, ReplayResult};
use crate::validate::validate_event_log;
use serde::{Deserialize, Serialize};
use silica_core::{Circuit, CoreError};
use silica_log::{Event, EventKind, EventLog};
use silica_sim::{EngineFactory, Evaluator, EvaluatorFactory, SimulationEngine};

/// Replay configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplayConfig {
    /// Maximum events to replay (0 = unlimited)
    pub max_events: usize,
    /// Log and skip events of unknown type instead of failing
    pub skip_unknown_events: bool,
    /// Log and skip events that target a node the circuit does not have
    pub skip_missing_nodes: bool,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            max_events: 0,
            skip_unknown_events: true,
            skip_missing_nodes: true,
        }
    }
}

/// Result of a full replay
#[derive(Debug)]
pub struct ReplayOutcome<E> {
    /// Final circuit, including node state
    pub circuit: Circuit,
    /// The engine after the last event
    pub engine: E,
    /// Events consumed, counting the leading `circuit_loaded`
    pub events_processed: usize,
}

/// Replays logs against engines from a factory
#[derive(Debug, Clone)]
pub struct Replayer<F> {
    factory: F,
    config: ReplayConfig,
}

impl Replayer<EvaluatorFactory> {
    /// Replayer over the built-in gates
    #[must_use]
    pub fn builtin() -> Self {
        Self::new(EvaluatorFactory::builtin())
    }
}

impl<F: EngineFactory> Replayer<F> {
    /// Create with default config
    #[must_use]
    pub fn new(factory: F) -> Self {
        Self {
            factory,
            config: ReplayConfig::default(),
        }
    }

    /// Set config
    #[must_use]
    pub fn with_config(mut self, config: ReplayConfig) -> Self {
        self.config = config;
        self
    }

    /// Engine factory
    #[must_use]
    pub fn factory(&self) -> &F {
        &self.factory
    }

    /// Config
    #[must_use]
    pub fn config(&self) -> &ReplayConfig {
        &self.config
    }

    /// Validate `log`, seed an engine with a copy of event 0's circuit, and
    /// apply every later event in order
    ///
    /// # Errors
    ///
    /// Returns error if the log is structurally invalid or an event fails
    pub fn run(&self, log: &EventLog) -> ReplayResult<ReplayOutcome<F::Engine>> {
        validate_event_log(log)?;
        let seed = log
            .initial_circuit()
            .ok_or(ReplayError::EmptyLog)?
            .clone();
        let mut engine = self.factory.create(seed)?;

        let limit = match self.config.max_events {
            0 => log.len(),
            max => max.min(log.len()),
        };
        for (index, event) in log.events.iter().enumerate().take(limit).skip(1) {
            self.apply_event(&mut engine, index, event)?;
        }
        tracing::debug!(events = limit, total = log.len(), "replay complete");

        Ok(ReplayOutcome {
            circuit: engine.circuit().clone(),
            engine,
            events_processed: limit,
        })
    }

    /// Engine state after events `0..=index`, with `initial` standing in for
    /// event 0
    ///
    /// # Errors
    ///
    /// Returns error if the log is invalid, `index` is out of bounds, or an
    /// event fails
    pub fn replay_to(&self, initial: &Circuit, log: &EventLog, index: usize) -> ReplayResult<F::Engine> {
        validate_event_log(log)?;
        if index >= log.len() {
            return Err(ReplayError::IndexOutOfBounds {
                index,
                len: log.len(),
            });
        }
        let mut engine = self.factory.create(initial.clone())?;
        for (i, event) in log.events.iter().enumerate().take(index + 1).skip(1) {
            self.apply_event(&mut engine, i, event)?;
        }
        Ok(engine)
    }

    /// Apply one event
    ///
    /// # Errors
    ///
    /// Returns error if the engine rejects the event and the config does not
    /// allow skipping it
    pub fn apply_event(&self, engine: &mut F::Engine, index: usize, event: &Event) -> ReplayResult<()> {
        let result = match &event.kind {
            EventKind::CircuitLoaded { circuit } => engine.load_circuit(circuit.clone()),
            EventKind::InputToggled {
                node_id,
                port_name,
                value,
            } => engine.toggle_input(node_id.as_str(), port_name, *value),
            EventKind::SimulationTick { tick_index, dt } => {
                engine.advance(*dt, *tick_index);
                Ok(())
            }
            EventKind::NodeStateModified {
                node_id,
                partial_state,
            } => engine.modify_node_state(node_id.as_str(), partial_state),
            EventKind::Unrecognized { event_type, .. } => {
                if self.config.skip_unknown_events {
                    tracing::warn!(index, event_type = %event_type, "skipping unknown event");
                    return Ok(());
                }
                return Err(ReplayError::UnknownEvent {
                    index,
                    event_type: event_type.clone(),
                });
            }
        };
        self.settle_result(index, event, result)
    }

    fn settle_result(&self, index: usize, event: &Event, result: Result<(), CoreError>) -> ReplayResult<()> {
        match result {
            Ok(()) => Ok(()),
            Err(e) if e.is_not_found() && self.config.skip_missing_nodes => {
                tracing::warn!(index, event_type = event.type_name(), error = %e, "skipping event");
                Ok(())
            }
            Err(source) => Err(ReplayError::EventFailed {
                index,
                event_type: event.type_name().to_string(),
                source,
            }),
        }
    }
}

/// Replay `log` over the built-in gates with default config
///
/// # Errors
///
/// Returns error if the log is structurally invalid or an event fails
pub fn run_replay(log: &EventLog) -> ReplayResult<ReplayOutcome<Evaluator>> {
    Replayer::builtin().run(log)
}

#[cfg(test)]
mod tests {
    use super::*;
    use silica_core::{LogicValue, Node};
    use silica_log::Event;

    fn and_circuit() -> Circuit {
        Circuit::new()
            .with_node(Node::new("a", "Switch"))
            .with_node(Node::new("b", "Switch"))
            .with_node(Node::new("g", "AND"))
            .connect("a", "out", "g", "a")
            .connect("b", "out", "g", "b")
    }

    fn session() -> EventLog {
        EventLog::from_events(vec![
            Event::circuit_loaded(0.0, and_circuit()),
            Event::input_toggled(1.0, "a", "out", LogicValue::High),
            Event::simulation_tick(2.0, 0, 16.0),
            Event::input_toggled(3.0, "b", "out", LogicValue::High),
            Event::simulation_tick(4.0, 1, 16.0),
        ])
    }

    #[test]
    fn test_run_replay() {
        let outcome = run_replay(&session()).unwrap();
        assert_eq!(outcome.events_processed, 5);
        assert_eq!(outcome.engine.get_signal("g", "out"), LogicValue::High);
        assert_eq!(outcome.circuit, *outcome.engine.circuit());
    }

    #[test]
    fn test_seed_is_a_copy() {
        let log = session();
        let before = log.clone();
        let _ = run_replay(&log).unwrap();
        assert_eq!(log, before);
    }

    #[test]
    fn test_max_events() {
        let replayer = Replayer::builtin().with_config(ReplayConfig {
            max_events: 3,
            ..ReplayConfig::default()
        });
        let outcome = replayer.run(&session()).unwrap();
        assert_eq!(outcome.events_processed, 3);
        assert_eq!(outcome.engine.get_signal("g", "out"), LogicValue::Low);
    }

    #[test]
    fn test_unknown_event_skipped_or_rejected() {
        let mut log = session();
        let raw = serde_json::json!({"type": "annotation", "timestamp": 5.0, "text": "hi"});
        log.push(serde_json::from_value(raw).unwrap());
        assert!(run_replay(&log).is_ok());

        let strict = Replayer::builtin().with_config(ReplayConfig {
            skip_unknown_events: false,
            ..ReplayConfig::default()
        });
        assert!(matches!(
            strict.run(&log),
            Err(ReplayError::UnknownEvent { index: 5, .. })
        ));
    }

    #[test]
    fn test_missing_node_skipped_or_rejected() {
        let mut log = session();
        log.push(Event::input_toggled(9.0, "ghost", "out", LogicValue::High));
        assert!(run_replay(&log).is_ok());

        let strict = Replayer::builtin().with_config(ReplayConfig {
            skip_missing_nodes: false,
            ..ReplayConfig::default()
        });
        assert!(matches!(
            strict.run(&log),
            Err(ReplayError::EventFailed { index: 5, .. })
        ));
    }

    #[test]
    fn test_replay_to_bounds() {
        let log = session();
        let err = Replayer::builtin()
            .replay_to(&and_circuit(), &log, 5)
            .unwrap_err();
        assert_eq!(err, ReplayError::IndexOutOfBounds { index: 5, len: 5 });
    }

    #[test]
    fn test_invalid_log_rejected() {
        let log = EventLog::from_events(vec![Event::simulation_tick(0.0, 0, 1.0)]);
        assert!(run_replay(&log).unwrap_err().is_structural());
    }
}
