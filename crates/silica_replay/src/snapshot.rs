//! Point-in-time snapshots of circuit and signal state.

use serde::{Deserialize, Serialize};
use silica_core::{Circuit, CoreError, CoreResult, Hash, SignalMap, hash_runtime_state};
use silica_sim::SimulationEngine;

/// Circuit and signals at one event index.
///
/// Owns deep copies: nothing in a snapshot aliases an engine or another
/// snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CircuitStateSnapshot {
    /// Topology and node state
    pub circuit: Circuit,
    /// Port levels
    pub signals: SignalMap,
    /// Index of the last applied event
    pub event_index: usize,
    /// Events in the log the snapshot was taken from
    pub total_events: usize,
}

impl CircuitStateSnapshot {
    /// Copy an engine's current state
    #[must_use]
    pub fn capture<E: SimulationEngine>(engine: &E, event_index: usize, total_events: usize) -> Self {
        Self {
            circuit: engine.circuit().clone(),
            signals: engine.signals().clone(),
            event_index,
            total_events,
        }
    }

    /// Canonical runtime hash of circuit plus signals
    ///
    /// # Errors
    ///
    /// Returns error if canonical encoding fails
    pub fn hash(&self) -> CoreResult<Hash> {
        hash_runtime_state(&self.circuit, &self.signals)
    }

    /// At the first event
    #[must_use]
    pub fn is_first(&self) -> bool {
        self.event_index == 0
    }

    /// At the last event
    #[must_use]
    pub fn is_last(&self) -> bool {
        self.event_index.saturating_add(1) >= self.total_events
    }

    /// Encode snapshot to bytes
    ///
    /// # Errors
    ///
    /// Returns error if encoding fails
    pub fn encode(&self) -> CoreResult<Vec<u8>> {
        serde_json::to_vec_pretty(self).map_err(|e| CoreError::Encoding {
            message: format!("Failed to encode snapshot: {}", e),
        })
    }

    /// Decode snapshot from bytes
    ///
    /// # Errors
    ///
    /// Returns error if decoding fails
    pub fn decode(data: &[u8]) -> CoreResult<Self> {
        serde_json::from_slice(data).map_err(|e| CoreError::ParseError {
            message: format!("Failed to decode snapshot: {}", e),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use silica_core::{LogicValue, Node};
    use silica_sim::{EngineFactory, EvaluatorFactory};

    fn engine() -> silica_sim::Evaluator {
        let circuit = Circuit::new()
            .with_node(Node::new("s", "Switch"))
            .with_node(Node::new("l", "Lamp"))
            .connect("s", "out", "l", "in");
        let mut engine = EvaluatorFactory::builtin().create(circuit).unwrap();
        engine.toggle_input("s", "out", LogicValue::High).unwrap();
        engine.tick();
        engine
    }

    #[test]
    fn test_snapshot_is_independent() {
        let mut engine = engine();
        let snapshot = CircuitStateSnapshot::capture(&engine, 2, 3);
        let mut edited = snapshot.clone();
        edited.circuit.nodes.clear();
        edited.signals.clear();

        assert_eq!(snapshot.circuit.nodes.len(), 2);
        engine.toggle_input("s", "out", LogicValue::Low).unwrap();
        assert_eq!(snapshot.signals["s"]["out"], LogicValue::High);
        assert!(snapshot.is_last());
    }

    #[test]
    fn test_snapshot_encode_decode() {
        let snapshot = CircuitStateSnapshot::capture(&engine(), 1, 4);
        let bytes = snapshot.encode().unwrap();
        let text = String::from_utf8(bytes.clone()).unwrap();
        assert!(text.contains("\"eventIndex\": 1"));
        let back = CircuitStateSnapshot::decode(&bytes).unwrap();
        assert_eq!(back, snapshot);
        assert_eq!(back.hash().unwrap(), snapshot.hash().unwrap());
    }

    #[test]
    fn test_decode_garbage() {
        assert!(CircuitStateSnapshot::decode(b"nope").is_err());
    }
}
