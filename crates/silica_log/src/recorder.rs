//! Session recorder.
//!
//! Append-only. Every event is stamped from the recorder's clock; a clock
//! that steps backwards is clamped so timestamps never decrease. Nothing is
//! recorded before the first `circuit_loaded`, since a log must open with
//! one.

use crate::clock::{Clock, SystemClock};
use crate::encoding::{EventLog, LogMetadata};
use crate::event::{Event, EventKind};
use silica_core::{Circuit, LogicValue, NodeId, NodeState};

/// Records simulation events into an [`EventLog`]
#[derive(Debug)]
pub struct Recorder<C: Clock = SystemClock> {
    clock: C,
    log: EventLog,
    recording: bool,
    last_timestamp: Option<f64>,
}

impl Recorder<SystemClock> {
    /// Recorder on the wall clock, with fresh session metadata
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for Recorder<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> Recorder<C> {
    /// Recorder on a custom clock, with fresh session metadata
    #[must_use]
    pub fn with_clock(clock: C) -> Self {
        Self {
            clock,
            log: EventLog::new().with_metadata(LogMetadata::new_session()),
            recording: true,
            last_timestamp: None,
        }
    }

    /// Replace session metadata
    #[must_use]
    pub fn with_metadata(mut self, metadata: LogMetadata) -> Self {
        self.log.metadata = Some(metadata);
        self
    }

    /// Record a topology load. The circuit is deep-copied.
    pub fn record_circuit_loaded(&mut self, circuit: &Circuit) {
        self.append(EventKind::CircuitLoaded {
            circuit: circuit.clone(),
        });
    }

    /// Record an input toggle
    pub fn record_input_toggled(&mut self, node_id: impl Into<NodeId>, port_name: impl Into<String>, value: LogicValue) {
        self.append(EventKind::InputToggled {
            node_id: node_id.into(),
            port_name: port_name.into(),
            value,
        });
    }

    /// Record one tick
    pub fn record_tick(&mut self, tick_index: u64, dt: f64) {
        self.append(EventKind::SimulationTick { tick_index, dt });
    }

    /// Record an external state merge
    pub fn record_node_state_modified(&mut self, node_id: impl Into<NodeId>, partial_state: &NodeState) {
        self.append(EventKind::NodeStateModified {
            node_id: node_id.into(),
            partial_state: partial_state.clone(),
        });
    }

    fn append(&mut self, kind: EventKind) {
        if !self.recording {
            return;
        }
        if self.log.is_empty() && !matches!(kind, EventKind::CircuitLoaded { .. }) {
            tracing::warn!(event = kind.type_name(), "dropping event recorded before circuit_loaded");
            return;
        }

        let mut timestamp = self.clock.now_ms();
        if let Some(last) = self.last_timestamp {
            if timestamp < last {
                tracing::warn!(timestamp, last, "clock went backwards; clamping");
                timestamp = last;
            }
        }
        self.last_timestamp = Some(timestamp);
        self.log.push(Event::new(timestamp, kind));
    }

    /// Copy of everything recorded so far
    #[must_use]
    pub fn get_log(&self) -> EventLog {
        self.log.clone()
    }

    /// Consume the recorder, returning its log
    #[must_use]
    pub fn into_log(self) -> EventLog {
        self.log
    }

    /// Make every later record call a no-op
    pub fn stop(&mut self) {
        if self.recording {
            tracing::debug!(events = self.log.len(), "recorder stopped");
        }
        self.recording = false;
    }

    /// Whether `record_*` calls are captured
    #[must_use]
    pub fn is_recording(&self) -> bool {
        self.recording
    }

    /// Number of recorded events
    #[must_use]
    pub fn len(&self) -> usize {
        self.log.len()
    }

    /// Whether nothing was recorded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.log.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use silica_core::Node;

    fn circuit() -> Circuit {
        Circuit::new().with_node(Node::new("a", "Switch"))
    }

    #[test]
    fn test_records_in_order() {
        let clock = ManualClock::new(100.0);
        let mut recorder = Recorder::with_clock(clock.clone());
        recorder.record_circuit_loaded(&circuit());
        clock.advance(5.0);
        recorder.record_input_toggled("a", "out", LogicValue::High);
        clock.advance(5.0);
        recorder.record_tick(0, 5.0);

        let log = recorder.get_log();
        let types: Vec<&str> = log.events.iter().map(Event::type_name).collect();
        assert_eq!(types, vec!["circuit_loaded", "input_toggled", "simulation_tick"]);
        let stamps: Vec<f64> = log.events.iter().map(|e| e.timestamp).collect();
        assert_eq!(stamps, vec![100.0, 105.0, 110.0]);
        assert!(log.metadata.as_ref().and_then(|m| m.session_id.as_ref()).is_some());
    }

    #[test]
    fn test_get_log_is_a_copy() {
        let mut recorder = Recorder::with_clock(ManualClock::new(0.0));
        recorder.record_circuit_loaded(&circuit());
        let mut snapshot = recorder.get_log();
        snapshot.events.clear();
        assert_eq!(recorder.len(), 1);
    }

    #[test]
    fn test_circuit_deep_copied() {
        let mut recorder = Recorder::with_clock(ManualClock::new(0.0));
        let mut live = circuit();
        recorder.record_circuit_loaded(&live);
        live.nodes.clear();
        assert_eq!(recorder.get_log().initial_circuit().map(|c| c.nodes.len()), Some(1));
    }

    #[test]
    fn test_stop() {
        let mut recorder = Recorder::with_clock(ManualClock::new(0.0));
        recorder.record_circuit_loaded(&circuit());
        recorder.stop();
        recorder.record_tick(0, 1.0);
        assert!(!recorder.is_recording());
        assert_eq!(recorder.len(), 1);
    }

    #[test]
    fn test_events_before_load_dropped() {
        let mut recorder = Recorder::with_clock(ManualClock::new(0.0));
        recorder.record_tick(0, 1.0);
        assert!(recorder.is_empty());
    }

    #[test]
    fn test_regressing_clock_clamped() {
        let clock = ManualClock::new(50.0);
        let mut recorder = Recorder::with_clock(clock.clone());
        recorder.record_circuit_loaded(&circuit());
        clock.set(10.0);
        recorder.record_tick(0, 1.0);
        let log = recorder.into_log();
        assert_eq!(log.events[1].timestamp, 50.0);
    }
}
