//! Inspector: state at any event index.
//!
//! Every call replays from scratch against a fresh engine. There is no cache,
//! so two calls at the same index always agree.

use crate::error::ReplayResult;
use crate::runner::Replayer;
use crate::snapshot::CircuitStateSnapshot;
use silica_core::Circuit;
use silica_log::EventLog;
use silica_sim::{EngineFactory, EvaluatorFactory};

/// Rebuilds snapshots from a log
#[derive(Debug, Clone)]
pub struct Inspector<F> {
    replayer: Replayer<F>,
}

impl Inspector<EvaluatorFactory> {
    /// Inspector over the built-in gates
    #[must_use]
    pub fn builtin() -> Self {
        Self::new(Replayer::builtin())
    }
}

impl<F: EngineFactory> Inspector<F> {
    /// Create from a replayer
    #[must_use]
    pub fn new(replayer: Replayer<F>) -> Self {
        Self { replayer }
    }

    /// Underlying replayer
    #[must_use]
    pub fn replayer(&self) -> &Replayer<F> {
        &self.replayer
    }

    /// Snapshot after events `0..=index`, with `initial` standing in for the
    /// leading `circuit_loaded`
    ///
    /// # Errors
    ///
    /// Returns error if the log is invalid or `index` is outside
    /// `[0, len - 1]`
    pub fn get_state_at_index(
        &self,
        initial: &Circuit,
        log: &EventLog,
        index: usize,
    ) -> ReplayResult<CircuitStateSnapshot> {
        let engine = self.replayer.replay_to(initial, log, index)?;
        Ok(CircuitStateSnapshot::capture(&engine, index, log.len()))
    }

    /// Snapshot at `current + 1`, or `None` at the last event
    ///
    /// # Errors
    ///
    /// Returns error if the log is invalid or replay fails
    pub fn step_forward(
        &self,
        initial: &Circuit,
        log: &EventLog,
        current: usize,
    ) -> ReplayResult<Option<CircuitStateSnapshot>> {
        if !can_step_forward(log, current) {
            return Ok(None);
        }
        self.get_state_at_index(initial, log, current + 1).map(Some)
    }

    /// Snapshot at `current - 1`, or `None` at the first event
    ///
    /// # Errors
    ///
    /// Returns error if the log is invalid, `current - 1` is out of bounds,
    /// or replay fails
    pub fn step_backward(
        &self,
        initial: &Circuit,
        log: &EventLog,
        current: usize,
    ) -> ReplayResult<Option<CircuitStateSnapshot>> {
        if !can_step_backward(current) {
            return Ok(None);
        }
        self.get_state_at_index(initial, log, current - 1).map(Some)
    }
}

/// Whether an event follows `current`
#[must_use]
pub fn can_step_forward(log: &EventLog, current: usize) -> bool {
    current.saturating_add(1) < log.len()
}

/// Whether an event precedes `current`
#[must_use]
pub fn can_step_backward(current: usize) -> bool {
    current > 0
}
