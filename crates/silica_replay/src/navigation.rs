//! Time-travel session over one log.

use crate::error::{ReplayError, ReplayResult};
use crate::inspector::Inspector;
use crate::snapshot::CircuitStateSnapshot;
use crate::validate::validate_event_log;
use silica_core::Circuit;
use silica_log::{Cursor, EventLog, LogError};
use silica_sim::EngineFactory;

/// Navigates a recorded session event by event.
///
/// Holds the snapshot at the cursor. A failed move leaves both the cursor and
/// the snapshot where they were.
#[derive(Debug)]
pub struct TimeTravel<F> {
    inspector: Inspector<F>,
    initial: Circuit,
    log: EventLog,
    cursor: Cursor,
    current: CircuitStateSnapshot,
}

impl<F: EngineFactory> TimeTravel<F> {
    /// Open a session positioned at event 0
    ///
    /// # Errors
    ///
    /// Returns error if the log is invalid
    pub fn new(inspector: Inspector<F>, initial: Circuit, log: EventLog) -> ReplayResult<Self> {
        validate_event_log(&log)?;
        let current = inspector.get_state_at_index(&initial, &log, 0)?;
        let cursor = Cursor::new(log.len());
        Ok(Self {
            inspector,
            initial,
            log,
            cursor,
            current,
        })
    }

    /// Move to `index`
    ///
    /// # Errors
    ///
    /// Returns error if `index` is outside `[0, len - 1]` or replay fails
    pub fn jump_to_index(&mut self, index: usize) -> ReplayResult<&CircuitStateSnapshot> {
        let mut cursor = self.cursor;
        cursor.seek(index).map_err(|e| match e {
            LogError::IndexOutOfBounds { index, len } => ReplayError::IndexOutOfBounds { index, len },
            other => ReplayError::Log(other),
        })?;
        let snapshot = self
            .inspector
            .get_state_at_index(&self.initial, &self.log, index)?;
        self.cursor = cursor;
        self.current = snapshot;
        tracing::debug!(index, total = self.log.len(), "time travel");
        Ok(&self.current)
    }

    /// Move one event forward; `None` at the last event
    ///
    /// # Errors
    ///
    /// Returns error if replay fails
    pub fn step_forward(&mut self) -> ReplayResult<Option<&CircuitStateSnapshot>> {
        if !self.cursor.can_advance() {
            return Ok(None);
        }
        self.jump_to_index(self.cursor.pos() + 1).map(Some)
    }

    /// Move one event back; `None` at the first event
    ///
    /// # Errors
    ///
    /// Returns error if replay fails
    pub fn step_backward(&mut self) -> ReplayResult<Option<&CircuitStateSnapshot>> {
        if !self.cursor.can_retreat() {
            return Ok(None);
        }
        self.jump_to_index(self.cursor.pos() - 1).map(Some)
    }

    /// Move to event 0
    ///
    /// # Errors
    ///
    /// Returns error if replay fails
    pub fn jump_to_start(&mut self) -> ReplayResult<&CircuitStateSnapshot> {
        self.jump_to_index(0)
    }

    /// Move to the last event
    ///
    /// # Errors
    ///
    /// Returns error if replay fails
    pub fn jump_to_end(&mut self) -> ReplayResult<&CircuitStateSnapshot> {
        self.jump_to_index(self.log.len().saturating_sub(1))
    }

    /// Current event index
    #[must_use]
    pub fn position(&self) -> usize {
        self.cursor.pos()
    }

    /// Snapshot at the current index
    #[must_use]
    pub fn current(&self) -> &CircuitStateSnapshot {
        &self.current
    }

    /// Whether an event follows the current one
    #[must_use]
    pub fn can_step_forward(&self) -> bool {
        self.cursor.can_advance()
    }

    /// Whether an event precedes the current one
    #[must_use]
    pub fn can_step_backward(&self) -> bool {
        self.cursor.can_retreat()
    }

    /// The log being navigated
    #[must_use]
    pub fn log(&self) -> &EventLog {
        &self.log
    }

    /// Number of events
    #[must_use]
    pub fn len(&self) -> usize {
        self.log.len()
    }

    /// Always false: a session needs at least the leading `circuit_loaded`
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.log.is_empty()
    }
}
