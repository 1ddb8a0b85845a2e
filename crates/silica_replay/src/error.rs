//! Replay errors.

use silica_core::CoreError;
use silica_log::LogError;

/// Result alias for replay operations
pub type ReplayResult<T> = Result<T, ReplayError>;

/// Errors from validating, replaying or navigating a log
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ReplayError {
    /// Log version other than 1
    #[error("unsupported event log version: {found} (expected 1)")]
    UnsupportedVersion {
        /// Value encountered
        found: u32,
    },

    /// Log has no events
    #[error("event log is empty")]
    EmptyLog,

    /// Event 0 is not `circuit_loaded`
    #[error("first event must be circuit_loaded, found {found}")]
    FirstEventNotCircuitLoaded {
        /// Value encountered
        found: String,
    },

    /// A timestamp is lower than its predecessor
    #[error("timestamp decreases at event {index}: {current} < {previous}")]
    TimestampRegression {
        /// Event index
        index: usize,
        /// Timestamp of the preceding event
        previous: f64,
        /// Timestamp at `index`
        current: f64,
    },

    /// Event index outside `[0, len - 1]`
    #[error("event index {index} out of bounds for log of {len} events")]
    IndexOutOfBounds {
        /// Requested index
        index: usize,
        /// Number of events
        len: usize,
    },

    /// Event of an unknown type, with skipping disabled
    #[error("unknown event type `{event_type}` at index {index}")]
    UnknownEvent {
        /// Event index
        index: usize,
        /// Wire name of the event type
        event_type: String,
    },

    /// The engine rejected an event
    #[error("event {index} ({event_type}) failed: {source}")]
    EventFailed {
        /// Event index
        index: usize,
        /// Wire name of the event type
        event_type: String,
        /// Engine error
        #[source]
        source: CoreError,
    },

    /// Engine construction or hashing failed
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Log codec or cursor error
    #[error(transparent)]
    Log(#[from] LogError),
}

impl ReplayError {
    /// Whether the log itself is malformed, as opposed to an engine failure
    #[must_use]
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedVersion { .. }
                | Self::EmptyLog
                | Self::FirstEventNotCircuitLoaded { .. }
                | Self::TimestampRegression { .. }
        )
    }
}
