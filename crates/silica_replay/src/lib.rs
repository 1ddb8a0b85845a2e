//! SILICA Replay
//!
//! Deterministic reconstruction of simulation state from event logs:
//! structural validation, full and prefix replay, live-vs-replay verification
//! through canonical state hashes, snapshots at any event index, a
//! time-travel session over a log, and structural diffs between snapshots.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod diff;
pub mod error;
pub mod inspector;
pub mod navigation;
pub mod runner;
pub mod snapshot;
pub mod validate;
pub mod verify;

pub use diff::{DiffSummary, SignalChange, StateChange, StateDiff, diff_state};
pub use error::{ReplayError, ReplayResult};
pub use inspector::{Inspector, can_step_backward, can_step_forward};
pub use navigation::TimeTravel;
pub use runner::{ReplayConfig, ReplayOutcome, Replayer, run_replay};
pub use snapshot::CircuitStateSnapshot;
pub use validate::validate_event_log;
pub use verify::{Verification, verify_replay};
