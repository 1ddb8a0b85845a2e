//! SILICA Event Log
//!
//! Append-only record of everything that mutates a simulation: the initial
//! circuit, input toggles, ticks and external state edits. A log replayed
//! against the same engine reproduces the recorded session exactly.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod clock;
pub mod cursor;
pub mod encoding;
pub mod error;
pub mod event;
pub mod recorder;

pub use clock::{Clock, ManualClock, SystemClock};
pub use cursor::{Cursor, Direction};
pub use encoding::{
    EVENT_LOG_VERSION, EventLog, LogMetadata, decode_event_log, encode_event_log,
    encode_event_log_pretty,
};
pub use error::{LogError, LogResult};
pub use event::{Event, EventKind};
pub use recorder::Recorder;
