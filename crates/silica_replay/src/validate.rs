//! Structural log validation. Nothing is executed.

use crate::error::{ReplayError, ReplayResult};
use silica_log::{EVENT_LOG_VERSION, EventKind, EventLog};

/// Check version, non-emptiness, that event 0 is `circuit_loaded`, and that
/// timestamps never decrease
///
/// # Errors
///
/// Returns the first violated rule
pub fn validate_event_log(log: &EventLog) -> ReplayResult<()> {
    if log.version != EVENT_LOG_VERSION {
        return Err(ReplayError::UnsupportedVersion { found: log.version });
    }
    let first = log.events.first().ok_or(ReplayError::EmptyLog)?;
    if !matches!(first.kind, EventKind::CircuitLoaded { .. }) {
        return Err(ReplayError::FirstEventNotCircuitLoaded {
            found: first.type_name().to_string(),
        });
    }
    for (index, pair) in log.events.windows(2).enumerate() {
        let (previous, current) = (pair[0].timestamp, pair[1].timestamp);
        if current < previous {
            return Err(ReplayError::TimestampRegression {
                index: index + 1,
                previous,
                current,
            });
        }
    }
    Ok(())
}
