//! Live-vs-replay verification.
//!
//! The live path drives an engine directly, the way a host does during a
//! session. The replay path goes through [`Replayer::run`]. Equal canonical
//! runtime hashes mean the log reproduces the session.

use crate::error::ReplayResult;
use crate::runner::Replayer;
use serde::{Deserialize, Serialize};
use silica_core::{Circuit, Hash, hash_runtime_state};
use silica_log::{EventKind, EventLog};
use silica_sim::{EngineFactory, SimulationEngine};

/// Outcome of [`verify_replay`]. Divergence is a result, not an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Verification {
    /// Hash of the live session's state
    pub live_hash: Hash,
    /// Hash of the state rebuilt from the log
    pub replay_hash: Hash,
    /// Whether the two hashes match
    pub equal: bool,
}

/// Run `log` twice, once live against a copy of `initial` and once through
/// the replayer, and compare canonical runtime hashes
///
/// # Errors
///
/// Returns error if the log is invalid, an engine cannot be built, or replay
/// fails outright
pub fn verify_replay<F: EngineFactory>(
    replayer: &Replayer<F>,
    initial: &Circuit,
    log: &EventLog,
) -> ReplayResult<Verification> {
    let mut live = replayer.factory().create(initial.clone())?;
    for (index, event) in log.events.iter().enumerate().skip(1) {
        let result = match &event.kind {
            EventKind::CircuitLoaded { circuit } => live.load_circuit(circuit.clone()),
            EventKind::InputToggled {
                node_id,
                port_name,
                value,
            } => live.toggle_input(node_id.as_str(), port_name, *value),
            EventKind::SimulationTick { tick_index, dt } => {
                live.advance(*dt, *tick_index);
                Ok(())
            }
            EventKind::NodeStateModified {
                node_id,
                partial_state,
            } => live.modify_node_state(node_id.as_str(), partial_state),
            EventKind::Unrecognized { .. } => Ok(()),
        };
        if let Err(e) = result {
            tracing::debug!(index, error = %e, "live action rejected");
        }
    }
    let live_hash = hash_runtime_state(live.circuit(), live.signals())?;

    let outcome = replayer.run(log)?;
    let replay_hash = hash_runtime_state(&outcome.circuit, outcome.engine.signals())?;

    let equal = live_hash == replay_hash;
    if !equal {
        tracing::warn!(live = %live_hash, replay = %replay_hash, "replay diverged from live session");
    }
    Ok(Verification {
        live_hash,
        replay_hash,
        equal,
    })
}
