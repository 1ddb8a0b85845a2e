//! SILICA Core Types
//!
//! This crate contains pure types and logic with no I/O: circuit documents,
//! logic values, content digests and the canonical state form used to hash them.
//! All types are serializable with stable, cross-platform encoding.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod canonical;
pub mod circuit;
pub mod error;
pub mod hash;
pub mod id;
pub mod share;
pub mod value;

// Re-exports
pub use canonical::{
    CanonicalCircuit, CanonicalEncode, CanonicalRuntimeState, CanonicalValue, hash_circuit_state,
    hash_circuit_state_with, hash_runtime_state, hash_runtime_state_with, normalize_circuit_state,
    normalize_runtime_state,
};
pub use circuit::{CIRCUIT_VERSION, Circuit, Connection, Node, PortRef, Position};
pub use error::{CoreError, CoreResult};
pub use hash::{DigestAlgorithm, Hash, HashError, StateHash};
pub use id::NodeId;
pub use share::{SHARE_PREFIX, decode_circuit, decode_share, encode_circuit, encode_share};
pub use value::{LogicValue, NodeConfig, NodeState, PortValues, SignalMap};
