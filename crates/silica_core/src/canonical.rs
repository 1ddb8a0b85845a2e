//! Canonical state form and state hashing.
//!
//! Normalization removes every ordering-derived source of nondeterminism:
//! nodes are sorted by id, connections by their composite key, and every
//! config/state object becomes a list of `(key, value)` pairs sorted by key
//! (recursively), with every JSON value tagged by kind. The canonical form is
//! encoded with postcard, which is byte-stable, and then digested.

use crate::circuit::{Circuit, Node};
use crate::error::CoreResult;
use crate::hash::{DigestAlgorithm, Hash};
use crate::value::SignalMap;
use serde::Serialize;
use serde_json::{Number, Value};

/// Trait for canonical serialization
pub trait CanonicalEncode: Serialize {
    /// Encode to canonical bytes
    ///
    /// # Errors
    ///
    /// Returns error if the value cannot be encoded
    fn encode(&self) -> CoreResult<Vec<u8>> {
        Ok(postcard::to_allocvec(self)?)
    }

    /// Digest of the canonical bytes
    ///
    /// # Errors
    ///
    /// Returns error if the value cannot be encoded
    fn digest(&self, algorithm: DigestAlgorithm) -> CoreResult<Hash> {
        Ok(Hash::compute_with(algorithm, &self.encode()?))
    }
}

/// A JSON value in canonical form.
///
/// Every variant carries its own discriminant in the encoded bytes, so values
/// of different kinds never share an encoding. Records are key-sorted pairs.
/// Integral floats take the integer variant, making `1` and `1.0` the same
/// canonical value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum CanonicalValue {
    /// `null`
    Null,
    /// Boolean
    Bool(bool),
    /// Non-negative integer
    U64(u64),
    /// Negative integer
    I64(i64),
    /// Non-integral number
    F64(f64),
    /// String
    Str(String),
    /// Array, order kept
    Seq(Vec<CanonicalValue>),
    /// Object as `(key, value)` pairs sorted by key
    Pairs(Vec<(String, CanonicalValue)>),
}

impl CanonicalValue {
    /// Canonical record from `(key, value)` pairs in any order
    #[must_use]
    pub fn record<'a>(pairs: impl IntoIterator<Item = (&'a String, &'a Value)>) -> Self {
        let mut pairs: Vec<(String, Self)> = pairs
            .into_iter()
            .map(|(key, value)| (key.clone(), Self::from(value)))
            .collect();
        pairs.sort_by(|a, b| a.0.cmp(&b.0));
        Self::Pairs(pairs)
    }

    fn number(n: &Number) -> Self {
        if let Some(u) = n.as_u64() {
            return Self::U64(u);
        }
        if let Some(i) = n.as_i64() {
            return Self::I64(i);
        }
        match n.as_f64() {
            Some(f) => Self::float(f),
            None => Self::Str(n.to_string()),
        }
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn float(f: f64) -> Self {
        const U64_END: f64 = 18_446_744_073_709_551_616.0;
        const I64_START: f64 = -9_223_372_036_854_775_808.0;
        if f.fract() != 0.0 {
            Self::F64(f)
        } else if (0.0..U64_END).contains(&f) {
            Self::U64(f as u64)
        } else if (I64_START..0.0).contains(&f) {
            Self::I64(f as i64)
        } else {
            Self::F64(f)
        }
    }
}

impl From<&Value> for CanonicalValue {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(*b),
            Value::Number(n) => Self::number(n),
            Value::String(s) => Self::Str(s.clone()),
            Value::Array(items) => Self::Seq(items.iter().map(Self::from).collect()),
            Value::Object(map) => Self::record(map),
        }
    }
}

/// Canonical form of one node
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CanonicalNode {
    /// Node id
    pub id: String,
    /// Registry type tag
    pub node_type: String,
    /// `(x, y)`
    pub position: (f64, f64),
    /// Rotation in degrees
    pub rotation: f64,
    /// Config record
    pub config: CanonicalValue,
    /// State record
    pub state: CanonicalValue,
}

/// Canonical form of one connection
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CanonicalConnection {
    /// `from.nodeId:from.port:to.nodeId:to.port`
    pub key: String,
    /// `(node id, port)` of the driver
    pub from: (String, String),
    /// `(node id, port)` of the reader
    pub to: (String, String),
}

/// Canonical form of a circuit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CanonicalCircuit {
    /// Circuit schema version
    pub version: u32,
    /// Nodes sorted by id
    pub nodes: Vec<CanonicalNode>,
    /// Connections sorted by key
    pub connections: Vec<CanonicalConnection>,
}

impl CanonicalEncode for CanonicalCircuit {}

/// Canonical form of circuit plus signal cache
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CanonicalRuntimeState {
    /// Canonical circuit
    pub circuit: CanonicalCircuit,
    /// `(node id, [(port, level)])`, sorted by node id then port
    pub signals: Vec<(String, Vec<(String, u8)>)>,
}

impl CanonicalEncode for CanonicalRuntimeState {}

fn canonical_node(node: &Node) -> CanonicalNode {
    CanonicalNode {
        id: node.id.to_string(),
        node_type: node.node_type.clone(),
        position: (node.position.x, node.position.y),
        rotation: node.rotation,
        config: CanonicalValue::record(&node.config),
        state: CanonicalValue::record(&node.state),
    }
}

/// Normalize a circuit into its canonical form
#[must_use]
pub fn normalize_circuit_state(circuit: &Circuit) -> CanonicalCircuit {
    let mut nodes: Vec<CanonicalNode> = circuit.nodes.iter().map(canonical_node).collect();
    nodes.sort_by(|a, b| a.id.cmp(&b.id));

    let mut connections: Vec<CanonicalConnection> = circuit
        .connections
        .iter()
        .map(|c| CanonicalConnection {
            key: c.key(),
            from: (c.from.node_id.to_string(), c.from.port_name.clone()),
            to: (c.to.node_id.to_string(), c.to.port_name.clone()),
        })
        .collect();
    connections.sort_by(|a, b| a.key.cmp(&b.key));

    CanonicalCircuit {
        version: circuit.version,
        nodes,
        connections,
    }
}

/// Normalize circuit and signal cache together
#[must_use]
pub fn normalize_runtime_state(circuit: &Circuit, signals: &SignalMap) -> CanonicalRuntimeState {
    // BTreeMap iteration is already sorted by node id, then port.
    let signals = signals
        .iter()
        .map(|(node, ports)| {
            (
                node.to_string(),
                ports
                    .iter()
                    .map(|(port, level)| (port.clone(), level.as_u8()))
                    .collect(),
            )
        })
        .collect();

    CanonicalRuntimeState {
        circuit: normalize_circuit_state(circuit),
        signals,
    }
}

/// BLAKE3 digest of the canonical circuit
///
/// # Errors
///
/// Returns error if canonical encoding fails
pub fn hash_circuit_state(circuit: &Circuit) -> CoreResult<Hash> {
    hash_circuit_state_with(circuit, DigestAlgorithm::Blake3)
}

/// Digest of the canonical circuit with the chosen algorithm
///
/// # Errors
///
/// Returns error if canonical encoding fails
pub fn hash_circuit_state_with(circuit: &Circuit, algorithm: DigestAlgorithm) -> CoreResult<Hash> {
    normalize_circuit_state(circuit).digest(algorithm)
}

/// BLAKE3 digest of the canonical circuit and signal cache
///
/// # Errors
///
/// Returns error if canonical encoding fails
pub fn hash_runtime_state(circuit: &Circuit, signals: &SignalMap) -> CoreResult<Hash> {
    hash_runtime_state_with(circuit, signals, DigestAlgorithm::Blake3)
}

/// Digest of the canonical circuit and signal cache with the chosen algorithm
///
/// # Errors
///
/// Returns error if canonical encoding fails
pub fn hash_runtime_state_with(
    circuit: &Circuit,
    signals: &SignalMap,
    algorithm: DigestAlgorithm,
) -> CoreResult<Hash> {
    normalize_runtime_state(circuit, signals).digest(algorithm)
}
