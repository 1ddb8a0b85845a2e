//! Logic values and the maps that carry them.

use crate::id::NodeId;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// Signal values keyed by port name
pub type PortValues = BTreeMap<String, LogicValue>;

/// Signal cache: node id -> port name -> value
pub type SignalMap = BTreeMap<NodeId, PortValues>;

/// Mutable per-node memory owned by the node's behavior
pub type NodeState = serde_json::Map<String, serde_json::Value>;

/// Immutable per-instance parameters
pub type NodeConfig = serde_json::Map<String, serde_json::Value>;

/// A binary logic level. Encoded as `0` / `1` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum LogicValue {
    /// 0
    #[default]
    Low,
    /// 1
    High,
}

impl LogicValue {
    /// Level from a boolean
    #[must_use]
    pub const fn from_bool(value: bool) -> Self {
        if value { Self::High } else { Self::Low }
    }

    /// Whether this is `High`
    #[must_use]
    pub const fn is_high(self) -> bool {
        matches!(self, Self::High)
    }

    /// `0` or `1`
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        match self {
            Self::Low => 0,
            Self::High => 1,
        }
    }

    /// Logical AND
    #[must_use]
    pub const fn and(self, other: Self) -> Self {
        Self::from_bool(self.is_high() && other.is_high())
    }

    /// Logical OR
    #[must_use]
    pub const fn or(self, other: Self) -> Self {
        Self::from_bool(self.is_high() || other.is_high())
    }

    /// Logical XOR
    #[must_use]
    pub const fn xor(self, other: Self) -> Self {
        Self::from_bool(self.is_high() != other.is_high())
    }

    /// Logical NOT
    #[must_use]
    pub const fn not(self) -> Self {
        Self::from_bool(!self.is_high())
    }

    /// Interpret a JSON value the way node state stores levels: `true`,
    /// non-zero numbers and `"1"` are high, everything else is low.
    #[must_use]
    pub fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Bool(b) => Self::from_bool(*b),
            serde_json::Value::Number(n) => Self::from_bool(n.as_f64().is_some_and(|v| v != 0.0)),
            serde_json::Value::String(s) => Self::from_bool(s == "1" || s == "true"),
            _ => Self::Low,
        }
    }
}

impl From<bool> for LogicValue {
    fn from(value: bool) -> Self {
        Self::from_bool(value)
    }
}

impl From<LogicValue> for bool {
    fn from(value: LogicValue) -> Self {
        value.is_high()
    }
}

impl TryFrom<u8> for LogicValue {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Low),
            1 => Ok(Self::High),
            other => Err(other),
        }
    }
}

impl fmt::Display for LogicValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u8())
    }
}

impl Serialize for LogicValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.as_u8())
    }
}

struct LogicValueVisitor;

impl Visitor<'_> for LogicValueVisitor {
    type Value = LogicValue;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a logic level: 0, 1, true or false")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<LogicValue, E> {
        Ok(LogicValue::from_bool(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<LogicValue, E> {
        match v {
            0 => Ok(LogicValue::Low),
            1 => Ok(LogicValue::High),
            _ => Err(E::invalid_value(de::Unexpected::Unsigned(v), &self)),
        }
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<LogicValue, E> {
        match v {
            0 => Ok(LogicValue::Low),
            1 => Ok(LogicValue::High),
            _ => Err(E::invalid_value(de::Unexpected::Signed(v), &self)),
        }
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<LogicValue, E> {
        if v == 0.0 {
            Ok(LogicValue::Low)
        } else if v == 1.0 {
            Ok(LogicValue::High)
        } else {
            Err(E::invalid_value(de::Unexpected::Float(v), &self))
        }
    }
}

impl<'de> Deserialize<'de> for LogicValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(LogicValueVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_boolean_ops() {
        let (l, h) = (LogicValue::Low, LogicValue::High);
        assert_eq!(h.and(h), h);
        assert_eq!(h.and(l), l);
        assert_eq!(l.or(h), h);
        assert_eq!(h.xor(h), l);
        assert_eq!(l.not(), h);
    }

    #[test]
    fn test_wire_format() {
        assert_eq!(serde_json::to_string(&LogicValue::High).unwrap(), "1");
        let v: LogicValue = serde_json::from_str("0").unwrap();
        assert_eq!(v, LogicValue::Low);
        let v: LogicValue = serde_json::from_str("true").unwrap();
        assert_eq!(v, LogicValue::High);
        assert!(serde_json::from_str::<LogicValue>("2").is_err());
    }

    #[test]
    fn test_from_json_truthiness() {
        assert!(LogicValue::from_json(&json!(true)).is_high());
        assert!(LogicValue::from_json(&json!(1)).is_high());
        assert!(!LogicValue::from_json(&json!(0)).is_high());
        assert!(!LogicValue::from_json(&json!(null)).is_high());
    }

    #[test]
    fn test_default_is_low() {
        assert_eq!(LogicValue::default(), LogicValue::Low);
    }
}
