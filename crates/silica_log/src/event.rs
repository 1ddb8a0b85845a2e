//! Log events.
//!
//! On the wire an event is a flat JSON object carrying `type`, `timestamp`
//! and the kind's own fields. Events of a type this build does not know are
//! kept verbatim as [`EventKind::Unrecognized`], so logs written by newer
//! builds survive a decode/encode round trip.

use serde::de::Error as _;
use serde::ser::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use silica_core::{Circuit, LogicValue, NodeId, NodeState};

/// What an event does
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    /// Topology replaced; must be the first event of a log
    CircuitLoaded {
        /// Deep copy of the circuit at load time
        circuit: Circuit,
    },
    /// An input was driven
    #[serde(rename_all = "camelCase")]
    InputToggled {
        /// Target node
        node_id: NodeId,
        /// Target port
        port_name: String,
        /// New level
        value: LogicValue,
    },
    /// One evaluator tick
    #[serde(rename_all = "camelCase")]
    SimulationTick {
        /// Host tick counter
        tick_index: u64,
        /// Host frame delta in ms; does not influence evaluation
        dt: f64,
    },
    /// External shallow merge into a node's state
    #[serde(rename_all = "camelCase")]
    NodeStateModified {
        /// Target node
        node_id: NodeId,
        /// Keys to overwrite
        partial_state: NodeState,
    },
    /// An event type this build does not know
    #[serde(skip)]
    Unrecognized {
        /// The `type` field as written
        event_type: String,
        /// Every other field except `timestamp`
        fields: Map<String, Value>,
    },
}

impl EventKind {
    /// Wire name of the event type
    #[must_use]
    pub fn type_name(&self) -> &str {
        match self {
            Self::CircuitLoaded { .. } => "circuit_loaded",
            Self::InputToggled { .. } => "input_toggled",
            Self::SimulationTick { .. } => "simulation_tick",
            Self::NodeStateModified { .. } => "node_state_modified",
            Self::Unrecognized { event_type, .. } => event_type,
        }
    }

    /// Whether `name` is one of the four known event types
    #[must_use]
    pub fn is_known_type(name: &str) -> bool {
        matches!(
            name,
            "circuit_loaded" | "input_toggled" | "simulation_tick" | "node_state_modified"
        )
    }
}

/// A timestamped log event
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// Milliseconds on the recorder's clock
    pub timestamp: f64,
    /// Payload
    pub kind: EventKind,
}

impl Event {
    /// Create an event
    #[must_use]
    pub fn new(timestamp: f64, kind: EventKind) -> Self {
        Self { timestamp, kind }
    }

    /// `circuit_loaded`
    #[must_use]
    pub fn circuit_loaded(timestamp: f64, circuit: Circuit) -> Self {
        Self::new(timestamp, EventKind::CircuitLoaded { circuit })
    }

    /// `input_toggled`
    #[must_use]
    pub fn input_toggled(
        timestamp: f64,
        node_id: impl Into<NodeId>,
        port_name: impl Into<String>,
        value: LogicValue,
    ) -> Self {
        Self::new(
            timestamp,
            EventKind::InputToggled {
                node_id: node_id.into(),
                port_name: port_name.into(),
                value,
            },
        )
    }

    /// `simulation_tick`
    #[must_use]
    pub fn simulation_tick(timestamp: f64, tick_index: u64, dt: f64) -> Self {
        Self::new(timestamp, EventKind::SimulationTick { tick_index, dt })
    }

    /// `node_state_modified`
    #[must_use]
    pub fn node_state_modified(timestamp: f64, node_id: impl Into<NodeId>, partial_state: NodeState) -> Self {
        Self::new(
            timestamp,
            EventKind::NodeStateModified {
                node_id: node_id.into(),
                partial_state,
            },
        )
    }

    /// Wire name of the event type
    #[must_use]
    pub fn type_name(&self) -> &str {
        self.kind.type_name()
    }

    /// Circuit carried by a `circuit_loaded` event
    #[must_use]
    pub fn loaded_circuit(&self) -> Option<&Circuit> {
        match &self.kind {
            EventKind::CircuitLoaded { circuit } => Some(circuit),
            _ => None,
        }
    }

    /// Convert to a flat JSON object
    ///
    /// # Errors
    ///
    /// Returns error if the payload cannot be represented as JSON
    pub fn to_json(&self) -> Result<Map<String, Value>, String> {
        let mut map = match &self.kind {
            EventKind::Unrecognized { event_type, fields } => {
                let mut map = fields.clone();
                map.insert("type".to_string(), Value::String(event_type.clone()));
                map
            }
            known => match serde_json::to_value(known).map_err(|e| e.to_string())? {
                Value::Object(map) => map,
                other => return Err(format!("event serialized to {}", json_kind(&other))),
            },
        };
        let timestamp = serde_json::Number::from_f64(self.timestamp)
            .ok_or_else(|| format!("timestamp {} is not finite", self.timestamp))?;
        map.insert("timestamp".to_string(), Value::Number(timestamp));
        Ok(map)
    }

    /// Parse a flat JSON object
    ///
    /// # Errors
    ///
    /// Returns a description of the first problem: non-object, missing or
    /// non-string `type`, missing or non-numeric `timestamp`, or a known type
    /// whose fields do not match
    pub fn from_json(value: Value) -> Result<Self, String> {
        let mut map = match value {
            Value::Object(map) => map,
            other => return Err(format!("expected an object, got {}", json_kind(&other))),
        };
        let event_type = match map.get("type") {
            Some(Value::String(s)) => s.clone(),
            Some(other) => return Err(format!("`type` must be a string, got {}", json_kind(other))),
            None => return Err("missing field `type`".to_string()),
        };
        let timestamp = match map.get("timestamp") {
            Some(v) => v
                .as_f64()
                .ok_or_else(|| format!("`timestamp` must be a number, got {}", json_kind(v)))?,
            None => return Err("missing field `timestamp`".to_string()),
        };

        if EventKind::is_known_type(&event_type) {
            map.remove("timestamp");
            let kind: EventKind =
                serde_json::from_value(Value::Object(map)).map_err(|e| e.to_string())?;
            return Ok(Self::new(timestamp, kind));
        }

        map.remove("type");
        map.remove("timestamp");
        Ok(Self::new(
            timestamp,
            EventKind::Unrecognized {
                event_type,
                fields: map,
            },
        ))
    }
}

impl Serialize for Event {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().map_err(S::Error::custom)?.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Event {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_json(value).map_err(D::Error::custom)
    }
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;
    use silica_core::Node;

    #[test]
    fn test_input_toggled_wire_shape() {
        let event = Event::input_toggled(12.5, "sw", "out", LogicValue::High);
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(
            json,
            json!({"type": "input_toggled", "timestamp": 12.5, "nodeId": "sw", "portName": "out", "value": 1})
        );
    }

    #[test]
    fn test_tick_wire_shape() {
        let event = Event::simulation_tick(3.0, 7, 16.6);
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["tickIndex"], 7);
        assert_eq!(json["dt"], 16.6);
        let back: Event = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn test_circuit_loaded_roundtrip() {
        let circuit = Circuit::new().with_node(Node::new("a", "Switch").with_state("isOn", true));
        let event = Event::circuit_loaded(0.0, circuit.clone());
        let back: Event = serde_json::from_value(serde_json::to_value(&event).unwrap()).unwrap();
        assert_eq!(back.loaded_circuit(), Some(&circuit));
    }

    #[test]
    fn test_unrecognized_preserved() {
        let raw = json!({"type": "marker_attached", "timestamp": 4, "marker": {"id": 9}});
        let event: Event = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(event.type_name(), "marker_attached");
        assert!(matches!(event.kind, EventKind::Unrecognized { .. }));
        assert_eq!(serde_json::to_value(&event).unwrap(), json!({"type": "marker_attached", "timestamp": 4.0, "marker": {"id": 9}}));
    }

    #[test]
    fn test_malformed_known_event() {
        let raw = json!({"type": "input_toggled", "timestamp": 1, "portName": "out", "value": 1});
        let err = Event::from_json(raw).unwrap_err();
        assert!(err.contains("nodeId"), "{}", err);
    }

    #[test]
    fn test_missing_timestamp() {
        let err = Event::from_json(json!({"type": "simulation_tick", "tickIndex": 0, "dt": 1})).unwrap_err();
        assert_eq!(err, "missing field `timestamp`");
    }

    #[test]
    fn test_non_object_event() {
        let err = Event::from_json(json!([1, 2])).unwrap_err();
        assert!(err.contains("an array"));
    }

    fn arb_kind() -> impl Strategy<Value = EventKind> {
        prop_oneof![
            ("[a-z]{1,6}", "[a-z]{1,4}", any::<bool>()).prop_map(|(node, port, on)| {
                EventKind::InputToggled {
                    node_id: NodeId::from(node),
                    port_name: port,
                    value: LogicValue::from_bool(on),
                }
            }),
            (any::<u64>(), 0.0f64..1000.0)
                .prop_map(|(tick_index, dt)| EventKind::SimulationTick { tick_index, dt }),
            ("[a-z]{1,6}", prop::collection::btree_map("[a-z]{1,4}", any::<i32>(), 0..4)).prop_map(
                |(node, keys)| EventKind::NodeStateModified {
                    node_id: NodeId::from(node),
                    partial_state: keys.into_iter().map(|(k, v)| (k, json!(v))).collect(),
                }
            ),
        ]
    }

    proptest! {
        #[test]
        fn prop_event_survives_json(timestamp in 0.0f64..1e12, kind in arb_kind()) {
            let event = Event::new(timestamp, kind);
            let map = event.to_json().unwrap();
            prop_assert_eq!(map.get("type").and_then(Value::as_str), Some(event.type_name()));
            let back = Event::from_json(Value::Object(map)).unwrap();
            prop_assert_eq!(back, event);
        }

        #[test]
        fn prop_unknown_type_keeps_fields(
            suffix in "[a-z]{1,8}",
            fields in prop::collection::btree_map("[a-z]{1,4}", any::<bool>(), 0..4),
        ) {
            let mut raw: Map<String, Value> = fields.into_iter().map(|(k, v)| (k, json!(v))).collect();
            raw.insert("type".to_string(), json!(format!("x_{}", suffix)));
            raw.insert("timestamp".to_string(), json!(2.5));
            let event = Event::from_json(Value::Object(raw.clone())).unwrap();
            prop_assert!(matches!(event.kind, EventKind::Unrecognized { .. }), "expected Unrecognized kind");
            prop_assert_eq!(event.to_json().unwrap(), raw);
        }
    }
}
