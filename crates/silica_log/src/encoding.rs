//! EventLog JSON codec.
//!
//! Schema v1: `{"version": 1, "events": [...], "metadata": {...}?}`.
//! Decoding is strict about the envelope and about the four known event
//! kinds, and lenient about event types it does not know.

use crate::error::{LogError, LogResult};
use crate::event::{Event, json_kind};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use silica_core::Circuit;

/// Event log schema version understood by this build
pub const EVENT_LOG_VERSION: u32 = 1;

/// Session metadata
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogMetadata {
    /// Random per-session id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    /// RFC 3339
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    /// Human-readable label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Any other host-defined keys
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl LogMetadata {
    /// Fresh metadata: random session id, creation time now
    #[must_use]
    pub fn new_session() -> Self {
        Self {
            session_id: Some(uuid::Uuid::new_v4().to_string()),
            created_at: Some(chrono::Utc::now().to_rfc3339()),
            title: None,
            extra: Map::new(),
        }
    }

    /// Set title
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

/// A recorded session
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventLog {
    /// Schema version, always [`EVENT_LOG_VERSION`] once decoded
    pub version: u32,
    /// Events in recording order
    pub events: Vec<Event>,
    /// Session information, omitted when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<LogMetadata>,
}

impl EventLog {
    /// Create an empty v1 log
    #[must_use]
    pub fn new() -> Self {
        Self {
            version: EVENT_LOG_VERSION,
            events: Vec::new(),
            metadata: None,
        }
    }

    /// Create from events
    #[must_use]
    pub fn from_events(events: Vec<Event>) -> Self {
        Self {
            events,
            ..Self::new()
        }
    }

    /// Attach metadata
    #[must_use]
    pub fn with_metadata(mut self, metadata: LogMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Append an event
    pub fn push(&mut self, event: Event) {
        self.events.push(event);
    }

    /// Number of events
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Check if empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Event at `index`
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Event> {
        self.events.get(index)
    }

    /// Circuit of the leading `circuit_loaded` event
    #[must_use]
    pub fn initial_circuit(&self) -> Option<&Circuit> {
        self.events.first().and_then(Event::loaded_circuit)
    }

    /// Decode from a JSON value
    ///
    /// # Errors
    ///
    /// See [`decode_event_log`]
    pub fn from_value(value: Value) -> LogResult<Self> {
        let mut map = match value {
            Value::Object(map) => map,
            other => {
                return Err(LogError::NotAnObject {
                    found: json_kind(&other).to_string(),
                });
            }
        };

        let version = map.get("version").ok_or_else(|| LogError::MissingField {
            field: "version".to_string(),
        })?;
        match version.as_u64() {
            Some(v) if v == u64::from(EVENT_LOG_VERSION) => {}
            _ => {
                return Err(LogError::UnsupportedVersion {
                    found: version.to_string(),
                });
            }
        }

        let events = match map.remove("events") {
            Some(Value::Array(items)) => items,
            Some(other) => {
                return Err(LogError::InvalidField {
                    field: "events".to_string(),
                    reason: format!("expected an array, got {}", json_kind(&other)),
                });
            }
            None => {
                return Err(LogError::MissingField {
                    field: "events".to_string(),
                });
            }
        };
        let events = events
            .into_iter()
            .enumerate()
            .map(|(index, raw)| {
                Event::from_json(raw).map_err(|reason| LogError::InvalidEvent { index, reason })
            })
            .collect::<LogResult<Vec<_>>>()?;

        let metadata = match map.remove("metadata") {
            None | Some(Value::Null) => None,
            Some(raw) => Some(serde_json::from_value(raw).map_err(|e| LogError::InvalidField {
                field: "metadata".to_string(),
                reason: e.to_string(),
            })?),
        };

        Ok(Self {
            version: EVENT_LOG_VERSION,
            events,
            metadata,
        })
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new()
    }
}

impl<'de> Deserialize<'de> for EventLog {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(value).map_err(serde::de::Error::custom)
    }
}

/// Decode an event log from JSON text
///
/// # Errors
///
/// Returns error if the text is not JSON, is not an object, declares a version
/// other than 1, has a non-array `events`, or any known event is malformed
/// (the error names its index)
pub fn decode_event_log(json: &str) -> LogResult<EventLog> {
    let value: Value = serde_json::from_str(json).map_err(|e| LogError::InvalidJson {
        message: e.to_string(),
    })?;
    EventLog::from_value(value)
}

/// Encode an event log as compact JSON
///
/// # Errors
///
/// Returns error if an event cannot be represented (non-finite timestamp)
pub fn encode_event_log(log: &EventLog) -> LogResult<String> {
    serde_json::to_string(log).map_err(|e| LogError::Encoding {
        message: e.to_string(),
    })
}

/// Encode an event log as indented JSON
///
/// # Errors
///
/// Returns error if an event cannot be represented (non-finite timestamp)
pub fn encode_event_log_pretty(log: &EventLog) -> LogResult<String> {
    serde_json::to_string_pretty(log).map_err(|e| LogError::Encoding {
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use silica_core::{LogicValue, Node};

    fn sample() -> EventLog {
        let circuit = Circuit::new()
            .with_node(Node::new("a", "Switch"))
            .with_node(Node::new("l", "Lamp"))
            .connect("a", "out", "l", "in");
        let mut partial = serde_json::Map::new();
        partial.insert("isOn".to_string(), json!(true));
        EventLog::from_events(vec![
            Event::circuit_loaded(0.0, circuit),
            Event::input_toggled(1.0, "a", "out", LogicValue::High),
            Event::simulation_tick(2.0, 0, 16.0),
            Event::node_state_modified(3.0, "a", partial),
        ])
        .with_metadata(LogMetadata::new_session().with_title("demo"))
    }

    #[test]
    fn test_roundtrip_exact() {
        let log = sample();
        let text = encode_event_log(&log).unwrap();
        let back = decode_event_log(&text).unwrap();
        assert_eq!(back, log);
        assert_eq!(encode_event_log(&back).unwrap(), text);
    }

    #[test]
    fn test_metadata_extra_keys_kept() {
        let text = r#"{"version":1,"events":[],"metadata":{"sessionId":"s1","app":"bench"}}"#;
        let log = decode_event_log(text).unwrap();
        let meta = log.metadata.as_ref().unwrap();
        assert_eq!(meta.session_id.as_deref(), Some("s1"));
        assert_eq!(meta.extra["app"], "bench");
        assert_eq!(encode_event_log(&log).unwrap(), text);
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            decode_event_log("{not json"),
            Err(LogError::InvalidJson { .. })
        ));
    }

    #[test]
    fn test_non_object() {
        assert!(matches!(decode_event_log("[1]"), Err(LogError::NotAnObject { .. })));
    }

    #[test]
    fn test_unsupported_version() {
        let err = decode_event_log(r#"{"version":2,"events":[]}"#).unwrap_err();
        assert_eq!(err, LogError::UnsupportedVersion { found: "2".to_string() });
    }

    #[test]
    fn test_events_not_array() {
        let err = decode_event_log(r#"{"version":1,"events":{}}"#).unwrap_err();
        assert!(matches!(err, LogError::InvalidField { ref field, .. } if field == "events"));
    }

    #[test]
    fn test_malformed_event_names_index() {
        let text = r#"{"version":1,"events":[
            {"type":"simulation_tick","timestamp":0,"tickIndex":0,"dt":1},
            {"type":"input_toggled","timestamp":1,"nodeId":"a"}
        ]}"#;
        let err = decode_event_log(text).unwrap_err();
        assert!(matches!(err, LogError::InvalidEvent { index: 1, .. }));
    }

    #[test]
    fn test_unknown_event_type_decodes() {
        let text = r#"{"version":1,"events":[{"type":"future_thing","timestamp":1.5,"x":true}]}"#;
        let log = decode_event_log(text).unwrap();
        assert_eq!(log.events[0].type_name(), "future_thing");
        assert_eq!(
            encode_event_log(&log).unwrap(),
            r#"{"version":1,"events":[{"timestamp":1.5,"type":"future_thing","x":true}]}"#
        );
    }

    #[test]
    fn test_initial_circuit() {
        assert!(sample().initial_circuit().is_some());
        assert!(EventLog::new().initial_circuit().is_none());
    }
}
