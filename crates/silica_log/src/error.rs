//! Event log errors.

/// Result alias for log operations
pub type LogResult<T> = Result<T, LogError>;

/// Errors decoding, encoding or navigating an event log
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LogError {
    /// Not valid JSON
    #[error("invalid JSON: {message}")]
    InvalidJson {
        /// Error message
        message: String,
    },

    /// Top-level value is not an object
    #[error("event log must be a JSON object, got {found}")]
    NotAnObject {
        /// JSON kind found
        found: String,
    },

    /// Required field absent
    #[error("missing field `{field}`")]
    MissingField {
        /// Field name
        field: String,
    },

    /// Field present but malformed
    #[error("invalid field `{field}`: {reason}")]
    InvalidField {
        /// Field name
        field: String,
        /// Why it failed
        reason: String,
    },

    /// Log version other than 1
    #[error("unsupported event log version: {found} (expected 1)")]
    UnsupportedVersion {
        /// Value encountered
        found: String,
    },

    /// An event failed to decode
    #[error("invalid event at index {index}: {reason}")]
    InvalidEvent {
        /// Event index
        index: usize,
        /// Why it failed
        reason: String,
    },

    /// Position outside the log
    #[error("index {index} out of bounds for log of {len} events")]
    IndexOutOfBounds {
        /// Requested position
        index: usize,
        /// Number of events
        len: usize,
    },

    /// Serialization failed
    #[error("encoding error: {message}")]
    Encoding {
        /// Error message
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = LogError::InvalidEvent {
            index: 3,
            reason: "missing field `nodeId`".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "invalid event at index 3: missing field `nodeId`"
        );

        let err = LogError::UnsupportedVersion { found: "2".to_string() };
        assert!(err.to_string().contains("expected 1"));
    }
}
