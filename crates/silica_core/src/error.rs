//! Core error types for SILICA.

use std::fmt;

/// Core result type
pub type CoreResult<T> = Result<T, CoreError>;

/// Core error type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Input could not be parsed (malformed JSON, base64 or deflate stream)
    ParseError {
        /// Error message
        message: String,
    },

    /// Canonical encoding failed
    Encoding {
        /// Error message
        message: String,
    },

    /// Document declares a schema version this build does not understand
    UnsupportedVersion {
        /// Document kind
        kind: String,
        /// Value encountered
        found: String,
    },

    /// Validation error
    Validation {
        /// Offending field
        field: String,
        /// Why it failed
        reason: String,
    },

    /// Two nodes in one circuit share an id
    DuplicateNode {
        /// Repeated node id
        id: String,
    },

    /// Not found
    NotFound {
        /// Kind of object
        kind: String,
        /// Identifier looked up
        id: String,
    },

    /// Invalid hash format
    InvalidHash {
        /// Why it failed
        reason: String,
    },

    /// Internal error (for unexpected errors)
    Internal {
        /// Error message
        message: String,
    },
}

impl CoreError {
    /// Shorthand for a validation failure on `field`
    #[must_use]
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Shorthand for a missing node
    #[must_use]
    pub fn node_not_found(id: impl fmt::Display) -> Self {
        Self::NotFound {
            kind: "Node".to_string(),
            id: id.to_string(),
        }
    }

    /// Whether this error reports a missing entity
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ParseError { message } => write!(f, "Parse error: {}", message),
            Self::Encoding { message } => write!(f, "Encoding error: {}", message),
            Self::UnsupportedVersion { kind, found } => {
                write!(f, "Unsupported {} version: {} (expected 1)", kind, found)
            }
            Self::Validation { field, reason } => {
                write!(f, "Validation failed for {}: {}", field, reason)
            }
            Self::DuplicateNode { id } => write!(f, "Duplicate node id: {}", id),
            Self::NotFound { kind, id } => write!(f, "{} not found: {}", kind, id),
            Self::InvalidHash { reason } => write!(f, "Invalid hash: {}", reason),
            Self::Internal { message } => write!(f, "Internal error: {}", message),
        }
    }
}

impl std::error::Error for CoreError {}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::ParseError {
            message: err.to_string(),
        }
    }
}

impl From<postcard::Error> for CoreError {
    fn from(err: postcard::Error) -> Self {
        Self::Encoding {
            message: err.to_string(),
        }
    }
}
