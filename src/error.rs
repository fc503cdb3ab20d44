//! Unified error handling for the trainlog library.
//!
//! One error type covers all model operations, replacing mixed error
//! handling patterns (Option, stringly-typed errors, silent failures).

use std::fmt;

/// The three persisted entity kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EntityKind {
    Activity,
    Route,
    Trackdata,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Activity => "activity",
            EntityKind::Route => "route",
            EntityKind::Trackdata => "trackdata",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unified error type for trainlog operations.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// Unknown field name or malformed entity data
    #[error("validation failed: {message}")]
    Validation { message: String },

    /// Entity does not exist (or is not visible to the caller's account)
    #[error("{kind} {id} not found")]
    NotFound { kind: EntityKind, id: i64 },

    /// Attempted cross-account mutation
    #[error("{kind} {id} belongs to another account")]
    Authorization { kind: EntityKind, id: i64 },

    /// Storage error (statement or transaction failure)
    #[error("persistence error: {0}")]
    Persistence(#[from] rusqlite::Error),
}

impl ModelError {
    /// Shorthand for a validation error with a formatted message.
    pub fn validation(message: impl Into<String>) -> Self {
        ModelError::Validation {
            message: message.into(),
        }
    }
}

/// Result type alias for trainlog operations.
pub type Result<T> = std::result::Result<T, ModelError>;
