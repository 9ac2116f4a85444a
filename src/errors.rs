//! Unified error type for the matching and deal engine.

use sea_orm::DbErr;
use thiserror::Error;

/// All errors surfaced by the crate.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration could not be read or parsed
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration problem
        message: String,
    },

    /// Bundled or configured fixture data could not be parsed
    #[error("Fixture error: {message}")]
    Fixture {
        /// Description of the fixture problem
        message: String,
    },

    /// The persistence layer rejected an operation
    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    /// Filesystem access failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A stored row could not be converted to or from JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A required environment variable was missing or malformed
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    /// A form field failed local validation; nothing was sent to the store
    #[error("Invalid {field}: {message}")]
    Validation {
        /// Name of the offending field
        field: &'static str,
        /// Human-readable reason
        message: String,
    },

    /// A deal stage outside the allowed vocabulary
    #[error("Invalid deal stage '{value}': expected one of lead, negotiation, contract, closed")]
    InvalidStage {
        /// The raw value as supplied by the caller
        value: String,
    },

    /// The referenced row does not exist
    #[error("{entity} '{id}' not found")]
    NotFound {
        /// Entity kind, e.g. `"supplier"`
        entity: &'static str,
        /// Identifier that was looked up
        id: String,
    },

    /// The caller's access context does not allow the mutation
    #[error("Not permitted to {action} with a read-only role")]
    Forbidden {
        /// The attempted action, e.g. `"update deal"`
        action: String,
    },
}

impl Error {
    /// Shorthand for a [`Error::Validation`] value.
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    /// Shorthand for a [`Error::NotFound`] value.
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
