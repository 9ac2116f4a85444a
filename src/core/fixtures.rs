//! Sample records used when the store is unreachable or empty.

use crate::errors::{Error, Result};
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;
use tracing::debug;

const BUNDLED: &str = include_str!("../../fixtures/fixtures.toml");

/// Raw fixture rows per table, in their legacy field naming.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct FixtureSet {
    /// Client rows
    pub clients: Vec<Value>,
    /// Requirement rows
    pub requirements: Vec<Value>,
    /// Supplier rows
    pub suppliers: Vec<Value>,
    /// Supplier product rows
    pub products: Vec<Value>,
    /// Deal rows
    pub deals: Vec<Value>,
}

impl FixtureSet {
    /// The sample data compiled into the binary.
    ///
    /// # Errors
    /// Returns [`Error::Fixture`] if the embedded document does not parse.
    pub fn bundled() -> Result<Self> {
        Self::parse(BUNDLED)
    }

    /// Parses a fixture document.
    ///
    /// # Errors
    /// Returns [`Error::Fixture`] for invalid TOML or unexpected structure.
    pub fn parse(contents: &str) -> Result<Self> {
        toml::from_str(contents).map_err(|e| Error::Fixture {
            message: e.to_string(),
        })
    }

    /// Reads and parses a fixture file.
    ///
    /// # Errors
    /// Returns [`Error::Fixture`] if the file cannot be read or parsed.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading fixtures from {}", path.display());
        let contents = std::fs::read_to_string(path).map_err(|e| Error::Fixture {
            message: format!("Failed to read {}: {e}", path.display()),
        })?;
        Self::parse(&contents)
    }
}
