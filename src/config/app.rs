//! Application settings loaded from `config.toml`.
//!
//! Every key is optional. A missing file yields [`AppConfig::default`].

use crate::core::access::Role;
use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Top-level `config.toml` structure
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Role of the operator running this process
    pub role: Role,
    /// Fixture file to use instead of the bundled one
    pub fixtures_path: Option<PathBuf>,
    /// Defaults stamped onto synthesized deals
    pub deals: DealDefaults,
}

/// Commercial defaults for new deals
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DealDefaults {
    /// ISO currency code
    pub currency: String,
    /// Broker commission as a fraction
    pub commission_rate: f64,
}

impl Default for DealDefaults {
    fn default() -> Self {
        Self {
            currency: "USD".to_string(),
            commission_rate: 0.05,
        }
    }
}

/// Loads the application configuration from a TOML file.
///
/// # Errors
/// Returns an error if the file cannot be read or is not valid TOML.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path = path.as_ref();
    debug!("Loading configuration from {}", path.display());
    let contents = std::fs::read_to_string(path).map_err(|e| Error::Config {
        message: format!("Failed to read config file {}: {e}", path.display()),
    })?;

    toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse {}: {e}", path.display()),
    })
}

/// Loads `./config.toml`, falling back to defaults when the file is absent.
///
/// # Errors
/// Returns an error if the file exists but cannot be parsed.
pub fn load_default_config() -> Result<AppConfig> {
    let path = Path::new("config.toml");
    if !path.exists() {
        info!("No config.toml found, using default settings");
        return Ok(AppConfig::default());
    }
    load_config(path)
}
