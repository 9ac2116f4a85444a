/// Application settings from config.toml
pub mod app;

/// Database configuration and connection management
pub mod database;

pub use app::{AppConfig, DealDefaults};
