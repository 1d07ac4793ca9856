//! Configuration loading.

use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::config::schema::{AdapterConfig, DaemonConfig};
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Decode and validate an adapter configuration body (JSON).
///
/// Fields missing from the body keep their defaults.
pub fn parse_adapter_config(body: &[u8]) -> Result<AdapterConfig, ConfigError> {
    let config: AdapterConfig = serde_json::from_slice(body)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Load and validate daemon settings from a TOML or JSON file.
///
/// Files ending in `.json` are read as JSON, everything else as TOML.
pub fn load_config(path: &Path) -> Result<DaemonConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: DaemonConfig = match path.extension().and_then(|e| e.to_str()) {
        Some("json") => serde_json::from_str(&content)?,
        _ => toml::from_str(&content)?,
    };

    validate_config(&config.adapter).map_err(ConfigError::Validation)?;

    Ok(config)
}
