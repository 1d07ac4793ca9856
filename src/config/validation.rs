//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Require a way to reach the database (host list or connection string)
//! - Keep the table prefix safe to splice into SQL text
//! - Validate value ranges (timeouts > 0, interval > 0)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AdapterConfig → Result<(), Vec<ValidationError>>
//! - Runs before any connection is opened

use thiserror::Error;

use crate::config::schema::{AdapterConfig, HOST_PLACEHOLDER};

const SSL_MODES: [&str; 6] = ["disable", "allow", "prefer", "require", "verify-ca", "verify-full"];

/// A single semantic problem in an [`AdapterConfig`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("either connection_string or hosts must be provided")]
    MissingHosts,

    #[error("connection_string contains {{host}} but no hosts are configured")]
    UnresolvedHostPlaceholder,

    #[error("table_name_prefix {0:?} must be a non-empty SQL identifier")]
    InvalidTablePrefix(String),

    #[error("unknown sslmode {0:?}")]
    InvalidSslMode(String),

    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}

/// Check an adapter configuration.
pub fn validate_config(config: &AdapterConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let has_hosts = config.hosts.split(',').any(|h| !h.trim().is_empty());
    if !has_hosts && config.connection_string.is_empty() {
        errors.push(ValidationError::MissingHosts);
    }
    if !has_hosts && config.connection_string.contains(HOST_PLACEHOLDER) {
        errors.push(ValidationError::UnresolvedHostPlaceholder);
    }

    if !is_identifier(&config.table_name_prefix) {
        errors.push(ValidationError::InvalidTablePrefix(config.table_name_prefix.clone()));
    }

    if config.connection_string.is_empty() && !SSL_MODES.contains(&config.sslmode.as_str()) {
        errors.push(ValidationError::InvalidSslMode(config.sslmode.clone()));
    }

    if config.query_timeout().is_zero() {
        errors.push(ValidationError::Zero("query_timeout"));
    }
    if config.refresh_interval == 0 {
        errors.push(ValidationError::Zero("refresh_interval"));
    }
    if config.max_connections == 0 {
        errors.push(ValidationError::Zero("max_connections"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
