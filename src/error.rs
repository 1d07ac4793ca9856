//! Adapter error types.

use thiserror::Error;

use crate::config::ConfigError;
use crate::store::QueryError;

/// Errors surfaced by pool initialization, queries and document assembly.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// Missing or invalid adapter settings.
    #[error("invalid adapter configuration: {0}")]
    Configuration(#[from] ConfigError),

    /// Every configured host failed to open or to answer the probe.
    #[error("failed to connect to any database host ({attempted} attempted)")]
    NoReachableHost { attempted: usize },

    /// A query failed on every host of the pool.
    #[error("query failed on all database hosts after {attempts} attempts: {source}")]
    AllHostsFailed {
        attempts: usize,
        #[source]
        source: QueryError,
    },

    /// A stored section is not valid JSON for its target.
    #[error("error decoding section {section}: {source}")]
    SectionDecode {
        section: String,
        #[source]
        source: serde_json::Error,
    },

    /// A route row is not a valid route object.
    #[error("error decoding route for server {server}: {source}")]
    RouteDecode {
        server: String,
        #[source]
        source: serde_json::Error,
    },

    /// Creating the config table or its index failed.
    #[error("failed to create table: {0}")]
    SchemaCreation(#[source] QueryError),

    /// The assembled document could not be serialized.
    #[error("error encoding document: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Result type for adapter operations.
pub type Result<T> = std::result::Result<T, AdapterError>;
