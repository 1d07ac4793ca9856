//! The assembled server configuration document.
//!
//! Admin and logging are typed so malformed rows are rejected early; storage
//! and apps stay opaque JSON because their shape depends on modules the
//! server loads. Unknown fields inside the typed sections are kept.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Top-level configuration document.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct ServerConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin: Option<AdminSection>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logging: Option<LoggingSection>,

    /// Storage backend module, kept as raw JSON.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage: Option<Value>,

    /// App name → raw app configuration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apps: Option<Map<String, Value>>,
}

/// Admin endpoint settings.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct AdminSection {
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub disabled: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub listen: Option<String>,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub enforce_origin: bool,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub origins: Vec<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Logging settings: an optional sink plus named logs.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct LoggingSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sink: Option<Value>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub logs: BTreeMap<String, Value>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
