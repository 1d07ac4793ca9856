//! Top-level sections and how each stored fragment lands in the document.

use serde_json::{Map, Value};

use crate::document::model::ServerConfig;

/// How a section's stored value is decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeStrategy {
    /// Into a typed struct; shape errors are rejected.
    Typed,
    /// Into opaque JSON; only syntax is checked.
    Fragment,
}

/// One fixed top-level branch of the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Document,
    Admin,
    Logging,
    Storage,
    Apps,
}

impl Section {
    /// Sections in fetch order. Later sections override earlier ones.
    pub const ALL: [Section; 5] = [
        Section::Document,
        Section::Admin,
        Section::Logging,
        Section::Storage,
        Section::Apps,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Section::Document => "config",
            Section::Admin => "config.admin",
            Section::Logging => "config.logging",
            Section::Storage => "config.storage",
            Section::Apps => "config.apps",
        }
    }

    pub fn strategy(self) -> DecodeStrategy {
        match self {
            Section::Document | Section::Admin | Section::Logging => DecodeStrategy::Typed,
            Section::Storage | Section::Apps => DecodeStrategy::Fragment,
        }
    }

    /// Decode `raw` into this section's slot of `doc`.
    ///
    /// `Document` replaces the whole skeleton, `Apps` merges app names into
    /// the existing map, every other section replaces its subtree.
    pub fn apply(self, doc: &mut ServerConfig, raw: &str) -> Result<(), serde_json::Error> {
        match self {
            Section::Document => *doc = serde_json::from_str(raw)?,
            Section::Admin => doc.admin = Some(serde_json::from_str(raw)?),
            Section::Logging => doc.logging = Some(serde_json::from_str(raw)?),
            Section::Storage => doc.storage = Some(serde_json::from_str::<Value>(raw)?),
            Section::Apps => {
                let apps: Map<String, Value> = serde_json::from_str(raw)?;
                doc.apps.get_or_insert_with(Map::new).extend(apps);
            }
        }
        Ok(())
    }
}
