//! Document assembly from config rows.
//!
//! # Responsibilities
//! - Fetch each top-level section and decode it into the skeleton
//! - Replace `http` server routes with their route rows when present
//! - Serialize the result
//!
//! # Design Decisions
//! - Sections are fetched independently; a missing one keeps the defaults
//! - Route rows are authoritative: any row replaces all inline routes of
//!   that server, no merging
//! - Any decode error aborts the whole attempt, nothing partial is returned

use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;

use crate::document::http::{routes_key, HttpApp, Route};
use crate::document::model::ServerConfig;
use crate::document::section::Section;
use crate::error::{AdapterError, Result};
use crate::observability::metrics;
use crate::store::{HostConnection, KvAccessor};

const HTTP_APP: &str = "http";

/// Builds [`ServerConfig`] documents from the config table.
#[derive(Debug)]
pub struct Assembler<C> {
    accessor: Arc<KvAccessor<C>>,
}

impl<C: HostConnection> Assembler<C> {
    pub fn new(accessor: Arc<KvAccessor<C>>) -> Self {
        Self { accessor }
    }

    pub fn accessor(&self) -> &Arc<KvAccessor<C>> {
        &self.accessor
    }

    /// Assemble and serialize the document.
    pub async fn assemble(&self) -> Result<Vec<u8>> {
        let start = Instant::now();
        let result = match self.assemble_document().await {
            Ok(doc) => serde_json::to_vec(&doc).map_err(AdapterError::from),
            Err(e) => Err(e),
        };
        metrics::record_assembly(start, result.is_ok());
        result
    }

    /// Assemble the document without serializing it.
    pub async fn assemble_document(&self) -> Result<ServerConfig> {
        let mut doc = ServerConfig::default();

        for section in Section::ALL {
            let Some(raw) = self.accessor.query_one(section.key()).await? else {
                continue;
            };
            if raw.trim().is_empty() {
                continue;
            }
            section.apply(&mut doc, &raw).map_err(|source| {
                tracing::error!(section = section.key(), strategy = ?section.strategy(), error = %source, "Error decoding section");
                AdapterError::SectionDecode {
                    section: section.key().to_string(),
                    source,
                }
            })?;
            tracing::trace!(section = section.key(), "Section applied");
        }

        self.apply_route_rows(&mut doc).await?;
        Ok(doc)
    }

    /// Swap inline routes for route rows, server by server.
    async fn apply_route_rows(&self, doc: &mut ServerConfig) -> Result<()> {
        let Some(apps) = doc.apps.as_mut() else {
            return Ok(());
        };
        let raw_http = match apps.get(HTTP_APP) {
            None | Some(Value::Null) => return Ok(()),
            Some(raw) => raw.clone(),
        };

        let mut http: HttpApp = serde_json::from_value(raw_http).map_err(|source| {
            tracing::error!(error = %source, "Error decoding http app");
            AdapterError::SectionDecode {
                section: format!("{}.{HTTP_APP}", Section::Apps.key()),
                source,
            }
        })?;

        let mut changed = false;
        for (name, server) in http.servers.iter_mut() {
            let rows = self.accessor.query_all(&routes_key(name)).await?;
            if rows.is_empty() {
                continue;
            }

            server.routes = rows
                .iter()
                .map(|raw| serde_json::from_str::<Route>(raw))
                .collect::<std::result::Result<Vec<Route>, serde_json::Error>>()
                .map_err(|source| {
                    tracing::error!(server = %name, error = %source, "Error decoding route");
                    AdapterError::RouteDecode {
                        server: name.clone(),
                        source,
                    }
                })?;
            tracing::debug!(server = %name, routes = server.routes.len(), "Routes replaced from rows");
            changed = true;
        }

        if changed {
            apps.insert(HTTP_APP.to_string(), serde_json::to_value(&http)?);
        }
        Ok(())
    }
}
