//! Adapter entry point.
//!
//! # Responsibilities
//! - Turn an adapter settings body into a first configuration document
//! - Own the host pool across adaptations
//! - Start the refresh loop for each adaptation
//!
//! The version marker is read before the first assembly, so the recorded
//! version never runs ahead of the document it describes.

use std::sync::Arc;
use tokio::sync::{broadcast, OnceCell};
use tokio::task::JoinHandle;

use crate::config::{parse_adapter_config, AdapterConfig};
use crate::document::Assembler;
use crate::error::Result;
use crate::refresh::{RefreshLoop, ReloadHandler, VersionState, INITIAL_VERSION, VERSION_KEY};
use crate::store::{Connector, HostPool, KvAccessor, PgConnector};

/// Result of one adaptation.
#[derive(Debug)]
pub struct Adapted {
    /// The assembled document, serialized.
    pub document: Vec<u8>,
    /// Version marker read at adaptation time.
    pub version: String,
    /// Version the refresh loop last applied.
    pub versions: Arc<VersionState>,
    /// The refresh loop task.
    pub refresh: JoinHandle<()>,
}

/// Config adapter over a set of database hosts.
pub struct Adapter<K: Connector> {
    connector: K,
    pool: OnceCell<Arc<HostPool<K::Host>>>,
}

impl Adapter<PgConnector> {
    /// Adapter backed by PostgreSQL.
    pub fn postgres() -> Self {
        Self::new(PgConnector)
    }
}

impl<K: Connector> Adapter<K> {
    pub fn new(connector: K) -> Self {
        Self {
            connector,
            pool: OnceCell::new(),
        }
    }

    /// Build the initial document and start watching for changes.
    ///
    /// The pool is created by the first call and reused by later ones, so
    /// their host settings are ignored.
    pub async fn adapt<R: ReloadHandler>(
        &self,
        body: &[u8],
        reloader: R,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<Adapted> {
        let config = parse_adapter_config(body)?;
        self.adapt_config(&config, reloader, shutdown).await
    }

    /// Same as [`adapt`](Self::adapt) with already validated settings.
    pub async fn adapt_config<R: ReloadHandler>(
        &self,
        config: &AdapterConfig,
        reloader: R,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<Adapted> {
        let pool = self
            .pool
            .get_or_try_init(|| async { HostPool::initialize(&self.connector, config).await.map(Arc::new) })
            .await?
            .clone();

        let accessor = Arc::new(KvAccessor::new(pool, config.query_timeout()));
        let assembler = Arc::new(Assembler::new(accessor.clone()));

        // Read the marker first: rows changed during assembly then show up
        // as a version difference on the next tick.
        let version = match accessor.query_one(VERSION_KEY).await {
            Ok(Some(version)) => version,
            Ok(None) => INITIAL_VERSION.to_string(),
            Err(e) => {
                tracing::error!(error = %e, "Error getting config version");
                INITIAL_VERSION.to_string()
            }
        };

        let document = assembler.assemble().await?;

        let versions = Arc::new(VersionState::new(version.clone()));

        let refresh = RefreshLoop::new(assembler, versions.clone(), reloader, config.refresh_interval());
        let refresh = tokio::spawn(refresh.run(shutdown));

        tracing::info!(
            version = %version,
            bytes = document.len(),
            table = %config.table_name(),
            "Config adapted"
        );

        Ok(Adapted {
            document,
            version,
            versions,
            refresh,
        })
    }

    /// The shared pool, once the first adaptation created it.
    pub fn pool(&self) -> Option<&Arc<HostPool<K::Host>>> {
        self.pool.get()
    }

    /// Release every host connection.
    pub async fn close(&self) {
        if let Some(pool) = self.pool.get() {
            pool.close().await;
        }
    }
}
