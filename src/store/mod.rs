//! Configuration store subsystem.
//!
//! # Data Flow
//! ```text
//! AdapterConfig.host_targets()
//!     → Connector::open (postgres.rs / memory.rs), one per host
//!     → pool.rs probes each host, drops dead ones, picks a random current
//!     → accessor.rs runs queries on pool.current()
//!         on error: pool.advance() → retry (at most one attempt per host)
//! ```
//!
//! # Design Decisions
//! - Hosts are equivalent replicas; any of them can serve any read
//! - The store is read-only from here; rows are written elsewhere
//! - Keys are always bound parameters, never spliced into SQL text
//! - Host access sits behind a trait so the pool and accessor run
//!   against in-memory hosts in tests

pub mod accessor;
pub mod memory;
pub mod pool;
pub mod postgres;

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

use crate::config::{AdapterConfig, HostTarget};

pub use accessor::KvAccessor;
pub use memory::{MemoryConnector, MemoryHost, MemoryTable};
pub use pool::HostPool;
pub use postgres::{PgConnector, PgHost};

/// Failure of a single host operation.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("host {0} unavailable")]
    Unavailable(String),
}

/// One database host holding a replica of the config table.
#[async_trait]
pub trait HostConnection: Send + Sync + 'static {
    /// Host name for logs and status output.
    fn label(&self) -> &str;

    /// Cheap liveness probe.
    async fn ping(&self) -> Result<(), QueryError>;

    /// Value of the newest enabled row for `key`.
    async fn fetch_latest(&self, key: &str) -> Result<Option<String>, QueryError>;

    /// Values of all enabled rows for `key`, newest first.
    async fn fetch_all(&self, key: &str) -> Result<Vec<String>, QueryError>;

    /// Create the config table and its key index if missing.
    async fn ensure_schema(&self) -> Result<(), QueryError>;

    /// Release the host's connections.
    async fn close(&self) {}
}

/// Opens host connections from adapter settings.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    type Host: HostConnection;

    /// Open (but do not probe) a connection to `target`.
    async fn open(&self, config: &AdapterConfig, target: &HostTarget) -> Result<Self::Host, QueryError>;
}
