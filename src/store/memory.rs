//! In-process config table and hosts.
//!
//! A [`MemoryTable`] plays the role of the replicated database; any number of
//! [`MemoryHost`]s can serve it, and each host can be switched unreachable to
//! simulate an outage. Used by the test suites and by embedders that want to
//! run the assembler without PostgreSQL.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::config::{AdapterConfig, HostTarget};
use crate::store::{Connector, HostConnection, QueryError};

/// One row of the config table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigRow {
    pub id: i64,
    pub key: String,
    pub value: Option<String>,
    pub enable: bool,
    /// Logical creation time; strictly increasing per insert.
    pub created: u64,
    pub updated: u64,
}

/// Shared in-memory config table.
#[derive(Debug, Default)]
pub struct MemoryTable {
    rows: Mutex<Vec<ConfigRow>>,
    next_id: AtomicI64,
    clock: AtomicU64,
    schema: AtomicBool,
    ddl_runs: AtomicUsize,
}

impl MemoryTable {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn rows(&self) -> MutexGuard<'_, Vec<ConfigRow>> {
        self.rows.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert an enabled row and return its id.
    pub fn insert(&self, key: &str, value: &str) -> i64 {
        self.insert_row(key, Some(value), true)
    }

    /// Insert a disabled row and return its id.
    pub fn insert_disabled(&self, key: &str, value: &str) -> i64 {
        self.insert_row(key, Some(value), false)
    }

    pub fn insert_row(&self, key: &str, value: Option<&str>, enable: bool) -> i64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let now = self.clock.fetch_add(1, Ordering::Relaxed) + 1;
        self.rows().push(ConfigRow {
            id,
            key: key.to_string(),
            value: value.map(str::to_string),
            enable,
            created: now,
            updated: now,
        });
        id
    }

    /// Flip the `enable` flag of a row. Returns false if the row is unknown.
    pub fn set_enabled(&self, id: i64, enable: bool) -> bool {
        let now = self.clock.fetch_add(1, Ordering::Relaxed) + 1;
        match self.rows().iter_mut().find(|r| r.id == id) {
            Some(row) => {
                row.enable = enable;
                row.updated = now;
                true
            }
            None => false,
        }
    }

    /// Snapshot of every row, in insertion order.
    pub fn snapshot(&self) -> Vec<ConfigRow> {
        self.rows().clone()
    }

    /// Enabled non-null values for `key`, newest first.
    pub fn values(&self, key: &str) -> Vec<String> {
        let mut matching: Vec<ConfigRow> = self
            .rows()
            .iter()
            .filter(|r| r.key == key && r.enable && r.value.is_some())
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created.cmp(&a.created).then(b.id.cmp(&a.id)));
        matching.into_iter().filter_map(|r| r.value).collect()
    }

    pub fn has_schema(&self) -> bool {
        self.schema.load(Ordering::Relaxed)
    }

    /// Number of times the schema DDL ran.
    pub fn ddl_runs(&self) -> usize {
        self.ddl_runs.load(Ordering::Relaxed)
    }
}

#[derive(Debug)]
struct HostState {
    reachable: AtomicBool,
    queries: AtomicUsize,
}

/// A replica serving a [`MemoryTable`]. Clones share reachability and counters.
#[derive(Debug, Clone)]
pub struct MemoryHost {
    label: String,
    table: Arc<MemoryTable>,
    state: Arc<HostState>,
}

impl MemoryHost {
    pub fn new(label: impl Into<String>, table: Arc<MemoryTable>) -> Self {
        Self {
            label: label.into(),
            table,
            state: Arc::new(HostState {
                reachable: AtomicBool::new(true),
                queries: AtomicUsize::new(0),
            }),
        }
    }

    pub fn set_reachable(&self, reachable: bool) {
        self.state.reachable.store(reachable, Ordering::SeqCst);
    }

    pub fn is_reachable(&self) -> bool {
        self.state.reachable.load(Ordering::SeqCst)
    }

    /// Number of queries this host has been asked to run.
    pub fn query_count(&self) -> usize {
        self.state.queries.load(Ordering::SeqCst)
    }

    pub fn table(&self) -> &Arc<MemoryTable> {
        &self.table
    }

    fn check(&self) -> Result<(), QueryError> {
        if self.is_reachable() {
            Ok(())
        } else {
            Err(QueryError::Unavailable(self.label.clone()))
        }
    }
}

#[async_trait]
impl HostConnection for MemoryHost {
    fn label(&self) -> &str {
        &self.label
    }

    async fn ping(&self) -> Result<(), QueryError> {
        self.check()
    }

    async fn fetch_latest(&self, key: &str) -> Result<Option<String>, QueryError> {
        self.state.queries.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(self.table.values(key).into_iter().next())
    }

    async fn fetch_all(&self, key: &str) -> Result<Vec<String>, QueryError> {
        self.state.queries.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(self.table.values(key))
    }

    async fn ensure_schema(&self) -> Result<(), QueryError> {
        self.check()?;
        self.table.ddl_runs.fetch_add(1, Ordering::Relaxed);
        self.table.schema.store(true, Ordering::Relaxed);
        Ok(())
    }
}

/// Hands out pre-built [`MemoryHost`]s by label.
#[derive(Debug, Default)]
pub struct MemoryConnector {
    hosts: HashMap<String, MemoryHost>,
    opens: AtomicUsize,
}

impl MemoryConnector {
    pub fn new(hosts: impl IntoIterator<Item = MemoryHost>) -> Self {
        Self {
            hosts: hosts.into_iter().map(|h| (h.label.clone(), h)).collect(),
            opens: AtomicUsize::new(0),
        }
    }

    /// Number of successful `open` calls.
    pub fn open_count(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Connector for MemoryConnector {
    type Host = MemoryHost;

    async fn open(&self, _config: &AdapterConfig, target: &HostTarget) -> Result<MemoryHost, QueryError> {
        let host = self
            .hosts
            .get(target.label())
            .cloned()
            .ok_or_else(|| QueryError::Unavailable(target.label().to_string()))?;
        self.opens.fetch_add(1, Ordering::SeqCst);
        Ok(host)
    }
}
