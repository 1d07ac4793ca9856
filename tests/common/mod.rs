//! Shared fixtures for the integration suites.

#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use pgconf::config::AdapterConfig;
use pgconf::document::Assembler;
use pgconf::refresh::{ReloadError, ReloadHandler};
use pgconf::store::{HostPool, KvAccessor, MemoryConnector, MemoryHost, MemoryTable};

pub const TIMEOUT: Duration = Duration::from_secs(1);

/// A config table replicated on `n` hosts labelled `db1..dbn`.
pub fn cluster(n: usize) -> (Arc<MemoryTable>, Vec<MemoryHost>) {
    let table = MemoryTable::new();
    let hosts = (1..=n)
        .map(|i| MemoryHost::new(format!("db{i}"), table.clone()))
        .collect();
    (table, hosts)
}

pub fn connector(hosts: &[MemoryHost]) -> MemoryConnector {
    MemoryConnector::new(hosts.iter().cloned())
}

/// Adapter settings naming every host of `hosts`.
pub fn settings(hosts: &[MemoryHost]) -> AdapterConfig {
    AdapterConfig {
        hosts: labels(hosts).join(","),
        ..Default::default()
    }
}

pub fn labels(hosts: &[MemoryHost]) -> Vec<String> {
    (1..=hosts.len()).map(|i| format!("db{i}")).collect()
}

pub fn accessor(hosts: &[MemoryHost]) -> Arc<KvAccessor<MemoryHost>> {
    let pool = HostPool::new(hosts.to_vec(), TIMEOUT);
    Arc::new(KvAccessor::new(Arc::new(pool), TIMEOUT))
}

pub fn assembler(hosts: &[MemoryHost]) -> Arc<Assembler<MemoryHost>> {
    Arc::new(Assembler::new(accessor(hosts)))
}

/// Reload target that records every document and can be told to refuse.
#[derive(Clone, Default)]
pub struct RecordingReloader {
    documents: Arc<Mutex<Vec<Vec<u8>>>>,
    refuse: Arc<Mutex<bool>>,
}

impl RecordingReloader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn refuse(&self, refuse: bool) {
        *self.refuse.lock().unwrap() = refuse;
    }

    pub fn count(&self) -> usize {
        self.documents.lock().unwrap().len()
    }

    pub fn last(&self) -> Option<serde_json::Value> {
        self.documents
            .lock()
            .unwrap()
            .last()
            .map(|d| serde_json::from_slice(d).unwrap())
    }
}

#[async_trait]
impl ReloadHandler for RecordingReloader {
    async fn reload(&self, document: Vec<u8>) -> Result<(), ReloadError> {
        if *self.refuse.lock().unwrap() {
            return Err(ReloadError("refused by test".to_string()));
        }
        self.documents.lock().unwrap().push(document);
        Ok(())
    }
}

/// Poll `check` until it holds or `limit` elapses.
pub async fn eventually<F: Fn() -> bool>(limit: Duration, check: F) -> bool {
    let deadline = tokio::time::Instant::now() + limit;
    while tokio::time::Instant::now() < deadline {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    check()
}
