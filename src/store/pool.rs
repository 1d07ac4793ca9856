//! Host pool management.
//!
//! # Responsibilities
//! - Open one connection per configured host and keep those that answer
//! - Track which host is current
//! - Move to the next live host when the current one fails
//! - Create the config table on first use

use rand::Rng;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use crate::config::AdapterConfig;
use crate::error::{AdapterError, Result};
use crate::observability::metrics;
use crate::resilience::timeouts::bounded;
use crate::store::{Connector, HostConnection};

/// Equivalent database hosts with one designated as current.
#[derive(Debug)]
pub struct HostPool<C> {
    hosts: Vec<Arc<C>>,
    /// Index into `hosts` of the current connection.
    current: AtomicUsize,
    /// Serializes `advance` so concurrent failures probe one at a time.
    advance_lock: Mutex<()>,
    probe_timeout: Duration,
}

impl<C: HostConnection> HostPool<C> {
    /// Open, probe and keep every reachable host, then create the schema.
    ///
    /// Hosts that fail to open or do not answer the probe within the query
    /// timeout are dropped. The current host is picked at random so that a
    /// fleet of instances does not pile onto the first host in the list.
    pub async fn initialize<K>(connector: &K, config: &AdapterConfig) -> Result<Self>
    where
        K: Connector<Host = C>,
    {
        let probe_timeout = config.query_timeout();
        let targets = config.host_targets();
        let mut hosts = Vec::with_capacity(targets.len());

        for target in &targets {
            let host = match connector.open(config, target).await {
                Ok(host) => host,
                Err(e) => {
                    tracing::warn!(host = %target.label(), error = %e, "Failed to open database connection");
                    continue;
                }
            };

            if let Err(e) = bounded(probe_timeout, host.ping()).await {
                tracing::warn!(host = %target.label(), error = %e, "Failed to ping database");
                host.close().await;
                continue;
            }

            hosts.push(host);
        }

        if hosts.is_empty() {
            return Err(AdapterError::NoReachableHost {
                attempted: targets.len(),
            });
        }

        let pool = Self::new(hosts, probe_timeout);
        tracing::info!(
            hosts = pool.len(),
            attempted = targets.len(),
            current = %pool.current().label(),
            "Database pool initialized"
        );

        if config.disable_ddl {
            tracing::debug!("Schema creation disabled");
        } else {
            let table = config.table_name();
            bounded(probe_timeout, pool.current().ensure_schema())
                .await
                .map_err(|e| {
                    tracing::error!(table = %table, error = %e, "Create table error");
                    AdapterError::SchemaCreation(e)
                })?;
            tracing::debug!(table = %table, "Schema ensured");
        }

        Ok(pool)
    }

    /// Build a pool from already-probed hosts. The current host is random.
    ///
    /// # Panics
    /// Panics if `hosts` is empty.
    pub fn new(hosts: Vec<C>, probe_timeout: Duration) -> Self {
        assert!(!hosts.is_empty(), "a host pool needs at least one host");
        let start = rand::thread_rng().gen_range(0..hosts.len());
        metrics::record_pool_size(hosts.len());
        Self {
            hosts: hosts.into_iter().map(Arc::new).collect(),
            current: AtomicUsize::new(start),
            advance_lock: Mutex::new(()),
            probe_timeout,
        }
    }

    /// The host the next query should go to.
    pub fn current(&self) -> Arc<C> {
        self.hosts[self.current_index()].clone()
    }

    pub fn current_index(&self) -> usize {
        self.current.load(Ordering::Acquire)
    }

    pub fn current_label(&self) -> String {
        self.current().label().to_string()
    }

    /// Switch to the next host that answers a probe.
    ///
    /// Candidates are tried in pool order starting right after the current
    /// host and wrapping around, the current host last. When nobody answers
    /// the current host is kept and returned.
    pub async fn advance(&self) -> Arc<C> {
        let _guard = self.advance_lock.lock().await;
        let len = self.hosts.len();
        let start = self.current_index();

        for step in 1..=len {
            let index = (start + step) % len;
            let candidate = &self.hosts[index];
            match bounded(self.probe_timeout, candidate.ping()).await {
                Ok(()) => {
                    self.current.store(index, Ordering::Release);
                    if index != start {
                        tracing::info!(
                            from = %self.hosts[start].label(),
                            to = %candidate.label(),
                            "Switched current database host"
                        );
                    }
                    metrics::record_failover(candidate.label(), true);
                    return candidate.clone();
                }
                Err(e) => {
                    tracing::debug!(host = %candidate.label(), error = %e, "Failover candidate did not answer");
                }
            }
        }

        let current = self.hosts[start].clone();
        tracing::warn!(host = %current.label(), "No database host answered, keeping current");
        metrics::record_failover(current.label(), false);
        current
    }

    /// Number of hosts that survived initialization.
    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }

    pub fn labels(&self) -> Vec<String> {
        self.hosts.iter().map(|h| h.label().to_string()).collect()
    }

    /// Close every host connection.
    pub async fn close(&self) {
        for host in &self.hosts {
            host.close().await;
        }
    }
}
