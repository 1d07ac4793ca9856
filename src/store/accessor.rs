//! Key-value reads with host failover.
//!
//! # Responsibilities
//! - Read the effective value of scalar keys and list keys
//! - Retry a failed query on the next live host, once per known host
//!
//! # Design Decisions
//! - "No rows" is an empty result, never an error
//! - Every attempt has its own deadline
//! - No backoff between hosts; the caller's poll interval is the backoff

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{AdapterError, Result};
use crate::observability::metrics;
use crate::resilience::timeouts::bounded;
use crate::store::{HostConnection, HostPool, QueryError};

/// Reads from the config table through a [`HostPool`].
#[derive(Debug)]
pub struct KvAccessor<C> {
    pool: Arc<HostPool<C>>,
    query_timeout: Duration,
}

impl<C: HostConnection> KvAccessor<C> {
    pub fn new(pool: Arc<HostPool<C>>, query_timeout: Duration) -> Self {
        Self { pool, query_timeout }
    }

    pub fn pool(&self) -> &Arc<HostPool<C>> {
        &self.pool
    }

    /// Value of the newest enabled row for `key`, or `None` if there is none.
    pub async fn query_one(&self, key: &str) -> Result<Option<String>> {
        self.with_failover("query_one", key, |host| async move { host.fetch_latest(key).await })
            .await
    }

    /// Values of every enabled row for `key`, newest first.
    pub async fn query_all(&self, key: &str) -> Result<Vec<String>> {
        self.with_failover("query_all", key, |host| async move { host.fetch_all(key).await })
            .await
    }

    async fn with_failover<T, F, Fut>(&self, op: &'static str, key: &str, query: F) -> Result<T>
    where
        F: Fn(Arc<C>) -> Fut,
        Fut: Future<Output = std::result::Result<T, QueryError>>,
    {
        let attempts = self.pool.len();
        let mut last_error = None;

        for attempt in 1..=attempts {
            let host = self.pool.current();
            match bounded(self.query_timeout, query(host.clone())).await {
                Ok(value) => {
                    metrics::record_query(op, true);
                    return Ok(value);
                }
                Err(e) => {
                    metrics::record_query(op, false);
                    tracing::error!(
                        host = %host.label(),
                        op,
                        key,
                        attempt,
                        error = %e,
                        "Query failed, trying next database host"
                    );
                    last_error = Some(e);
                    self.pool.advance().await;
                }
            }
        }

        match last_error {
            Some(source) => Err(AdapterError::AllHostsFailed { attempts, source }),
            None => Err(AdapterError::NoReachableHost { attempted: 0 }),
        }
    }
}
