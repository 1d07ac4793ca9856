//! Version polling loop.
//!
//! # States
//! ```text
//! Idle → Checking → Unchanged → Idle
//!                 → Changed → Reloading → Idle
//! any → Stopped (shutdown signal)
//! ```
//!
//! # Design Decisions
//! - A version read failure keeps the known version; the loop never dies on it
//! - The version advances only once the host accepted the new document, so a
//!   failed assembly or reload is retried on the next tick
//! - No backoff: a dead pool is retried once per interval

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::document::Assembler;
use crate::observability::metrics;
use crate::refresh::reload::ReloadHandler;
use crate::refresh::state::{VersionState, VERSION_KEY};
use crate::store::HostConnection;

/// Result of one poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// Marker equal to the applied version, or unreadable.
    Unchanged,
    /// New document assembled, accepted, version stored.
    Reloaded { version: String },
    /// Marker changed but assembly failed; version kept.
    AssembleFailed,
    /// Marker changed but the host rejected the document; version kept.
    ReloadFailed,
}

/// Background task that reloads the host whenever the version marker moves.
pub struct RefreshLoop<C, R> {
    assembler: Arc<Assembler<C>>,
    versions: Arc<VersionState>,
    reloader: R,
    interval: Duration,
}

impl<C: HostConnection, R: ReloadHandler> RefreshLoop<C, R> {
    pub fn new(
        assembler: Arc<Assembler<C>>,
        versions: Arc<VersionState>,
        reloader: R,
        interval: Duration,
    ) -> Self {
        Self {
            assembler,
            versions,
            reloader,
            interval,
        }
    }

    /// Tick until a shutdown signal arrives or the sender goes away.
    ///
    /// The first poll happens one interval after start.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(
            interval_secs = self.interval.as_secs_f64(),
            version = %self.versions.get(),
            "Refresh loop starting"
        );

        let mut ticker = time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    tracing::debug!(version = %self.versions.get(), "Checking config version");
                    let outcome = self.tick().await;
                    tracing::debug!(?outcome, "Check finished");
                }
                _ = shutdown.recv() => {
                    tracing::info!("Refresh loop received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }

    /// Poll the version marker once and reload on change.
    pub async fn tick(&self) -> TickOutcome {
        let Some(version) = self.read_version().await else {
            return TickOutcome::Unchanged;
        };
        if !self.versions.differs(&version) {
            return TickOutcome::Unchanged;
        }

        tracing::info!(from = %self.versions.get(), to = %version, "Config version changed, refreshing");

        let document = match self.assembler.assemble().await {
            Ok(document) => document,
            Err(e) => {
                tracing::error!(target_version = %version, error = %e, "Error refreshing config");
                metrics::record_reload("assemble_failed");
                return TickOutcome::AssembleFailed;
            }
        };

        if let Err(e) = self.reloader.reload(document).await {
            tracing::error!(target_version = %version, error = %e, "Error loading new config");
            metrics::record_reload("reload_failed");
            return TickOutcome::ReloadFailed;
        }

        self.versions.set(version.clone());
        metrics::record_reload("ok");
        tracing::info!(version = %version, "Config reloaded");
        TickOutcome::Reloaded { version }
    }

    /// Current marker, or `None` when it cannot be read or is absent.
    async fn read_version(&self) -> Option<String> {
        match self.assembler.accessor().query_one(VERSION_KEY).await {
            Ok(Some(version)) => Some(version),
            Ok(None) => {
                tracing::debug!("No version marker stored, keeping current version");
                None
            }
            Err(e) => {
                tracing::error!(error = %e, "Error getting config version");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::refresh::reload::ReloadError;
    use crate::store::{HostPool, KvAccessor, MemoryHost, MemoryTable};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    struct Fixture {
        table: Arc<MemoryTable>,
        host: MemoryHost,
        versions: Arc<VersionState>,
        reloads: Arc<AtomicUsize>,
        reject: Arc<AtomicBool>,
    }

    fn fixture() -> (Fixture, RefreshLoop<MemoryHost, impl ReloadHandler>) {
        let table = MemoryTable::new();
        let host = MemoryHost::new("db1", table.clone());
        let pool = Arc::new(HostPool::new(vec![host.clone()], Duration::from_secs(1)));
        let accessor = Arc::new(KvAccessor::new(pool, Duration::from_secs(1)));
        let assembler = Arc::new(Assembler::new(accessor));
        let versions = Arc::new(VersionState::default());
        let reloads = Arc::new(AtomicUsize::new(0));
        let reject = Arc::new(AtomicBool::new(false));

        let (count, refuse) = (reloads.clone(), reject.clone());
        let reloader = move |_doc: Vec<u8>| {
            count.fetch_add(1, Ordering::SeqCst);
            if refuse.load(Ordering::SeqCst) {
                Err(ReloadError("refused".into()))
            } else {
                Ok(())
            }
        };

        let refresh = RefreshLoop::new(assembler, versions.clone(), reloader, Duration::from_millis(10));
        (
            Fixture {
                table,
                host,
                versions,
                reloads,
                reject,
            },
            refresh,
        )
    }

    #[tokio::test]
    async fn test_unchanged_version_does_not_reload() {
        let (fx, refresh) = fixture();
        fx.table.insert("version", "0");

        assert_eq!(refresh.tick().await, TickOutcome::Unchanged);
        assert_eq!(refresh.tick().await, TickOutcome::Unchanged);
        assert_eq!(fx.reloads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_missing_marker_keeps_version() {
        let (fx, refresh) = fixture();
        assert_eq!(refresh.tick().await, TickOutcome::Unchanged);
        assert_eq!(fx.versions.get().as_str(), "0");
    }

    #[tokio::test]
    async fn test_changed_version_reloads_once() {
        let (fx, refresh) = fixture();
        fx.table.insert("version", "2");

        assert_eq!(refresh.tick().await, TickOutcome::Reloaded { version: "2".into() });
        assert_eq!(refresh.tick().await, TickOutcome::Unchanged);
        assert_eq!(fx.reloads.load(Ordering::SeqCst), 1);
        assert_eq!(fx.versions.get().as_str(), "2");
    }

    #[tokio::test]
    async fn test_failed_assembly_is_retried() {
        let (fx, refresh) = fixture();
        fx.table.insert("version", "3");
        let bad = fx.table.insert("config.logging", "{broken");

        assert_eq!(refresh.tick().await, TickOutcome::AssembleFailed);
        assert_eq!(fx.versions.get().as_str(), "0");

        fx.table.set_enabled(bad, false);
        assert_eq!(refresh.tick().await, TickOutcome::Reloaded { version: "3".into() });
        assert_eq!(fx.reloads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_rejected_reload_keeps_version() {
        let (fx, refresh) = fixture();
        fx.table.insert("version", "4");
        fx.reject.store(true, Ordering::SeqCst);

        assert_eq!(refresh.tick().await, TickOutcome::ReloadFailed);
        assert_eq!(fx.versions.get().as_str(), "0");

        fx.reject.store(false, Ordering::SeqCst);
        assert_eq!(refresh.tick().await, TickOutcome::Reloaded { version: "4".into() });
    }

    #[tokio::test]
    async fn test_unreachable_store_keeps_version() {
        let (fx, refresh) = fixture();
        fx.table.insert("version", "5");
        fx.host.set_reachable(false);

        assert_eq!(refresh.tick().await, TickOutcome::Unchanged);
        assert_eq!(fx.reloads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let (fx, refresh) = fixture();
        fx.table.insert("version", "6");
        let (tx, rx) = broadcast::channel(1);

        let handle = tokio::spawn(refresh.run(rx));
        tokio::time::sleep(Duration::from_millis(50)).await;
        tx.send(()).unwrap();
        tokio::time::timeout(Duration::from_secs(1), handle).await.unwrap().unwrap();

        assert_eq!(fx.reloads.load(Ordering::SeqCst), 1);
        assert_eq!(fx.versions.get().as_str(), "6");
    }
}
