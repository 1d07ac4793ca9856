//! Version-gated refresh and adapter lifecycle.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

use pgconf::config::{AdapterConfig, HostTarget};
use pgconf::refresh::{RefreshLoop, TickOutcome, VersionState};
use pgconf::store::{Connector, HostConnection, MemoryHost, QueryError};
use pgconf::Adapter;

mod common;

use common::RecordingReloader;

fn refresh_loop(
    hosts: &[MemoryHost],
    reloader: RecordingReloader,
    interval: Duration,
) -> (Arc<VersionState>, RefreshLoop<MemoryHost, RecordingReloader>) {
    let versions = Arc::new(VersionState::default());
    let refresh = RefreshLoop::new(common::assembler(hosts), versions.clone(), reloader, interval);
    (versions, refresh)
}

#[tokio::test]
async fn test_version_gating() {
    let (table, hosts) = common::cluster(2);
    table.insert("version", "0");
    let reloader = RecordingReloader::new();
    let (versions, refresh) = refresh_loop(&hosts, reloader.clone(), Duration::from_millis(20));

    for _ in 0..3 {
        assert_eq!(refresh.tick().await, TickOutcome::Unchanged);
    }
    assert_eq!(reloader.count(), 0);

    table.insert("config.storage", r#"{"module":"file_system"}"#);
    table.insert("version", "1");
    assert_eq!(refresh.tick().await, TickOutcome::Reloaded { version: "1".into() });
    assert_eq!(refresh.tick().await, TickOutcome::Unchanged);
    assert_eq!(reloader.count(), 1);
    assert_eq!(reloader.last().unwrap()["storage"]["module"], "file_system");
    assert_eq!(versions.get().as_str(), "1");
}

#[tokio::test]
async fn test_failed_reassembly_is_retried_next_tick() {
    let (table, hosts) = common::cluster(1);
    table.insert("config.apps", r#"{"http":{"servers":{"srv0":{}}}}"#);
    let reloader = RecordingReloader::new();
    let (versions, refresh) = refresh_loop(&hosts, reloader.clone(), Duration::from_millis(20));

    let bad = table.insert("config.apps.http.servers.srv0.routes", "{not json");
    table.insert("version", "2");
    assert_eq!(refresh.tick().await, TickOutcome::AssembleFailed);
    assert_eq!(refresh.tick().await, TickOutcome::AssembleFailed);
    assert_eq!(versions.get().as_str(), "0");

    table.set_enabled(bad, false);
    table.insert("config.apps.http.servers.srv0.routes", r#"{"@id":"fixed"}"#);
    assert_eq!(refresh.tick().await, TickOutcome::Reloaded { version: "2".into() });
    assert_eq!(
        reloader.last().unwrap()["apps"]["http"]["servers"]["srv0"]["routes"][0]["@id"],
        "fixed"
    );
}

#[tokio::test]
async fn test_rejected_reload_is_retried() {
    let (table, hosts) = common::cluster(1);
    table.insert("version", "5");
    let reloader = RecordingReloader::new();
    reloader.refuse(true);
    let (versions, refresh) = refresh_loop(&hosts, reloader.clone(), Duration::from_millis(20));

    assert_eq!(refresh.tick().await, TickOutcome::ReloadFailed);
    assert_eq!(versions.get().as_str(), "0");

    reloader.refuse(false);
    assert_eq!(refresh.tick().await, TickOutcome::Reloaded { version: "5".into() });
    assert_eq!(reloader.count(), 1);
}

#[tokio::test]
async fn test_running_loop_picks_up_changes_and_stops() {
    let (table, hosts) = common::cluster(2);
    let reloader = RecordingReloader::new();
    let (versions, refresh) = refresh_loop(&hosts, reloader.clone(), Duration::from_millis(20));
    let (tx, rx) = broadcast::channel(1);
    let handle = tokio::spawn(refresh.run(rx));

    table.insert("version", "a");
    assert!(common::eventually(Duration::from_secs(2), || versions.get().as_str() == "a").await);

    hosts[0].set_reachable(false);
    table.insert("version", "b");
    assert!(common::eventually(Duration::from_secs(2), || versions.get().as_str() == "b").await);
    assert_eq!(reloader.count(), 2);

    tx.send(()).unwrap();
    tokio::time::timeout(Duration::from_secs(1), handle).await.unwrap().unwrap();
}

#[tokio::test]
async fn test_loop_stops_when_sender_dropped() {
    let (_table, hosts) = common::cluster(1);
    let (_versions, refresh) = refresh_loop(&hosts, RecordingReloader::new(), Duration::from_millis(20));
    let (tx, rx) = broadcast::channel::<()>(1);
    let handle = tokio::spawn(refresh.run(rx));

    drop(tx);
    tokio::time::timeout(Duration::from_secs(1), handle).await.unwrap().unwrap();
}

#[tokio::test]
async fn test_adapter_reuses_pool() {
    let (table, hosts) = common::cluster(3);
    table.insert("config.admin", r#"{"listen":":2019"}"#);
    let adapter = Adapter::new(common::connector(&hosts));
    let (tx, _) = broadcast::channel(1);

    let first = adapter
        .adapt(br#"{"hosts":"db1,db2,db3"}"#, RecordingReloader::new(), tx.subscribe())
        .await
        .unwrap();
    let pool = adapter.pool().unwrap().clone();

    let second = adapter
        .adapt(br#"{"hosts":"db1"}"#, RecordingReloader::new(), tx.subscribe())
        .await
        .unwrap();

    assert!(Arc::ptr_eq(&pool, adapter.pool().unwrap()));
    assert_eq!(pool.len(), 3);
    assert_eq!(table.ddl_runs(), 1);
    assert_eq!(first.document, second.document);

    tx.send(()).unwrap();
    first.refresh.await.unwrap();
    second.refresh.await.unwrap();
    adapter.close().await;
}

#[tokio::test]
async fn test_adapter_refreshes_in_background() {
    let (table, hosts) = common::cluster(2);
    table.insert("version", "1");
    let adapter = Adapter::new(common::connector(&hosts));
    let reloader = RecordingReloader::new();
    let (tx, rx) = broadcast::channel(1);

    let adapted = adapter
        .adapt(br#"{"hosts":"db1,db2","refresh_interval":1}"#, reloader.clone(), rx)
        .await
        .unwrap();
    assert_eq!(adapted.version, "1");
    assert_eq!(reloader.count(), 0);

    table.insert("config.logging", r#"{"logs":{"main":{}}}"#);
    table.insert("version", "2");
    assert!(common::eventually(Duration::from_secs(5), || reloader.count() == 1).await);
    assert_eq!(adapted.versions.get().as_str(), "2");
    assert!(reloader.last().unwrap()["logging"]["logs"].get("main").is_some());

    tx.send(()).unwrap();
    adapted.refresh.await.unwrap();
}

/// Host that publishes a new config revision while the apps section is read.
struct ConcurrentWriterHost {
    inner: MemoryHost,
    written: Arc<AtomicBool>,
}

#[async_trait]
impl HostConnection for ConcurrentWriterHost {
    fn label(&self) -> &str {
        self.inner.label()
    }

    async fn ping(&self) -> Result<(), QueryError> {
        self.inner.ping().await
    }

    async fn fetch_latest(&self, key: &str) -> Result<Option<String>, QueryError> {
        if key == "config.apps" && !self.written.swap(true, Ordering::SeqCst) {
            let table = self.inner.table();
            table.insert("config.admin", r#"{"listen":":9999"}"#);
            table.insert("version", "2");
        }
        self.inner.fetch_latest(key).await
    }

    async fn fetch_all(&self, key: &str) -> Result<Vec<String>, QueryError> {
        self.inner.fetch_all(key).await
    }

    async fn ensure_schema(&self) -> Result<(), QueryError> {
        self.inner.ensure_schema().await
    }
}

struct ConcurrentWriterConnector {
    host: MemoryHost,
    written: Arc<AtomicBool>,
}

#[async_trait]
impl Connector for ConcurrentWriterConnector {
    type Host = ConcurrentWriterHost;

    async fn open(&self, _config: &AdapterConfig, _target: &HostTarget) -> Result<ConcurrentWriterHost, QueryError> {
        Ok(ConcurrentWriterHost {
            inner: self.host.clone(),
            written: self.written.clone(),
        })
    }
}

#[tokio::test]
async fn test_update_during_initial_assembly_is_applied_later() {
    let (table, hosts) = common::cluster(1);
    table.insert("config.admin", r#"{"listen":":2019"}"#);
    table.insert("version", "1");
    let written = Arc::new(AtomicBool::new(false));
    let adapter = Adapter::new(ConcurrentWriterConnector {
        host: hosts[0].clone(),
        written: written.clone(),
    });
    let reloader = RecordingReloader::new();
    let (tx, rx) = broadcast::channel(1);

    let adapted = adapter
        .adapt(br#"{"hosts":"db1","refresh_interval":1}"#, reloader.clone(), rx)
        .await
        .unwrap();
    assert!(written.load(Ordering::SeqCst));
    assert_eq!(adapted.document, br#"{"admin":{"listen":":2019"}}"#);
    assert_eq!(adapted.version, "1");

    assert!(common::eventually(Duration::from_secs(5), || reloader.count() == 1).await);
    assert_eq!(reloader.last().unwrap()["admin"]["listen"], ":9999");
    assert_eq!(adapted.versions.get().as_str(), "2");

    tx.send(()).unwrap();
    adapted.refresh.await.unwrap();
}
