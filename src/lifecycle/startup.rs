//! Startup orchestration.
//!
//! # Responsibilities
//! - Initialize logging and metrics from the daemon settings
//! - Adapt the configuration and load the first document
//! - Start the admin API
//! - Wait for a signal, then stop everything in order
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - The admin API binds only after the first document is loaded, and never
//!   with the default key
//! - Stopped tasks get a grace period, then are cancelled

use std::path::Path;
use std::time::Duration;
use tokio::net::TcpListener;

use crate::adapter::Adapter;
use crate::admin::{self, AdminState};
use crate::config::schema::PLACEHOLDER_API_KEY;
use crate::config::{load_config, AdminConfig, DaemonConfig};
use crate::lifecycle::{signals, Shutdown};
use crate::live::LiveConfig;
use crate::observability::{logging, metrics};
use crate::store::Connector;

/// How long stopped tasks get to finish before they are cancelled.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

/// Errors that abort startup.
pub type StartupError = Box<dyn std::error::Error + Send + Sync>;

/// Load settings from `path` and run the PostgreSQL-backed daemon.
pub async fn run_from_file(path: &Path) -> Result<(), StartupError> {
    let config = load_config(path)?;
    logging::init_logging(&config.observability);
    tracing::info!(path = %path.display(), "Configuration loaded");
    run(config, Adapter::postgres(), signals::wait_for_signal()).await
}

/// Run the daemon until `stop` resolves.
pub async fn run<K, S>(config: DaemonConfig, adapter: Adapter<K>, stop: S) -> Result<(), StartupError>
where
    K: Connector,
    S: std::future::Future<Output = ()>,
{
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "pgconf starting");

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    if config.admin.enabled {
        check_admin_key(&config.admin)?;
    }

    let shutdown = Shutdown::new();
    let live = LiveConfig::new();

    let adapted = adapter
        .adapt_config(&config.adapter, live.clone(), shutdown.subscribe())
        .await?;
    live.apply(adapted.document)?;
    tracing::info!(version = %adapted.version, "Initial configuration loaded");

    let admin_task = if config.admin.enabled {
        let listener = TcpListener::bind(&config.admin.bind_address).await?;
        let state = AdminState {
            live: live.clone(),
            versions: adapted.versions.clone(),
            api_key: config.admin.api_key.as_str().into(),
        };
        Some(tokio::spawn(admin::serve(listener, state, shutdown.subscribe())))
    } else {
        None
    };

    stop.await;
    shutdown.trigger("shutdown requested");
    if !shutdown.drained(SHUTDOWN_GRACE).await {
        adapted.refresh.abort();
        if let Some(task) = &admin_task {
            task.abort();
        }
    }

    match adapted.refresh.await {
        Err(e) if e.is_cancelled() => tracing::warn!("Refresh loop cancelled"),
        Err(e) => tracing::error!(error = %e, "Refresh loop task failed"),
        Ok(()) => {}
    }
    if let Some(task) = admin_task {
        match task.await {
            Ok(Err(e)) => tracing::error!(error = %e, "Admin API error"),
            Err(e) if e.is_cancelled() => tracing::warn!("Admin API cancelled"),
            Err(e) => tracing::error!(error = %e, "Admin API task failed"),
            Ok(Ok(())) => {}
        }
    }

    adapter.close().await;
    tracing::info!("Shutdown complete");
    Ok(())
}

/// Refuse to expose the admin API with an empty or the default key.
fn check_admin_key(admin: &AdminConfig) -> Result<(), StartupError> {
    if admin.api_key.is_empty() || admin.api_key == PLACEHOLDER_API_KEY {
        tracing::error!(bind_address = %admin.bind_address, "Admin API enabled without a real api_key");
        return Err("admin.api_key must be set when the admin API is enabled (or set admin.enabled = false)".into());
    }
    Ok(())
}
