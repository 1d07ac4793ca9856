//! Metrics collection and exposition.
//!
//! # Metrics
//! - `pgconf_queries_total` (counter): queries by op, outcome
//! - `pgconf_failovers_total` (counter): advance() calls by outcome
//! - `pgconf_pool_hosts` (gauge): hosts that survived initialization
//! - `pgconf_assemblies_total` (counter): document assemblies by outcome
//! - `pgconf_assemble_duration_seconds` (histogram): assembly latency
//! - `pgconf_reloads_total` (counter): refresh ticks that reached a reload, by outcome
//!
//! Recording is a no-op until a recorder is installed with [`init_metrics`].

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus recorder and its HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_query(op: &'static str, success: bool) {
    let outcome = if success { "ok" } else { "error" };
    counter!("pgconf_queries_total", "op" => op, "outcome" => outcome).increment(1);
}

pub fn record_failover(host: &str, switched: bool) {
    let outcome = if switched { "switched" } else { "exhausted" };
    counter!("pgconf_failovers_total", "host" => host.to_string(), "outcome" => outcome).increment(1);
}

pub fn record_pool_size(hosts: usize) {
    gauge!("pgconf_pool_hosts").set(hosts as f64);
}

pub fn record_assembly(start: Instant, success: bool) {
    let outcome = if success { "ok" } else { "error" };
    counter!("pgconf_assemblies_total", "outcome" => outcome).increment(1);
    histogram!("pgconf_assemble_duration_seconds").record(start.elapsed().as_secs_f64());
}

pub fn record_reload(outcome: &'static str) {
    counter!("pgconf_reloads_total", "outcome" => outcome).increment(1);
}
