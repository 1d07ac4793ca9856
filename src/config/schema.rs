//! Configuration schema definitions.
//!
//! Two documents are described here:
//! - [`AdapterConfig`], the body handed to the adapter (JSON), which says how
//!   to reach the configuration database and how often to poll it.
//! - [`DaemonConfig`], the settings file of the `pgconf` binary, which wraps
//!   an `AdapterConfig` with admin API and observability settings.
//!
//! All types derive Serde traits and fill missing fields from defaults.

use serde::{de, Deserialize, Deserializer, Serialize};
use std::time::Duration;

/// Placeholder substituted with each host in a connection string template.
pub const HOST_PLACEHOLDER: &str = "{host}";

/// PostgreSQL's default port.
pub const DEFAULT_PORT: u16 = 5432;

/// Admin API key shipped in the defaults; never fit for a real deployment.
pub const PLACEHOLDER_API_KEY: &str = "CHANGE_ME_IN_PRODUCTION";

/// Settings for reaching the configuration table.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct AdapterConfig {
    /// Timeout for liveness probes, queries and DDL, in milliseconds.
    pub query_timeout_ms: u64,

    /// Per-key lock timeout in milliseconds. Carried for compatibility,
    /// nothing in the read path takes locks.
    pub lock_timeout_ms: u64,

    /// Query timeout in nanoseconds, as older adapter bodies spell it.
    /// Takes precedence over `query_timeout_ms` when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query_timeout: Option<u64>,

    /// Lock timeout in nanoseconds. Takes precedence over `lock_timeout_ms`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lock_timeout: Option<u64>,

    /// Comma-separated list of equivalent database hosts.
    pub hosts: String,

    /// Database port, used when no connection string is given. Accepts a
    /// number or a numeric string.
    #[serde(deserialize_with = "port_from_number_or_string")]
    pub port: u16,

    /// Database user.
    pub user: String,

    /// Database password.
    pub password: String,

    /// Database name.
    pub dbname: String,

    /// libpq SSL mode name (disable, allow, prefer, require, verify-ca, verify-full).
    pub sslmode: String,

    /// Connection URL template. `{host}` is replaced with each host.
    pub connection_string: String,

    /// Skip `CREATE TABLE` / `CREATE INDEX` at startup.
    pub disable_ddl: bool,

    /// Prefix of the config table; the table is `<prefix>_CONFIG`.
    pub table_name_prefix: String,

    /// Version poll interval in seconds.
    pub refresh_interval: u64,

    /// Type of the `enable` column.
    pub enable_column: EnableColumn,

    /// Maximum open connections per host.
    pub max_connections: u32,

    /// Lifetime (and idle timeout) of pooled connections in seconds.
    pub conn_max_lifetime_secs: u64,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            query_timeout_ms: 3_000,
            lock_timeout_ms: 60_000,
            query_timeout: None,
            lock_timeout: None,
            hosts: String::new(),
            port: DEFAULT_PORT,
            user: String::new(),
            password: String::new(),
            dbname: String::new(),
            sslmode: "disable".to_string(),
            connection_string: String::new(),
            disable_ddl: false,
            table_name_prefix: "CADDY".to_string(),
            refresh_interval: 100,
            enable_column: EnableColumn::Boolean,
            max_connections: 10,
            conn_max_lifetime_secs: 180,
        }
    }
}

impl AdapterConfig {
    /// Name of the config table.
    pub fn table_name(&self) -> String {
        format!("{}_CONFIG", self.table_name_prefix)
    }

    pub fn query_timeout(&self) -> Duration {
        match self.query_timeout {
            Some(nanos) => Duration::from_nanos(nanos),
            None => Duration::from_millis(self.query_timeout_ms),
        }
    }

    pub fn lock_timeout(&self) -> Duration {
        match self.lock_timeout {
            Some(nanos) => Duration::from_nanos(nanos),
            None => Duration::from_millis(self.lock_timeout_ms),
        }
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval)
    }

    pub fn conn_max_lifetime(&self) -> Duration {
        Duration::from_secs(self.conn_max_lifetime_secs)
    }

    /// Hosts to open, in configured order.
    ///
    /// An empty host list with a connection string yields a single target
    /// that uses the connection string as-is.
    pub fn host_targets(&self) -> Vec<HostTarget> {
        let hosts: Vec<HostTarget> = self
            .hosts
            .split(',')
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .map(|h| HostTarget::Named(h.to_string()))
            .collect();

        if hosts.is_empty() && !self.connection_string.is_empty() {
            return vec![HostTarget::ConnectionString];
        }
        hosts
    }
}

fn port_from_number_or_string<'de, D>(deserializer: D) -> Result<u16, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Port {
        Number(u16),
        Text(String),
    }

    match Port::deserialize(deserializer)? {
        Port::Number(port) => Ok(port),
        Port::Text(text) if text.trim().is_empty() => Ok(DEFAULT_PORT),
        Port::Text(text) => text
            .trim()
            .parse()
            .map_err(|_| de::Error::custom(format!("invalid port {text:?}"))),
    }
}

/// One entry of the host list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostTarget {
    /// A host name or address from `hosts`.
    Named(String),
    /// No host list; the connection string is used verbatim.
    ConnectionString,
}

impl HostTarget {
    /// Name used in logs. Never contains credentials.
    pub fn label(&self) -> &str {
        match self {
            HostTarget::Named(host) => host,
            HostTarget::ConnectionString => "connection_string",
        }
    }
}

/// Storage type of the `enable` flag.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum EnableColumn {
    /// `BOOLEAN NOT NULL DEFAULT TRUE`
    #[default]
    Boolean,
    /// `SMALLINT NOT NULL DEFAULT 1`
    Integer,
}

impl EnableColumn {
    /// Column definition used by `CREATE TABLE`.
    pub fn column_definition(self) -> &'static str {
        match self {
            EnableColumn::Boolean => "BOOLEAN NOT NULL DEFAULT TRUE",
            EnableColumn::Integer => "SMALLINT NOT NULL DEFAULT 1",
        }
    }

    /// SQL literal an enabled row carries.
    pub fn enabled_literal(self) -> &'static str {
        match self {
            EnableColumn::Boolean => "TRUE",
            EnableColumn::Integer => "1",
        }
    }
}

/// Root settings of the `pgconf` daemon.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct DaemonConfig {
    /// Database access and polling.
    pub adapter: AdapterConfig,

    /// Admin API settings.
    pub admin: AdminConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Admin API configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct AdminConfig {
    /// Serve the admin API.
    pub enabled: bool,

    /// API key for authentication (Bearer token).
    pub api_key: String,

    /// Admin API bind address.
    pub bind_address: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_key: PLACEHOLDER_API_KEY.to_string(),
            bind_address: "127.0.0.1:2019".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adapter_defaults() {
        let config = AdapterConfig::default();
        assert_eq!(config.query_timeout(), Duration::from_secs(3));
        assert_eq!(config.lock_timeout(), Duration::from_secs(60));
        assert_eq!(config.refresh_interval(), Duration::from_secs(100));
        assert_eq!(config.sslmode, "disable");
        assert_eq!(config.table_name(), "CADDY_CONFIG");
        assert_eq!(config.enable_column, EnableColumn::Boolean);
        assert!(!config.disable_ddl);
    }

    #[test]
    fn test_host_targets_trimmed() {
        let config = AdapterConfig {
            hosts: " db1 , db2,,db3 ".to_string(),
            ..Default::default()
        };
        let labels: Vec<_> = config.host_targets().iter().map(|t| t.label().to_string()).collect();
        assert_eq!(labels, vec!["db1", "db2", "db3"]);
    }

    #[test]
    fn test_connection_string_without_hosts() {
        let config = AdapterConfig {
            connection_string: "postgres://u:p@db/cfg".to_string(),
            ..Default::default()
        };
        assert_eq!(config.host_targets(), vec![HostTarget::ConnectionString]);
        assert!(AdapterConfig::default().host_targets().is_empty());
    }

    #[test]
    fn test_port_as_number_or_string() {
        let config: AdapterConfig = serde_json::from_str(r#"{"port":"6543"}"#).unwrap();
        assert_eq!(config.port, 6543);
        let config: AdapterConfig = serde_json::from_str(r#"{"port":6544}"#).unwrap();
        assert_eq!(config.port, 6544);
        let config: AdapterConfig = serde_json::from_str(r#"{"port":""}"#).unwrap();
        assert_eq!(config.port, DEFAULT_PORT);
        assert!(serde_json::from_str::<AdapterConfig>(r#"{"port":"pg"}"#).is_err());
    }

    #[test]
    fn test_nanosecond_timeouts_take_precedence() {
        let config: AdapterConfig =
            serde_json::from_str(r#"{"query_timeout_ms":1000,"query_timeout":5000000000,"lock_timeout":120000000000}"#)
                .unwrap();
        assert_eq!(config.query_timeout(), Duration::from_secs(5));
        assert_eq!(config.lock_timeout(), Duration::from_secs(120));
    }

    #[test]
    fn test_enable_column_variants() {
        let config: AdapterConfig = serde_json::from_str(r#"{"enable_column":"integer"}"#).unwrap();
        assert_eq!(config.enable_column, EnableColumn::Integer);
        assert_eq!(config.enable_column.enabled_literal(), "1");
        assert_eq!(EnableColumn::Boolean.column_definition(), "BOOLEAN NOT NULL DEFAULT TRUE");
    }
}
