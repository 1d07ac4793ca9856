//! PostgreSQL host connection.
//!
//! Each host gets its own `sqlx` pool, capped in size and connection lifetime
//! so a flapping host cannot accumulate connections.

use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions, PgSslMode};
use sqlx::Connection;
use std::str::FromStr;

use crate::config::schema::HOST_PLACEHOLDER;
use crate::config::{AdapterConfig, EnableColumn, HostTarget};
use crate::store::{Connector, HostConnection, QueryError};

/// SQL text for one table. The table name comes from the validated prefix.
#[derive(Debug, Clone)]
struct Statements {
    create_table: String,
    create_index: String,
    select_latest: String,
    select_all: String,
}

impl Statements {
    fn new(table: &str, enable: EnableColumn) -> Self {
        let enabled = enable.enabled_literal();
        Self {
            create_table: format!(
                "CREATE TABLE IF NOT EXISTS {table} (
    id SERIAL PRIMARY KEY,
    key VARCHAR(255) NOT NULL,
    value TEXT,
    enable {},
    created TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
    updated TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
)",
                enable.column_definition()
            ),
            create_index: format!("CREATE INDEX IF NOT EXISTS {table}_key_idx ON {table} (key)"),
            select_latest: format!(
                "SELECT value FROM {table} WHERE key = $1 AND enable = {enabled} ORDER BY created DESC, id DESC LIMIT 1"
            ),
            select_all: format!(
                "SELECT value FROM {table} WHERE key = $1 AND enable = {enabled} ORDER BY created DESC, id DESC"
            ),
        }
    }
}

/// A PostgreSQL replica of the config table.
#[derive(Debug, Clone)]
pub struct PgHost {
    label: String,
    pool: PgPool,
    statements: Statements,
}

impl PgHost {
    /// Build a lazily-connecting host. Nothing touches the network until the
    /// first probe or query.
    pub fn open(config: &AdapterConfig, target: &HostTarget) -> Result<Self, QueryError> {
        let options = connect_options(config, target)?;
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(0)
            .max_lifetime(config.conn_max_lifetime())
            .idle_timeout(config.conn_max_lifetime())
            .acquire_timeout(config.query_timeout())
            .connect_lazy_with(options);

        Ok(Self {
            label: target.label().to_string(),
            pool,
            statements: Statements::new(&config.table_name(), config.enable_column),
        })
    }
}

/// Connection options for one host.
///
/// A connection string wins over the individual fields; its first `{host}`
/// is replaced with the host name.
fn connect_options(config: &AdapterConfig, target: &HostTarget) -> Result<PgConnectOptions, QueryError> {
    if !config.connection_string.is_empty() {
        let url = match target {
            HostTarget::Named(host) => config.connection_string.replacen(HOST_PLACEHOLDER, host, 1),
            HostTarget::ConnectionString => config.connection_string.clone(),
        };
        return Ok(PgConnectOptions::from_str(&url)?);
    }

    let mut options = PgConnectOptions::new()
        .host(target.label())
        .port(config.port)
        .ssl_mode(PgSslMode::from_str(&config.sslmode)?);
    if !config.user.is_empty() {
        options = options.username(&config.user);
    }
    if !config.password.is_empty() {
        options = options.password(&config.password);
    }
    if !config.dbname.is_empty() {
        options = options.database(&config.dbname);
    }
    Ok(options)
}

#[async_trait]
impl HostConnection for PgHost {
    fn label(&self) -> &str {
        &self.label
    }

    async fn ping(&self) -> Result<(), QueryError> {
        let mut conn = self.pool.acquire().await?;
        conn.ping().await?;
        Ok(())
    }

    async fn fetch_latest(&self, key: &str) -> Result<Option<String>, QueryError> {
        let value: Option<Option<String>> = sqlx::query_scalar(&self.statements.select_latest)
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(value.flatten())
    }

    async fn fetch_all(&self, key: &str) -> Result<Vec<String>, QueryError> {
        let values: Vec<Option<String>> = sqlx::query_scalar(&self.statements.select_all)
            .bind(key)
            .fetch_all(&self.pool)
            .await?;
        Ok(values.into_iter().flatten().collect())
    }

    async fn ensure_schema(&self) -> Result<(), QueryError> {
        sqlx::query(&self.statements.create_table).execute(&self.pool).await?;
        sqlx::query(&self.statements.create_index).execute(&self.pool).await?;
        Ok(())
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

/// Opens [`PgHost`]s.
#[derive(Debug, Default, Clone, Copy)]
pub struct PgConnector;

#[async_trait]
impl Connector for PgConnector {
    type Host = PgHost;

    async fn open(&self, config: &AdapterConfig, target: &HostTarget) -> Result<PgHost, QueryError> {
        PgHost::open(config, target)
    }
}
