//! pgconf daemon.
//!
//! ```text
//!   ┌──────────────┐   query_one / query_all   ┌──────────────┐
//!   │ PostgreSQL   │◀──────────────────────────│  HostPool    │
//!   │ hosts (1..n) │        failover           │  + accessor  │
//!   └──────────────┘                           └──────┬───────┘
//!                                                     │
//!                      ┌──────────────┐       ┌───────▼──────┐
//!                      │ refresh loop │──────▶│  assembler   │
//!                      │ (version)    │       └───────┬──────┘
//!                      └──────┬───────┘               │ document
//!                             │ reload                ▼
//!                             └──────────────▶┌──────────────┐   GET /admin/*
//!                                             │  LiveConfig  │◀──────────────
//!                                             └──────────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pgconf")]
#[command(about = "Serve a configuration document stored in PostgreSQL", long_about = None)]
struct Args {
    /// Daemon settings file (TOML, or JSON with a .json extension)
    #[arg(short, long, default_value = "pgconf.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let args = Args::parse();
    pgconf::lifecycle::startup::run_from_file(&args.config).await
}
