//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! pool / accessor / assembler / refresh loop produce:
//!     → tracing events (retries, failovers, decode failures, ticks)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → logging.rs subscriber (stdout)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Logging is a side channel; nothing branches on whether it succeeded
//! - Metrics are cheap (atomic increments) and no-ops without a recorder

pub mod logging;
pub mod metrics;
