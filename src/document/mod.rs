//! Configuration document subsystem.
//!
//! # Data Flow
//! ```text
//! section.rs: config, config.admin, config.logging, config.storage, config.apps
//!     → KvAccessor::query_one for each
//!     → decode into model.rs skeleton (typed or raw fragment)
//! http.rs: apps.http decoded into servers → routes
//!     → KvAccessor::query_all("config.apps.http.servers.<name>.routes")
//!     → rows replace that server's routes, http re-encoded
//! assembler.rs: serialize ServerConfig → bytes
//! ```
//!
//! # Design Decisions
//! - Routes are the high-churn part of a config, so they live one row per
//!   route instead of inside the apps blob
//! - Unknown fields survive a decode/encode cycle

pub mod assembler;
pub mod http;
pub mod model;
pub mod section;

pub use assembler::Assembler;
pub use http::{routes_key, HttpApp, HttpServer, Route};
pub use model::{AdminSection, LoggingSection, ServerConfig};
pub use section::{DecodeStrategy, Section};
