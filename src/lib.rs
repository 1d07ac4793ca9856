//! PostgreSQL-backed configuration adapter.
//!
//! Reads a server configuration document from flattened key/value rows held
//! by one or more equivalent database hosts, and keeps the host process in
//! sync by polling a version marker.

pub mod adapter;
pub mod admin;
pub mod config;
pub mod document;
pub mod error;
pub mod lifecycle;
pub mod live;
pub mod observability;
pub mod refresh;
pub mod resilience;
pub mod store;

pub use adapter::{Adapted, Adapter};
pub use config::AdapterConfig;
pub use error::{AdapterError, Result};
pub use lifecycle::Shutdown;
pub use live::LiveConfig;
