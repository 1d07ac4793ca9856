//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! adapter body (JSON)            daemon settings (TOML/JSON)
//!     → loader.rs                    → loader.rs
//!     → validation.rs                → validation.rs (adapter section)
//!     → AdapterConfig                → DaemonConfig
//!     → adapter / pool / refresh     → lifecycle::startup
//! ```
//!
//! # Design Decisions
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - The table prefix is validated because it is spliced into SQL text

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_adapter_config, ConfigError};
pub use schema::{
    AdapterConfig, AdminConfig, DaemonConfig, EnableColumn, HostTarget, ObservabilityConfig,
};
pub use validation::ValidationError;
