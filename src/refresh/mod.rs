//! Configuration refresh subsystem.
//!
//! # Data Flow
//! ```text
//! every refresh_interval:
//!     KvAccessor::query_one("version")
//!         → equal to VersionState → nothing
//!         → different → Assembler::assemble
//!             → ReloadHandler::reload(document)
//!             → VersionState::set(new version)
//! ```
//!
//! # Design Decisions
//! - The version marker is an opaque string; any change triggers a reload
//! - One loop per adapted configuration, stopped by the shutdown broadcast

pub mod poller;
pub mod reload;
pub mod state;

pub use poller::{RefreshLoop, TickOutcome};
pub use reload::{ReloadError, ReloadHandler};
pub use state::{VersionState, INITIAL_VERSION, VERSION_KEY};
