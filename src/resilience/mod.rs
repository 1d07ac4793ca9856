//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Query on current host:
//!     → timeouts.rs (enforce per-call deadline)
//!     → On failure: store::accessor advances the pool and retries
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every external call has a deadline
//! - Retries are bounded by the host count, with no backoff between hosts
//! - A fully down pool is retried at the next poll interval, not spun on

pub mod timeouts;
