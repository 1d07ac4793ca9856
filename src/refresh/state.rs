//! Last applied configuration version.

use arc_swap::ArcSwap;
use std::sync::Arc;

/// Version assumed before anything has been read.
pub const INITIAL_VERSION: &str = "0";

/// Key of the version marker row.
pub const VERSION_KEY: &str = "version";

/// The version of the configuration the host is currently running.
///
/// Readers never block; only the refresh loop (and the adapter, once at
/// startup) store into it.
#[derive(Debug)]
pub struct VersionState {
    current: ArcSwap<String>,
}

impl VersionState {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            current: ArcSwap::from_pointee(version.into()),
        }
    }

    pub fn get(&self) -> Arc<String> {
        self.current.load_full()
    }

    pub fn set(&self, version: impl Into<String>) {
        self.current.store(Arc::new(version.into()));
    }

    /// True if `candidate` differs from the stored version.
    pub fn differs(&self, candidate: &str) -> bool {
        self.current.load().as_str() != candidate
    }
}

impl Default for VersionState {
    fn default() -> Self {
        Self::new(INITIAL_VERSION)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_state() {
        let state = VersionState::default();
        assert_eq!(state.get().as_str(), INITIAL_VERSION);
        assert!(!state.differs("0"));
        assert!(state.differs("1"));

        state.set("1");
        assert_eq!(state.get().as_str(), "1");
        assert!(!state.differs("1"));
    }
}
