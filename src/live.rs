//! The configuration document currently in effect.
//!
//! The daemon's reload target: every accepted document is swapped in whole,
//! and readers (the admin API) always see one complete document.

use arc_swap::ArcSwap;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::refresh::{ReloadError, ReloadHandler};

#[derive(Debug)]
struct LiveInner {
    document: ArcSwap<Value>,
    bytes: ArcSwap<Vec<u8>>,
    reloads: AtomicU64,
}

/// Shared handle to the loaded document. Clones see the same state.
#[derive(Debug, Clone)]
pub struct LiveConfig {
    inner: Arc<LiveInner>,
}

impl LiveConfig {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(LiveInner {
                document: ArcSwap::from_pointee(Value::Object(Default::default())),
                bytes: ArcSwap::from_pointee(b"{}".to_vec()),
                reloads: AtomicU64::new(0),
            }),
        }
    }

    /// Load a serialized document. Anything but a JSON object is rejected
    /// and leaves the current document in place.
    pub fn apply(&self, document: Vec<u8>) -> Result<(), ReloadError> {
        let parsed: Value = serde_json::from_slice(&document)
            .map_err(|e| ReloadError(format!("invalid document: {e}")))?;
        if !parsed.is_object() {
            return Err(ReloadError("document is not a JSON object".to_string()));
        }

        self.inner.document.store(Arc::new(parsed));
        self.inner.bytes.store(Arc::new(document));
        self.inner.reloads.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    pub fn document(&self) -> Arc<Value> {
        self.inner.document.load_full()
    }

    /// Size of the loaded document as received.
    pub fn document_bytes(&self) -> usize {
        self.inner.bytes.load().len()
    }

    /// Number of documents loaded so far, the initial one included.
    pub fn reloads(&self) -> u64 {
        self.inner.reloads.load(Ordering::Relaxed)
    }
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReloadHandler for LiveConfig {
    async fn reload(&self, document: Vec<u8>) -> Result<(), ReloadError> {
        self.apply(document)?;
        tracing::info!(bytes = self.document_bytes(), reloads = self.reloads(), "Loaded new configuration");
        Ok(())
    }
}
