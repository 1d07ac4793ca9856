//! The host's configuration-loading entry point.

use async_trait::async_trait;
use thiserror::Error;

/// The host refused a document.
#[derive(Debug, Error)]
#[error("reload rejected: {0}")]
pub struct ReloadError(pub String);

/// Receives every newly assembled document.
#[async_trait]
pub trait ReloadHandler: Send + Sync + 'static {
    async fn reload(&self, document: Vec<u8>) -> Result<(), ReloadError>;
}

#[async_trait]
impl<F> ReloadHandler for F
where
    F: Fn(Vec<u8>) -> Result<(), ReloadError> + Send + Sync + 'static,
{
    async fn reload(&self, document: Vec<u8>) -> Result<(), ReloadError> {
        self(document)
    }
}
