//! Timeout enforcement.
//!
//! # Responsibilities
//! - Wrap host probes, queries and DDL with a deadline
//! - Turn an elapsed deadline into a regular [`QueryError`]
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities
//! - Timeout errors are distinct from database errors but retried the same way

use std::future::Future;
use std::time::Duration;
use tokio::time::timeout;

use crate::store::QueryError;

/// Run a host operation with a deadline.
pub async fn bounded<T, F>(limit: Duration, operation: F) -> Result<T, QueryError>
where
    F: Future<Output = Result<T, QueryError>>,
{
    match timeout(limit, operation).await {
        Ok(result) => result,
        Err(_) => Err(QueryError::Timeout(limit)),
    }
}
