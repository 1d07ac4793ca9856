//! Stop signal shared by the refresh loop and the admin API.
//!
//! Each long-running task holds its own receiver and drops it on exit, so the
//! receiver count doubles as the number of tasks still winding down.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::{sleep, Instant};

const DRAIN_POLL: Duration = Duration::from_millis(20);

pub struct Shutdown {
    tx: broadcast::Sender<()>,
    triggered: AtomicBool,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self {
            tx,
            triggered: AtomicBool::new(false),
        }
    }

    /// Receiver for one task. Subscribing after the trigger misses it.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Broadcast the stop signal once. Returns false if it was already sent.
    pub fn trigger(&self, reason: &str) -> bool {
        if self.triggered.swap(true, Ordering::SeqCst) {
            return false;
        }
        let tasks = self.tx.send(()).unwrap_or(0);
        tracing::info!(reason, tasks, "Stopping background tasks");
        true
    }

    pub fn is_triggered(&self) -> bool {
        self.triggered.load(Ordering::SeqCst)
    }

    /// Tasks that still hold a receiver.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Wait until every task dropped its receiver. False if `grace` ran out.
    pub async fn drained(&self, grace: Duration) -> bool {
        let deadline = Instant::now() + grace;
        while self.receiver_count() > 0 {
            if Instant::now() >= deadline {
                tracing::warn!(remaining = self.receiver_count(), "Tasks still running after grace period");
                return false;
            }
            sleep(DRAIN_POLL).await;
        }
        true
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
