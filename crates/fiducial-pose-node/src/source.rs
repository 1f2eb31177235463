//! Reference-counted subscription to the upstream camera channels.
//!
//! Intake starts when the first consumer attaches and stops when the last
//! one detaches, so the pipeline imposes no bandwidth cost while idle. The
//! guard is RAII: it balances on every path, including request timeouts.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use log::info;

/// Counts attached consumers of the synchronized frame stream.
#[derive(Debug, Default)]
pub struct SubscriptionCounter {
    count: AtomicUsize,
}

impl SubscriptionCounter {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Attach a consumer. Drop the returned guard to detach.
    pub fn subscribe(self: &Arc<Self>) -> SubscriptionGuard {
        let now = self.count.fetch_add(1, Ordering::SeqCst) + 1;
        info!("subscribed to camera channels ({now} consumers)");
        SubscriptionGuard {
            counter: Arc::clone(self),
        }
    }

    /// Number of currently attached consumers.
    pub fn active(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

/// RAII handle for one attached consumer.
pub struct SubscriptionGuard {
    counter: Arc<SubscriptionCounter>,
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        let left = self.counter.count.fetch_sub(1, Ordering::SeqCst) - 1;
        info!("unsubscribed from camera channels ({left} consumers)");
    }
}
