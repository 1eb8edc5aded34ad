// src/crawl/cancel.rs
// =============================================================================
// A single-fire cancellation signal shared between the deadline timer task
// and the crawl task.
//
// - is_crawling(): cheap atomic poll, checked before every remote call
// - cancelled(): a future that resolves once cancel() has been called,
//   used to interrupt the rate gate's sleep
//
// cancel() flips the flag exactly once; later calls are no-ops.
// =============================================================================

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

#[derive(Debug, Default)]
struct Inner {
    cancelled: AtomicBool,
    notify: Notify,
}

/// Cloneable handle; all clones observe the same signal
#[derive(Debug, Clone, Default)]
pub struct CancelSignal {
    inner: Arc<Inner>,
}

impl CancelSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fires the signal. Returns true only for the call that actually fired it.
    pub fn cancel(&self) -> bool {
        let first = !self.inner.cancelled.swap(true, Ordering::SeqCst);
        if first {
            self.inner.notify.notify_waiters();
        }
        first
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    pub fn is_crawling(&self) -> bool {
        !self.is_cancelled()
    }

    /// Resolves once the signal has fired (immediately if it already has)
    pub async fn cancelled(&self) {
        loop {
            // Register interest before checking the flag so a cancel() that
            // lands in between is not missed
            let notified = self.inner.notify.notified();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }
}
