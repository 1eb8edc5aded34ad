// src/crawl/gate.rs
// =============================================================================
// RateGate: turns an hourly call quota into a fixed pause before every call.
//
// hits_per_hour = 180  ->  3_600_000 / 180 = 20_000 ms between calls
//
// The pause races against the cancel signal, so a crawl stopped by its
// deadline notices within one interval at most.
// =============================================================================

use std::time::Duration;
use tracing::trace;

use super::CancelSignal;
use crate::error::ConfigError;

const MILLIS_PER_HOUR: u64 = 3_600_000;

/// Returned from `wait()` when the crawl was cancelled during the pause
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cancelled;

#[derive(Debug, Clone)]
pub struct RateGate {
    interval: Duration,
    cancel: CancelSignal,
}

impl RateGate {
    // Builds the gate; a zero quota is rejected here, before the crawl starts,
    // never inside wait().
    pub fn new(hits_per_hour: u32, cancel: CancelSignal) -> Result<Self, ConfigError> {
        if hits_per_hour == 0 {
            return Err(ConfigError::ZeroRate);
        }
        Ok(Self {
            interval: Duration::from_millis(MILLIS_PER_HOUR / u64::from(hits_per_hour)),
            cancel,
        })
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Blocks for one interval. Call immediately before every remote call.
    pub async fn wait(&self) -> Result<(), Cancelled> {
        if self.cancel.is_cancelled() {
            return Err(Cancelled);
        }
        trace!(interval_ms = self.interval.as_millis() as u64, "rate gate");

        // `biased` polls the cancel branch first: when the pause has elapsed
        // and the deadline has fired by the time we are polled, cancellation
        // must win, otherwise a call would go out after the deadline.
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(Cancelled),
            _ = tokio::time::sleep(self.interval) => Ok(()),
        }
    }
}
