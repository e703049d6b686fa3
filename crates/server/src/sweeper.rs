use std::sync::Arc;
use std::time::{Duration, Instant};

use infohub_core::{RateLimiter, ReceiptStore};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub receipts_expired: usize,
    pub rate_limit_entries_expired: usize,
}

pub async fn sweep_once(
    receipts: &dyn ReceiptStore,
    rate_limiter: &dyn RateLimiter,
    now: Instant,
) -> SweepReport {
    SweepReport {
        receipts_expired: receipts.sweep(now).await,
        rate_limit_entries_expired: rate_limiter.sweep(now).await,
    }
}

/// Expires dedup receipts and idle rate-limit history on a fixed interval,
/// independent of request traffic.
pub fn spawn(
    receipts: Arc<dyn ReceiptStore>,
    rate_limiter: Arc<dyn RateLimiter>,
    every: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let report = sweep_once(receipts.as_ref(), rate_limiter.as_ref(), Instant::now()).await;
            if report != SweepReport::default() {
                debug!(
                    event_name = "system.sweeper.expired",
                    correlation_id = "sweeper",
                    receipts = report.receipts_expired,
                    rate_limit_entries = report.rate_limit_entries_expired,
                    "expired in-memory state"
                );
            }
        }
    })
}
