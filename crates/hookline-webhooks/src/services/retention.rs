//! Periodic deletion of aged delivery attempt records.
//!
//! Housekeeping only; pipeline correctness never depends on it.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::audit::DeliveryLog;
use crate::store::StoreError;

/// Default record age before deletion (72 hours).
pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(72 * 3600);

/// Default interval between sweeps.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(3600);

/// Background job that purges aged audit records.
pub struct RetentionJob {
    audit: Arc<dyn DeliveryLog>,
    max_age: Duration,
    interval: Duration,
}

impl RetentionJob {
    #[must_use]
    pub fn new(audit: Arc<dyn DeliveryLog>) -> Self {
        Self {
            audit,
            max_age: DEFAULT_MAX_AGE,
            interval: DEFAULT_SWEEP_INTERVAL,
        }
    }

    /// Set the record age after which records are deleted.
    #[must_use]
    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }

    /// Set the interval between sweeps.
    #[must_use]
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Delete records older than the retention age. Returns the count.
    pub async fn purge_once(&self) -> Result<u64, StoreError> {
        let max_age = chrono::Duration::from_std(self.max_age)
            .unwrap_or_else(|_| chrono::Duration::hours(72));
        let cutoff = chrono::Utc::now() - max_age;

        let deleted = self.audit.delete_older_than(cutoff).await?;
        if deleted > 0 {
            tracing::info!(target: "retention", deleted, "Purged aged delivery records");
        }
        Ok(deleted)
    }

    /// Run periodic sweeps until shutdown.
    pub async fn run(self, shutdown: CancellationToken) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                () = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    if let Err(e) = self.purge_once().await {
                        tracing::error!(target: "retention", error = %e, "Retention sweep failed");
                    }
                }
            }
        }
    }
}
