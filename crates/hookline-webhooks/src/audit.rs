//! Append-only audit log of delivery attempts.
//!
//! Every attempt a worker makes, successful or not, produces exactly
//! one record here. Records are never mutated or deleted individually;
//! the only deletion path is the bulk retention sweep.

use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tokio::sync::RwLock;

use crate::models::{DeliveryAttempt, NewDeliveryAttempt};
use crate::store::StoreError;

/// Port to the delivery audit log.
#[async_trait]
pub trait DeliveryLog: Send + Sync {
    /// Append one attempt record and return the stored row.
    async fn append(&self, attempt: NewDeliveryAttempt) -> Result<DeliveryAttempt, StoreError>;

    /// The record with the highest attempt number for a task, terminal
    /// record preferred on ties.
    async fn find_latest_by_task(
        &self,
        task_id: &str,
    ) -> Result<Option<DeliveryAttempt>, StoreError>;

    /// The most recent records for a subscription, newest first, bounded
    /// by `limit`.
    async fn list_recent_by_subscription(
        &self,
        subscription_id: i64,
        limit: i64,
    ) -> Result<Vec<DeliveryAttempt>, StoreError>;

    /// Bulk-delete records older than `cutoff`. Returns the count removed.
    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64, StoreError>;
}

// ---------------------------------------------------------------------------
// Postgres implementation
// ---------------------------------------------------------------------------

const ATTEMPT_COLUMNS: &str = "id, task_id, subscription_id, target_url, payload, \
     attempt_number, status, status_code, error_message, timestamp";

/// Postgres-backed delivery log.
pub struct PgDeliveryLog {
    pool: PgPool,
}

impl PgDeliveryLog {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DeliveryLog for PgDeliveryLog {
    async fn append(&self, attempt: NewDeliveryAttempt) -> Result<DeliveryAttempt, StoreError> {
        let query = format!(
            r"
            INSERT INTO delivery_attempts (
                task_id, subscription_id, target_url, payload,
                attempt_number, status, status_code, error_message
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {ATTEMPT_COLUMNS}
            "
        );
        let record = sqlx::query_as::<_, DeliveryAttempt>(&query)
            .bind(&attempt.task_id)
            .bind(attempt.subscription_id)
            .bind(&attempt.target_url)
            .bind(&attempt.payload)
            .bind(attempt.attempt_number)
            .bind(attempt.status.as_str())
            .bind(attempt.status_code)
            .bind(&attempt.error_message)
            .fetch_one(&self.pool)
            .await?;
        Ok(record)
    }

    async fn find_latest_by_task(
        &self,
        task_id: &str,
    ) -> Result<Option<DeliveryAttempt>, StoreError> {
        // The terminal record shares its attempt number with the last
        // failed attempt; the id tiebreak keeps the terminal row on top.
        let query = format!(
            r"
            SELECT {ATTEMPT_COLUMNS} FROM delivery_attempts
            WHERE task_id = $1
            ORDER BY attempt_number DESC, id DESC
            LIMIT 1
            "
        );
        let record = sqlx::query_as::<_, DeliveryAttempt>(&query)
            .bind(task_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(record)
    }

    async fn list_recent_by_subscription(
        &self,
        subscription_id: i64,
        limit: i64,
    ) -> Result<Vec<DeliveryAttempt>, StoreError> {
        let query = format!(
            r"
            SELECT {ATTEMPT_COLUMNS} FROM delivery_attempts
            WHERE subscription_id = $1
            ORDER BY timestamp DESC, id DESC
            LIMIT $2
            "
        );
        let records = sqlx::query_as::<_, DeliveryAttempt>(&query)
            .bind(subscription_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(records)
    }

    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM delivery_attempts WHERE timestamp < $1")
            .bind(cutoff)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

// ---------------------------------------------------------------------------
// In-memory implementation
// ---------------------------------------------------------------------------

/// In-memory delivery log for tests and dev mode.
pub struct InMemoryDeliveryLog {
    inner: RwLock<Vec<DeliveryAttempt>>,
    next_id: AtomicI64,
}

impl Default for InMemoryDeliveryLog {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryDeliveryLog {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Vec::new()),
            next_id: AtomicI64::new(1),
        }
    }

    /// All records for a task, ordered by attempt number then insertion.
    pub async fn attempts_for_task(&self, task_id: &str) -> Vec<DeliveryAttempt> {
        let mut records: Vec<_> = self
            .inner
            .read()
            .await
            .iter()
            .filter(|r| r.task_id == task_id)
            .cloned()
            .collect();
        records.sort_by_key(|r| (r.attempt_number, r.id));
        records
    }

    /// Total number of records in the log.
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Returns true when the log holds no records.
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}

#[async_trait]
impl DeliveryLog for InMemoryDeliveryLog {
    async fn append(&self, attempt: NewDeliveryAttempt) -> Result<DeliveryAttempt, StoreError> {
        let record = DeliveryAttempt {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            task_id: attempt.task_id,
            subscription_id: attempt.subscription_id,
            target_url: attempt.target_url,
            payload: attempt.payload,
            attempt_number: attempt.attempt_number,
            status: attempt.status.as_str().to_string(),
            status_code: attempt.status_code,
            error_message: attempt.error_message,
            timestamp: Utc::now(),
        };
        self.inner.write().await.push(record.clone());
        Ok(record)
    }

    async fn find_latest_by_task(
        &self,
        task_id: &str,
    ) -> Result<Option<DeliveryAttempt>, StoreError> {
        let latest = self
            .inner
            .read()
            .await
            .iter()
            .filter(|r| r.task_id == task_id)
            .max_by_key(|r| (r.attempt_number, r.id))
            .cloned();
        Ok(latest)
    }

    async fn list_recent_by_subscription(
        &self,
        subscription_id: i64,
        limit: i64,
    ) -> Result<Vec<DeliveryAttempt>, StoreError> {
        let mut records: Vec<_> = self
            .inner
            .read()
            .await
            .iter()
            .filter(|r| r.subscription_id == subscription_id)
            .cloned()
            .collect();
        records.sort_by(|a, b| (b.timestamp, b.id).cmp(&(a.timestamp, a.id)));
        records.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(records)
    }

    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64, StoreError> {
        let mut inner = self.inner.write().await;
        let before = inner.len();
        inner.retain(|r| r.timestamp >= cutoff);
        Ok((before - inner.len()) as u64)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
