//! Durable subscription storage.
//!
//! `SubscriptionStore` is the seam between the delivery pipeline and the
//! system that owns subscription records: the pipeline only ever reads
//! (`get`), while the CRUD surface uses the write operations. Two
//! implementations are provided: Postgres for production and an
//! in-memory store for tests and the database-less dev mode.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use tokio::sync::RwLock;

use crate::models::{CreateSubscription, Subscription, UpdateSubscription};

/// Errors raised by the storage layer.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Port to the durable subscription store.
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    /// Fetch one subscription by id.
    async fn get(&self, id: i64) -> Result<Option<Subscription>, StoreError>;

    /// Insert a new subscription and return the stored row.
    async fn create(&self, input: CreateSubscription) -> Result<Subscription, StoreError>;

    /// Apply a partial update. Returns `None` when the id is unknown.
    async fn update(
        &self,
        id: i64,
        input: UpdateSubscription,
    ) -> Result<Option<Subscription>, StoreError>;

    /// Delete a subscription. Returns whether a row was removed.
    async fn delete(&self, id: i64) -> Result<bool, StoreError>;

    /// Cheap reachability probe for health reporting.
    async fn ping(&self) -> Result<(), StoreError>;
}

// ---------------------------------------------------------------------------
// Postgres implementation
// ---------------------------------------------------------------------------

const SUBSCRIPTION_COLUMNS: &str = "id, target_url, secret, event_type, created_at";

/// Postgres-backed subscription store.
pub struct PgSubscriptionStore {
    pool: PgPool,
}

impl PgSubscriptionStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubscriptionStore for PgSubscriptionStore {
    async fn get(&self, id: i64) -> Result<Option<Subscription>, StoreError> {
        let query =
            format!("SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions WHERE id = $1");
        let sub = sqlx::query_as::<_, Subscription>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(sub)
    }

    async fn create(&self, input: CreateSubscription) -> Result<Subscription, StoreError> {
        let query = format!(
            r"
            INSERT INTO subscriptions (target_url, secret, event_type)
            VALUES ($1, $2, $3)
            RETURNING {SUBSCRIPTION_COLUMNS}
            "
        );
        let sub = sqlx::query_as::<_, Subscription>(&query)
            .bind(&input.target_url)
            .bind(&input.secret)
            .bind(&input.event_type)
            .fetch_one(&self.pool)
            .await?;
        Ok(sub)
    }

    async fn update(
        &self,
        id: i64,
        input: UpdateSubscription,
    ) -> Result<Option<Subscription>, StoreError> {
        let query = format!(
            r"
            UPDATE subscriptions
            SET target_url = COALESCE($2, target_url),
                secret = COALESCE($3, secret),
                event_type = COALESCE($4, event_type)
            WHERE id = $1
            RETURNING {SUBSCRIPTION_COLUMNS}
            "
        );
        let sub = sqlx::query_as::<_, Subscription>(&query)
            .bind(id)
            .bind(&input.target_url)
            .bind(&input.secret)
            .bind(&input.event_type)
            .fetch_optional(&self.pool)
            .await?;
        Ok(sub)
    }

    async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM subscriptions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// In-memory implementation
// ---------------------------------------------------------------------------

/// In-memory subscription store for tests and dev mode.
pub struct InMemorySubscriptionStore {
    inner: RwLock<HashMap<i64, Subscription>>,
    next_id: AtomicI64,
    reads: AtomicU64,
}

impl Default for InMemorySubscriptionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemorySubscriptionStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
            next_id: AtomicI64::new(1),
            reads: AtomicU64::new(0),
        }
    }

    /// Number of `get` calls served so far.
    pub fn read_count(&self) -> u64 {
        self.reads.load(Ordering::SeqCst)
    }

    /// Insert a subscription with a preassigned id (test fixtures).
    pub async fn insert(&self, subscription: Subscription) {
        self.next_id.fetch_max(subscription.id + 1, Ordering::SeqCst);
        self.inner
            .write()
            .await
            .insert(subscription.id, subscription);
    }
}

#[async_trait]
impl SubscriptionStore for InMemorySubscriptionStore {
    async fn get(&self, id: i64) -> Result<Option<Subscription>, StoreError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.inner.read().await.get(&id).cloned())
    }

    async fn create(&self, input: CreateSubscription) -> Result<Subscription, StoreError> {
        let subscription = Subscription {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            target_url: input.target_url,
            secret: input.secret,
            event_type: input.event_type,
            created_at: Utc::now(),
        };
        self.inner
            .write()
            .await
            .insert(subscription.id, subscription.clone());
        Ok(subscription)
    }

    async fn update(
        &self,
        id: i64,
        input: UpdateSubscription,
    ) -> Result<Option<Subscription>, StoreError> {
        let mut inner = self.inner.write().await;
        let Some(existing) = inner.get_mut(&id) else {
            return Ok(None);
        };

        if let Some(target_url) = input.target_url {
            existing.target_url = target_url;
        }
        if let Some(secret) = input.secret {
            existing.secret = Some(secret);
        }
        if let Some(event_type) = input.event_type {
            existing.event_type = Some(event_type);
        }

        Ok(Some(existing.clone()))
    }

    async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        Ok(self.inner.write().await.remove(&id).is_some())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
