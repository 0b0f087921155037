//! Read-through cache of subscriber delivery configuration.
//!
//! Cache-aside over the subscription store: hits inside the validity
//! window never touch durable storage; misses read through and populate.
//! An entry may be served stale for up to the window after the
//! subscription is updated or deleted upstream. That window is part of
//! the contract, and there is no invalidation-on-write.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;

use crate::models::Subscription;
use crate::store::{StoreError, SubscriptionStore};

/// Default validity window for cached subscriptions (1 hour).
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(3600);

struct CacheEntry {
    subscription: Subscription,
    expires_at: Instant,
}

/// TTL-bounded subscription cache.
pub struct SubscriptionCache {
    store: Arc<dyn SubscriptionStore>,
    entries: RwLock<HashMap<i64, CacheEntry>>,
    ttl: Duration,
}

impl SubscriptionCache {
    #[must_use]
    pub fn new(store: Arc<dyn SubscriptionStore>) -> Self {
        Self {
            store,
            entries: RwLock::new(HashMap::new()),
            ttl: DEFAULT_CACHE_TTL,
        }
    }

    /// Set the validity window for cached entries.
    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Resolve a subscription, preferring the cached projection.
    ///
    /// A not-found result is never cached. Concurrent resolves of the
    /// same id may each read the store once; re-population is idempotent.
    pub async fn resolve(&self, id: i64) -> Result<Option<Subscription>, StoreError> {
        {
            let entries = self.entries.read().await;
            if let Some(entry) = entries.get(&id) {
                if entry.expires_at > Instant::now() {
                    return Ok(Some(entry.subscription.clone()));
                }
            }
        }

        match self.store.get(id).await? {
            Some(subscription) => {
                let entry = CacheEntry {
                    subscription: subscription.clone(),
                    expires_at: Instant::now() + self.ttl,
                };
                self.entries.write().await.insert(id, entry);
                Ok(Some(subscription))
            }
            None => {
                // Drop any expired leftover for the id so the map does
                // not accumulate dead entries.
                self.entries.write().await.remove(&id);
                Ok(None)
            }
        }
    }
}
