//! Axum router setup for the webhook service.

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;

use crate::audit::DeliveryLog;
use crate::cache::SubscriptionCache;
use crate::handlers::{health, ingest, status, subscriptions};
use crate::queue::DeliveryQueue;
use crate::services::ingest::IngestService;
use crate::services::subscriptions::SubscriptionService;
use crate::store::SubscriptionStore;

/// Shared state for the webhook handlers.
#[derive(Clone)]
pub struct WebhooksState {
    pub subscriptions: Arc<SubscriptionService>,
    pub ingest: Arc<IngestService>,
    pub store: Arc<dyn SubscriptionStore>,
    pub audit: Arc<dyn DeliveryLog>,
}

impl WebhooksState {
    /// Wire the services over the shared store, cache, audit log and queue.
    #[must_use]
    pub fn new(
        store: Arc<dyn SubscriptionStore>,
        audit: Arc<dyn DeliveryLog>,
        cache: Arc<SubscriptionCache>,
        queue: DeliveryQueue,
    ) -> Self {
        Self {
            subscriptions: Arc::new(SubscriptionService::new(Arc::clone(&store))),
            ingest: Arc::new(IngestService::new(cache, queue)),
            store,
            audit,
        }
    }
}

/// Creates the webhook router with all routes.
pub fn webhooks_router(state: WebhooksState) -> Router {
    Router::new()
        // Subscription CRUD
        .route(
            "/subscriptions",
            post(subscriptions::create_subscription_handler),
        )
        .route(
            "/subscriptions/:id",
            get(subscriptions::get_subscription_handler)
                .put(subscriptions::update_subscription_handler)
                .delete(subscriptions::delete_subscription_handler),
        )
        // Event ingress
        .route("/ingest/:subscription_id", post(ingest::ingest_handler))
        // Delivery tracking
        .route("/status/:task_id", get(status::get_delivery_status_handler))
        .route(
            "/subscriptions/:id/deliveries",
            get(status::list_deliveries_handler),
        )
        // System
        .route("/health", get(health::health_handler))
        .with_state(state)
}
