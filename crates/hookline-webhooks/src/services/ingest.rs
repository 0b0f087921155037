//! Event admission: the synchronous gate between the HTTP ingress and
//! the delivery pipeline.

use std::sync::Arc;

use crate::cache::SubscriptionCache;
use crate::crypto;
use crate::error::WebhookError;
use crate::queue::DeliveryQueue;

/// Service for admitting inbound events.
pub struct IngestService {
    cache: Arc<SubscriptionCache>,
    queue: DeliveryQueue,
}

impl IngestService {
    #[must_use]
    pub fn new(cache: Arc<SubscriptionCache>, queue: DeliveryQueue) -> Self {
        Self { cache, queue }
    }

    /// Admit one inbound event for a subscriber.
    ///
    /// Resolution, signature verification and event-type filtering all
    /// happen before the event reaches the queue; a rejected event leaves
    /// no trace in the pipeline. Returns the task identifier, the only
    /// thing the submitter ever learns about the delivery.
    pub async fn admit(
        &self,
        subscription_id: i64,
        event_type: Option<String>,
        payload: serde_json::Value,
    ) -> Result<String, WebhookError> {
        let subscription = self
            .cache
            .resolve(subscription_id)
            .await?
            .ok_or(WebhookError::SubscriptionNotFound)?;

        if let Some(ref secret) = subscription.secret {
            crypto::verify_event_signature(secret, &payload)?;
        }

        if let Some(ref expected) = subscription.event_type {
            if event_type.as_deref() != Some(expected.as_str()) {
                return Err(WebhookError::EventTypeMismatch);
            }
        }

        let task_id = self
            .queue
            .enqueue(subscription_id, payload, event_type)
            .await?;

        tracing::info!(
            target: "webhook_ingest",
            task_id = %task_id,
            subscription_id,
            "Event admitted for delivery"
        );

        Ok(task_id)
    }
}
