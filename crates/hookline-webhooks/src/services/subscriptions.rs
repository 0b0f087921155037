//! Subscription CRUD business logic.

use std::sync::Arc;

use crate::error::WebhookError;
use crate::models::{
    CreateSubscription, CreateSubscriptionRequest, Subscription, SubscriptionResponse,
    UpdateSubscription, UpdateSubscriptionRequest,
};
use crate::store::SubscriptionStore;
use crate::validation;

/// Service for subscription management.
pub struct SubscriptionService {
    store: Arc<dyn SubscriptionStore>,
}

impl SubscriptionService {
    #[must_use]
    pub fn new(store: Arc<dyn SubscriptionStore>) -> Self {
        Self { store }
    }

    /// Register a new subscription.
    pub async fn create(
        &self,
        request: CreateSubscriptionRequest,
    ) -> Result<SubscriptionResponse, WebhookError> {
        validation::validate_target_url(&request.target_url)?;
        if let Some(ref event_type) = request.event_type {
            validation::validate_event_type(event_type)?;
        }

        let input = CreateSubscription {
            target_url: request.target_url,
            secret: normalize_secret(request.secret),
            event_type: request.event_type,
        };

        let subscription = self.store.create(input).await?;
        tracing::info!(
            target: "subscriptions",
            subscription_id = subscription.id,
            "Subscription created"
        );
        Ok(subscription_to_response(subscription))
    }

    /// Fetch one subscription.
    pub async fn get(&self, id: i64) -> Result<SubscriptionResponse, WebhookError> {
        let subscription = self
            .store
            .get(id)
            .await?
            .ok_or(WebhookError::SubscriptionNotFound)?;
        Ok(subscription_to_response(subscription))
    }

    /// Apply a partial update; absent fields keep their current values.
    pub async fn update(
        &self,
        id: i64,
        request: UpdateSubscriptionRequest,
    ) -> Result<SubscriptionResponse, WebhookError> {
        if let Some(ref target_url) = request.target_url {
            validation::validate_target_url(target_url)?;
        }
        if let Some(ref event_type) = request.event_type {
            validation::validate_event_type(event_type)?;
        }

        let input = UpdateSubscription {
            target_url: request.target_url,
            secret: normalize_secret(request.secret),
            event_type: request.event_type,
        };

        let subscription = self
            .store
            .update(id, input)
            .await?
            .ok_or(WebhookError::SubscriptionNotFound)?;
        Ok(subscription_to_response(subscription))
    }

    /// Delete a subscription.
    pub async fn delete(&self, id: i64) -> Result<(), WebhookError> {
        let deleted = self.store.delete(id).await?;
        if !deleted {
            return Err(WebhookError::SubscriptionNotFound);
        }
        tracing::info!(target: "subscriptions", subscription_id = id, "Subscription deleted");
        Ok(())
    }
}

/// Treat an empty secret as no secret at all.
fn normalize_secret(secret: Option<String>) -> Option<String> {
    secret.filter(|s| !s.is_empty())
}

/// Convert a stored row to an API response.
fn subscription_to_response(subscription: Subscription) -> SubscriptionResponse {
    SubscriptionResponse {
        id: subscription.id,
        target_url: subscription.target_url,
        event_type: subscription.event_type,
        created_at: subscription.created_at,
    }
}
