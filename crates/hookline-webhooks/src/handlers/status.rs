//! Delivery status and history handlers.

use axum::extract::{Path, State};
use axum::Json;

use crate::audit::DeliveryLog;
use crate::error::{ApiResult, WebhookError};
use crate::models::{DeliveryAttempt, DeliveryAttemptResponse};
use crate::router::WebhooksState;
use crate::store::SubscriptionStore;

/// Most recent attempts returned for a subscription.
const RECENT_DELIVERIES_LIMIT: i64 = 20;

/// Get the latest delivery attempt for a task.
#[utoipa::path(
    get,
    path = "/status/{task_id}",
    tag = "Deliveries",
    params(("task_id" = String, Path, description = "Task ID returned at ingest")),
    responses(
        (status = 200, description = "Latest delivery attempt", body = DeliveryAttemptResponse),
        (status = 404, description = "No attempts recorded for this task"),
    )
)]
pub async fn get_delivery_status_handler(
    State(state): State<WebhooksState>,
    Path(task_id): Path<String>,
) -> ApiResult<Json<DeliveryAttemptResponse>> {
    let attempt = state
        .audit
        .find_latest_by_task(&task_id)
        .await?
        .ok_or(WebhookError::DeliveryNotFound)?;

    Ok(Json(attempt_to_response(attempt)))
}

/// List recent delivery attempts for a subscription, newest first.
#[utoipa::path(
    get,
    path = "/subscriptions/{id}/deliveries",
    tag = "Deliveries",
    params(("id" = i64, Path, description = "Subscription ID")),
    responses(
        (status = 200, description = "Recent delivery attempts", body = [DeliveryAttemptResponse]),
        (status = 404, description = "Subscription not found"),
    )
)]
pub async fn list_deliveries_handler(
    State(state): State<WebhooksState>,
    Path(subscription_id): Path<i64>,
) -> ApiResult<Json<Vec<DeliveryAttemptResponse>>> {
    // The history read goes against the durable store, not the cache.
    state
        .store
        .get(subscription_id)
        .await?
        .ok_or(WebhookError::SubscriptionNotFound)?;

    let attempts = state
        .audit
        .list_recent_by_subscription(subscription_id, RECENT_DELIVERIES_LIMIT)
        .await?;

    Ok(Json(attempts.into_iter().map(attempt_to_response).collect()))
}

/// Convert an audit record to its API representation. The payload itself
/// stays internal.
fn attempt_to_response(attempt: DeliveryAttempt) -> DeliveryAttemptResponse {
    DeliveryAttemptResponse {
        id: attempt.id,
        task_id: attempt.task_id,
        subscription_id: attempt.subscription_id,
        target_url: attempt.target_url,
        attempt_number: attempt.attempt_number,
        status: attempt.status,
        status_code: attempt.status_code,
        error_message: attempt.error_message,
        timestamp: attempt.timestamp,
    }
}
