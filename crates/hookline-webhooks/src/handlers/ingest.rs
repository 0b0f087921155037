//! Event ingress handler.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use utoipa::IntoParams;

use crate::error::ApiResult;
use crate::models::IngestResponse;
use crate::router::WebhooksState;

/// Query parameters for event submission.
#[derive(Debug, Deserialize, IntoParams)]
pub struct IngestQuery {
    /// Declared type of the inbound event, matched against the
    /// subscription's filter when one is configured.
    pub event_type: Option<String>,
}

/// Accept an inbound event and queue it for delivery.
///
/// The response carries only the task identifier; delivery runs
/// asynchronously and its outcome is visible on the status surface.
#[utoipa::path(
    post,
    path = "/ingest/{subscription_id}",
    tag = "Ingest",
    params(
        ("subscription_id" = i64, Path, description = "Subscription ID"),
        IngestQuery,
    ),
    responses(
        (status = 200, description = "Event queued for delivery", body = IngestResponse),
        (status = 400, description = "Missing signature/body or event type mismatch"),
        (status = 403, description = "Invalid signature"),
        (status = 404, description = "Subscription not found"),
    )
)]
pub async fn ingest_handler(
    State(state): State<WebhooksState>,
    Path(subscription_id): Path<i64>,
    Query(query): Query<IngestQuery>,
    Json(payload): Json<serde_json::Value>,
) -> ApiResult<Json<IngestResponse>> {
    let task_id = state
        .ingest
        .admit(subscription_id, query.event_type, payload)
        .await?;

    Ok(Json(IngestResponse {
        message: "Webhook queued for delivery".to_string(),
        task_id,
    }))
}
