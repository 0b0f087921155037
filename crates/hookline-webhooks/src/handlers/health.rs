//! Service health handler.

use axum::extract::State;
use axum::Json;
use chrono::Utc;

use crate::models::HealthResponse;
use crate::router::WebhooksState;
use crate::store::SubscriptionStore;

/// Report component health.
#[utoipa::path(
    get,
    path = "/health",
    tag = "System",
    responses((status = 200, description = "Component health", body = HealthResponse))
)]
pub async fn health_handler(State(state): State<WebhooksState>) -> Json<HealthResponse> {
    let database = match state.store.ping().await {
        Ok(()) => "healthy",
        Err(_) => "unhealthy",
    };

    Json(HealthResponse {
        database: database.to_string(),
        timestamp: Utc::now(),
    })
}
