//! Subscription CRUD handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use crate::error::ApiResult;
use crate::models::{
    CreateSubscriptionRequest, MessageResponse, SubscriptionResponse, UpdateSubscriptionRequest,
};
use crate::router::WebhooksState;

/// Register a new webhook subscription.
#[utoipa::path(
    post,
    path = "/subscriptions",
    tag = "Subscriptions",
    request_body = CreateSubscriptionRequest,
    responses(
        (status = 201, description = "Subscription created", body = SubscriptionResponse),
        (status = 400, description = "Invalid target URL or event type"),
    )
)]
pub async fn create_subscription_handler(
    State(state): State<WebhooksState>,
    Json(request): Json<CreateSubscriptionRequest>,
) -> ApiResult<(StatusCode, Json<SubscriptionResponse>)> {
    let response = state.subscriptions.create(request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// Get subscription details.
#[utoipa::path(
    get,
    path = "/subscriptions/{id}",
    tag = "Subscriptions",
    params(("id" = i64, Path, description = "Subscription ID")),
    responses(
        (status = 200, description = "Subscription details", body = SubscriptionResponse),
        (status = 404, description = "Subscription not found"),
    )
)]
pub async fn get_subscription_handler(
    State(state): State<WebhooksState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<SubscriptionResponse>> {
    let response = state.subscriptions.get(id).await?;
    Ok(Json(response))
}

/// Update an existing subscription.
#[utoipa::path(
    put,
    path = "/subscriptions/{id}",
    tag = "Subscriptions",
    params(("id" = i64, Path, description = "Subscription ID")),
    request_body = UpdateSubscriptionRequest,
    responses(
        (status = 200, description = "Updated subscription", body = SubscriptionResponse),
        (status = 404, description = "Subscription not found"),
    )
)]
pub async fn update_subscription_handler(
    State(state): State<WebhooksState>,
    Path(id): Path<i64>,
    Json(request): Json<UpdateSubscriptionRequest>,
) -> ApiResult<Json<SubscriptionResponse>> {
    let response = state.subscriptions.update(id, request).await?;
    Ok(Json(response))
}

/// Delete a subscription.
#[utoipa::path(
    delete,
    path = "/subscriptions/{id}",
    tag = "Subscriptions",
    params(("id" = i64, Path, description = "Subscription ID")),
    responses(
        (status = 200, description = "Subscription deleted", body = MessageResponse),
        (status = 404, description = "Subscription not found"),
    )
)]
pub async fn delete_subscription_handler(
    State(state): State<WebhooksState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<MessageResponse>> {
    state.subscriptions.delete(id).await?;
    Ok(Json(MessageResponse {
        message: "Subscription deleted".to_string(),
    }))
}
