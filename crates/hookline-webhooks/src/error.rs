//! Error types for the webhook delivery system.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

use crate::store::StoreError;

/// Webhook system error variants.
#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Missing signature in payload")]
    MissingSignature,

    #[error("Missing body in payload")]
    MissingBody,

    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Event type mismatch")]
    EventTypeMismatch,

    #[error("Subscription not found")]
    SubscriptionNotFound,

    #[error("Delivery not found")]
    DeliveryNotFound,

    #[error("Invalid target URL: {0}")]
    InvalidTargetUrl(String),

    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Delivery queue is not accepting tasks")]
    QueueUnavailable,

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// JSON error response returned by the API endpoints.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status: u16,
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self {
            WebhookError::Store(_) => (StatusCode::INTERNAL_SERVER_ERROR, "storage_error"),
            WebhookError::MissingSignature => (StatusCode::BAD_REQUEST, "missing_signature"),
            WebhookError::MissingBody => (StatusCode::BAD_REQUEST, "missing_body"),
            WebhookError::InvalidSignature => (StatusCode::FORBIDDEN, "invalid_signature"),
            WebhookError::EventTypeMismatch => (StatusCode::BAD_REQUEST, "event_type_mismatch"),
            WebhookError::SubscriptionNotFound => (StatusCode::NOT_FOUND, "subscription_not_found"),
            WebhookError::DeliveryNotFound => (StatusCode::NOT_FOUND, "delivery_not_found"),
            WebhookError::InvalidTargetUrl(_) => (StatusCode::BAD_REQUEST, "invalid_target_url"),
            WebhookError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
            WebhookError::QueueUnavailable => (StatusCode::SERVICE_UNAVAILABLE, "queue_unavailable"),
            WebhookError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        };

        let body = ErrorResponse {
            error: error_type.to_string(),
            message: self.to_string(),
            status: status.as_u16(),
        };

        (status, axum::Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, WebhookError>;
