//! Domain and API models for subscriptions and delivery tracking.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

// ---------------------------------------------------------------------------
// Delivery outcome states
// ---------------------------------------------------------------------------

/// Outcome of a single delivery attempt.
///
/// `Success` and `Failure` are terminal: once either is recorded for a
/// task, no further attempts follow. `FailedAttempt` feeds the retry loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryStatus {
    /// The subscriber endpoint answered with a 2xx status.
    Success,
    /// The attempt failed; the task may be retried.
    FailedAttempt,
    /// Retries are exhausted; the task is abandoned.
    Failure,
}

impl DeliveryStatus {
    /// Convert to the stored string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "Success",
            Self::FailedAttempt => "Failed Attempt",
            Self::Failure => "Failure",
        }
    }

    /// Parse from the stored string representation.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Success" => Some(Self::Success),
            "Failed Attempt" => Some(Self::FailedAttempt),
            "Failure" => Some(Self::Failure),
            _ => None,
        }
    }

    /// Returns true if this status ends the task's lifecycle.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success | Self::Failure)
    }
}

// ---------------------------------------------------------------------------
// Durable rows
// ---------------------------------------------------------------------------

/// A webhook subscription row.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Subscription {
    pub id: i64,
    pub target_url: String,
    pub secret: Option<String>,
    pub event_type: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a subscription row.
#[derive(Debug, Clone)]
pub struct CreateSubscription {
    pub target_url: String,
    pub secret: Option<String>,
    pub event_type: Option<String>,
}

/// Input for a partial subscription update. `None` fields keep their
/// current value.
#[derive(Debug, Clone, Default)]
pub struct UpdateSubscription {
    pub target_url: Option<String>,
    pub secret: Option<String>,
    pub event_type: Option<String>,
}

/// One delivery attempt record, append-only.
///
/// The target URL is a snapshot taken at attempt time (empty when the
/// subscription could not be resolved); the record is never mutated.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct DeliveryAttempt {
    pub id: i64,
    pub task_id: String,
    pub subscription_id: i64,
    pub target_url: String,
    pub payload: serde_json::Value,
    pub attempt_number: i32,
    pub status: String,
    pub status_code: Option<i32>,
    pub error_message: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl DeliveryAttempt {
    /// The typed delivery status, if the stored label is recognized.
    #[must_use]
    pub fn delivery_status(&self) -> Option<DeliveryStatus> {
        DeliveryStatus::parse(&self.status)
    }
}

/// Input for appending one delivery attempt record.
#[derive(Debug, Clone)]
pub struct NewDeliveryAttempt {
    pub task_id: String,
    pub subscription_id: i64,
    pub target_url: String,
    pub payload: serde_json::Value,
    pub attempt_number: i32,
    pub status: DeliveryStatus,
    pub status_code: Option<i32>,
    pub error_message: Option<String>,
}

// ---------------------------------------------------------------------------
// Queue task
// ---------------------------------------------------------------------------

/// One unit of delivery work.
///
/// Ephemeral: owned by the queue/worker pipeline and never persisted on
/// its own. Its history is recoverable from the audit records that share
/// its task id.
#[derive(Debug, Clone)]
pub struct DeliveryTask {
    pub task_id: String,
    pub subscription_id: i64,
    pub payload: serde_json::Value,
    pub event_type: Option<String>,
    pub attempt_number: i32,
}

// ---------------------------------------------------------------------------
// API requests and responses
// ---------------------------------------------------------------------------

/// Request to register a webhook subscription.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateSubscriptionRequest {
    pub target_url: String,
    pub secret: Option<String>,
    pub event_type: Option<String>,
}

/// Request to update a subscription; absent fields keep current values.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateSubscriptionRequest {
    pub target_url: Option<String>,
    pub secret: Option<String>,
    pub event_type: Option<String>,
}

/// Subscription details returned by the API. The shared secret is write-only.
#[derive(Debug, Serialize, ToSchema)]
pub struct SubscriptionResponse {
    pub id: i64,
    pub target_url: String,
    pub event_type: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Response to a successfully admitted event.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct IngestResponse {
    pub message: String,
    pub task_id: String,
}

/// One delivery attempt as exposed by the status surface.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DeliveryAttemptResponse {
    pub id: i64,
    pub task_id: String,
    pub subscription_id: i64,
    pub target_url: String,
    pub attempt_number: i32,
    pub status: String,
    pub status_code: Option<i32>,
    pub error_message: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Simple confirmation message.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

/// Component health report.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub database: String,
    pub timestamp: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
