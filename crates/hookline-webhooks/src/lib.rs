//! Webhook delivery service core.
//!
//! Accepts inbound events on behalf of registered subscribers and delivers
//! them to subscriber endpoints with HMAC-SHA256 admission checks, a
//! cache-accelerated subscription lookup, bounded exponential-backoff
//! retries, and an append-only audit trail of every delivery attempt.

pub mod audit;
pub mod cache;
pub mod crypto;
pub mod error;
pub mod handlers;
pub mod models;
pub mod queue;
pub mod router;
pub mod services;
pub mod store;
pub mod validation;
pub mod worker;

pub use error::WebhookError;
pub use models::{DeliveryStatus, DeliveryTask};
pub use queue::DeliveryQueue;
pub use router::{webhooks_router, WebhooksState};
pub use worker::DeliveryWorker;
