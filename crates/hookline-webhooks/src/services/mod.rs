//! Business-logic services for admission, subscription management and
//! audit retention.

pub mod ingest;
pub mod retention;
pub mod subscriptions;
