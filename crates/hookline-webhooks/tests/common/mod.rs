//! Common test utilities for hookline-webhooks integration tests.
//!
//! Provides wiremock responders for subscriber endpoints and a fully
//! wired in-memory pipeline (store, cache, audit log, queue, workers) so
//! delivery behavior can be verified without a real database.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use wiremock::{Request, Respond, ResponseTemplate};

use hookline_webhooks::audit::{DeliveryLog, InMemoryDeliveryLog};
use hookline_webhooks::cache::SubscriptionCache;
use hookline_webhooks::models::{DeliveryAttempt, Subscription};
use hookline_webhooks::queue::DeliveryQueue;
use hookline_webhooks::router::{webhooks_router, WebhooksState};
use hookline_webhooks::store::{InMemorySubscriptionStore, SubscriptionStore};
use hookline_webhooks::worker::{spawn_workers, DeliveryWorker};

/// Backoff base used by the suite so retry schedules complete quickly.
pub const TEST_BACKOFF_BASE: Duration = Duration::from_millis(5);

/// How long the suite is willing to wait for asynchronous outcomes.
pub const WAIT_TIMEOUT: Duration = Duration::from_secs(10);

// ---------------------------------------------------------------------------
// TestPipeline - fully wired in-memory delivery pipeline
// ---------------------------------------------------------------------------

/// A running delivery pipeline over in-memory stores.
pub struct TestPipeline {
    pub store: Arc<InMemorySubscriptionStore>,
    pub audit: Arc<InMemoryDeliveryLog>,
    pub cache: Arc<SubscriptionCache>,
    pub queue: DeliveryQueue,
    pub shutdown: CancellationToken,
}

impl TestPipeline {
    /// Start a pipeline with `workers` delivery workers and the default
    /// retry policy (compressed backoff).
    pub fn start(workers: usize) -> Self {
        Self::start_with(workers, |worker| worker)
    }

    /// Start a pipeline, customizing the worker before it is spawned.
    pub fn start_with(
        workers: usize,
        configure: impl FnOnce(DeliveryWorker) -> DeliveryWorker,
    ) -> Self {
        let store = Arc::new(InMemorySubscriptionStore::new());
        let audit = Arc::new(InMemoryDeliveryLog::new());
        let cache = Arc::new(SubscriptionCache::new(
            Arc::clone(&store) as Arc<dyn SubscriptionStore>
        ));
        let (queue, rx) = DeliveryQueue::new(64);
        let shutdown = CancellationToken::new();

        let worker = DeliveryWorker::new(
            Arc::clone(&cache),
            Arc::clone(&audit) as Arc<dyn DeliveryLog>,
            queue.clone(),
        )
        .expect("failed to build delivery worker")
        .with_backoff_base(TEST_BACKOFF_BASE);

        spawn_workers(configure(worker), rx, workers, shutdown.clone());

        Self {
            store,
            audit,
            cache,
            queue,
            shutdown,
        }
    }

    /// Seed a subscription fixture.
    pub async fn seed(
        &self,
        id: i64,
        target_url: &str,
        secret: Option<&str>,
        event_type: Option<&str>,
    ) {
        self.store
            .insert(Subscription {
                id,
                target_url: target_url.to_string(),
                secret: secret.map(str::to_string),
                event_type: event_type.map(str::to_string),
                created_at: Utc::now(),
            })
            .await;
    }

    /// Serve the HTTP API over this pipeline; returns the base URL.
    pub async fn spawn_api(&self) -> String {
        let state = WebhooksState::new(
            Arc::clone(&self.store) as Arc<dyn SubscriptionStore>,
            Arc::clone(&self.audit) as Arc<dyn DeliveryLog>,
            Arc::clone(&self.cache),
            self.queue.clone(),
        );
        let app = webhooks_router(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind test listener");
        let addr = listener.local_addr().expect("missing local addr");

        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        format!("http://{addr}")
    }
}

// ---------------------------------------------------------------------------
// Polling helpers
// ---------------------------------------------------------------------------

/// Poll the audit log until `task_id` has at least `count` records or the
/// timeout expires. Returns whatever was recorded.
pub async fn wait_for_records(
    audit: &InMemoryDeliveryLog,
    task_id: &str,
    count: usize,
) -> Vec<DeliveryAttempt> {
    let deadline = tokio::time::Instant::now() + WAIT_TIMEOUT;
    loop {
        let records = audit.attempts_for_task(task_id).await;
        if records.len() >= count || tokio::time::Instant::now() >= deadline {
            return records;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

/// Poll the audit log until `task_id` has a terminal record (Success or
/// Failure) or the timeout expires.
pub async fn wait_for_terminal(
    audit: &InMemoryDeliveryLog,
    task_id: &str,
) -> Vec<DeliveryAttempt> {
    let deadline = tokio::time::Instant::now() + WAIT_TIMEOUT;
    loop {
        let records = audit.attempts_for_task(task_id).await;
        let done = records
            .iter()
            .any(|r| r.delivery_status().is_some_and(|s| s.is_terminal()));
        if done || tokio::time::Instant::now() >= deadline {
            return records;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

// ---------------------------------------------------------------------------
// Signed payload helpers
// ---------------------------------------------------------------------------

/// Build an inbound envelope signed with `secret`.
pub fn signed_payload(secret: &str, body: &str) -> serde_json::Value {
    serde_json::json!({
        "signature": hookline_webhooks::crypto::compute_signature(secret, body),
        "body": body,
    })
}

// ---------------------------------------------------------------------------
// CaptureResponder - captures requests and returns a fixed status
// ---------------------------------------------------------------------------

/// A captured HTTP request with body and headers.
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub body: Vec<u8>,
    pub headers: HashMap<String, String>,
}

impl CapturedRequest {
    /// Parse the body as JSON.
    pub fn body_json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).expect("captured body is not JSON")
    }

    /// Get a header value by name (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        let name_lower = name.to_lowercase();
        self.headers
            .iter()
            .find(|(k, _)| k.to_lowercase() == name_lower)
            .map(|(_, v)| v.as_str())
    }
}

/// A wiremock responder that captures incoming requests.
#[derive(Clone)]
pub struct CaptureResponder {
    requests: Arc<Mutex<Vec<CapturedRequest>>>,
    response_code: u16,
}

impl CaptureResponder {
    /// Create a capture responder that returns 200 OK.
    pub fn new() -> Self {
        Self::with_status(200)
    }

    /// Create a capture responder that returns a custom status code.
    pub fn with_status(status: u16) -> Self {
        Self {
            requests: Arc::new(Mutex::new(Vec::new())),
            response_code: status,
        }
    }

    /// Get all captured requests.
    pub fn requests(&self) -> Vec<CapturedRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Get the number of captured requests.
    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

impl Default for CaptureResponder {
    fn default() -> Self {
        Self::new()
    }
}

impl Respond for CaptureResponder {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let captured = CapturedRequest {
            body: request.body.clone(),
            headers: request
                .headers
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or("").to_string()))
                .collect(),
        };
        self.requests.lock().unwrap().push(captured);
        ResponseTemplate::new(self.response_code)
    }
}

// ---------------------------------------------------------------------------
// CountingResponder - counts requests
// ---------------------------------------------------------------------------

/// A wiremock responder that counts incoming requests.
#[derive(Clone)]
pub struct CountingResponder {
    count: Arc<AtomicU32>,
    response_code: u16,
}

impl CountingResponder {
    /// Create a counting responder that returns 200 OK.
    pub fn new() -> Self {
        Self::with_status(200)
    }

    /// Create a counting responder that returns a custom status code.
    pub fn with_status(status: u16) -> Self {
        Self {
            count: Arc::new(AtomicU32::new(0)),
            response_code: status,
        }
    }

    /// Get the current request count.
    pub fn count(&self) -> u32 {
        self.count.load(Ordering::SeqCst)
    }
}

impl Default for CountingResponder {
    fn default() -> Self {
        Self::new()
    }
}

impl Respond for CountingResponder {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        self.count.fetch_add(1, Ordering::SeqCst);
        ResponseTemplate::new(self.response_code)
    }
}

// ---------------------------------------------------------------------------
// FailingResponder - fails N times then succeeds
// ---------------------------------------------------------------------------

/// A wiremock responder that fails a specified number of times before
/// succeeding.
#[derive(Clone)]
pub struct FailingResponder {
    attempt_count: Arc<AtomicU32>,
    failures_before_success: u32,
    failure_code: u16,
}

impl FailingResponder {
    /// Create a responder that fails `n` times with 500, then returns 200.
    pub fn fail_times(n: u32) -> Self {
        Self {
            attempt_count: Arc::new(AtomicU32::new(0)),
            failures_before_success: n,
            failure_code: 500,
        }
    }

    /// Get the current attempt count.
    pub fn attempt_count(&self) -> u32 {
        self.attempt_count.load(Ordering::SeqCst)
    }
}

impl Respond for FailingResponder {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        let n = self.attempt_count.fetch_add(1, Ordering::SeqCst);
        if n < self.failures_before_success {
            ResponseTemplate::new(self.failure_code)
        } else {
            ResponseTemplate::new(200)
        }
    }
}
