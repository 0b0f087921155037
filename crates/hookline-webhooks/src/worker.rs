//! Delivery worker pool and retry state machine.
//!
//! Each worker takes one task at a time from the shared channel, then:
//! resolves the subscription through the cache, POSTs the payload to the
//! target endpoint, classifies the outcome, writes exactly one audit
//! record for the attempt, and either stops (terminal outcome) or hands
//! the task back to the queue with exponential backoff.
//!
//! A single task's attempts are strictly sequential: only the reschedule
//! performed here creates the next attempt. Tasks for different
//! subscriptions (or even the same subscription) run in parallel with
//! no ordering guarantee between them.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;

use crate::audit::DeliveryLog;
use crate::cache::SubscriptionCache;
use crate::error::WebhookError;
use crate::models::{DeliveryStatus, DeliveryTask, NewDeliveryAttempt};
use crate::queue::DeliveryQueue;

/// Default maximum delivery attempts per task.
pub const DEFAULT_MAX_RETRIES: i32 = 5;

/// Default timeout for one outbound request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Default unit of the backoff schedule. Delays are `base * 2^attempt`:
/// 2, 4, 8, 16 and 32 seconds for attempts 1-5 at the one-second base.
pub const DEFAULT_BACKOFF_BASE: Duration = Duration::from_secs(1);

/// Outcome classification for one outbound call.
enum AttemptOutcome {
    /// 2xx response from the subscriber.
    Delivered { status_code: i32 },
    /// Non-2xx response or transport-level failure.
    Failed {
        status_code: Option<i32>,
        error: String,
    },
}

/// Executes delivery attempts and drives the retry state machine.
#[derive(Clone)]
pub struct DeliveryWorker {
    cache: Arc<SubscriptionCache>,
    audit: Arc<dyn DeliveryLog>,
    queue: DeliveryQueue,
    http_client: Client,
    request_timeout: Duration,
    max_retries: i32,
    backoff_base: Duration,
}

impl DeliveryWorker {
    /// Create a worker with a shared HTTP client.
    ///
    /// # Errors
    ///
    /// Returns `WebhookError::Internal` if the HTTP client cannot be built.
    pub fn new(
        cache: Arc<SubscriptionCache>,
        audit: Arc<dyn DeliveryLog>,
        queue: DeliveryQueue,
    ) -> Result<Self, WebhookError> {
        let http_client = Client::builder()
            .user_agent("hookline/0.1")
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| WebhookError::Internal(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            cache,
            audit,
            queue,
            http_client,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
            backoff_base: DEFAULT_BACKOFF_BASE,
        })
    }

    /// Set the maximum delivery attempts per task.
    #[must_use]
    pub fn with_max_retries(mut self, max: i32) -> Self {
        self.max_retries = max;
        self
    }

    /// Set the per-request timeout for outbound calls.
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set the unit of the exponential backoff schedule.
    #[must_use]
    pub fn with_backoff_base(mut self, base: Duration) -> Self {
        self.backoff_base = base;
        self
    }

    /// Delay before the retry that follows a failure at `attempt`.
    #[must_use]
    pub fn backoff_delay(&self, attempt: i32) -> Duration {
        let exponent = attempt.clamp(1, 30) as u32;
        self.backoff_base * 2u32.saturating_pow(exponent)
    }

    /// Run one worker until the channel closes or shutdown fires.
    pub async fn run(
        self,
        rx: Arc<Mutex<mpsc::Receiver<DeliveryTask>>>,
        shutdown: CancellationToken,
    ) {
        loop {
            let task = {
                let mut rx = rx.lock().await;
                tokio::select! {
                    () = shutdown.cancelled() => None,
                    task = rx.recv() => task,
                }
            };
            let Some(task) = task else { break };
            self.process_task(task).await;
        }
    }

    /// Execute one delivery attempt for `task`.
    pub async fn process_task(&self, task: DeliveryTask) {
        let subscription = match self.cache.resolve(task.subscription_id).await {
            Ok(Some(subscription)) => subscription,
            Ok(None) => {
                // No endpoint was ever known for this attempt; the audit
                // record carries an empty target snapshot.
                self.handle_failure(
                    &task,
                    "",
                    None,
                    format!("subscription {} not found", task.subscription_id),
                )
                .await;
                return;
            }
            Err(e) => {
                self.handle_failure(&task, "", None, format!("subscription lookup failed: {e}"))
                    .await;
                return;
            }
        };

        match self.attempt_delivery(&task, &subscription.target_url).await {
            AttemptOutcome::Delivered { status_code } => {
                self.handle_success(&task, &subscription.target_url, status_code)
                    .await;
            }
            AttemptOutcome::Failed { status_code, error } => {
                self.handle_failure(&task, &subscription.target_url, status_code, error)
                    .await;
            }
        }
    }

    /// POST the payload to the target endpoint and classify the result.
    async fn attempt_delivery(&self, task: &DeliveryTask, target_url: &str) -> AttemptOutcome {
        let result = self
            .http_client
            .post(target_url)
            .timeout(self.request_timeout)
            .json(&task.payload)
            .send()
            .await;

        match result {
            Ok(response) => {
                let status = response.status().as_u16();
                if (200..300).contains(&status) {
                    AttemptOutcome::Delivered {
                        status_code: i32::from(status),
                    }
                } else {
                    AttemptOutcome::Failed {
                        status_code: Some(i32::from(status)),
                        error: format!("received status code {status}"),
                    }
                }
            }
            Err(e) => {
                let error = if e.is_timeout() {
                    format!("request timed out after {:?}", self.request_timeout)
                } else if e.is_connect() {
                    format!("connection failed: {e}")
                } else {
                    format!("request error: {e}")
                };
                AttemptOutcome::Failed {
                    status_code: None,
                    error,
                }
            }
        }
    }

    /// Record a successful attempt; the task is complete.
    async fn handle_success(&self, task: &DeliveryTask, target_url: &str, status_code: i32) {
        tracing::info!(
            target: "webhook_delivery",
            task_id = %task.task_id,
            subscription_id = task.subscription_id,
            attempt = task.attempt_number,
            status_code,
            "Webhook delivered"
        );

        self.append_record(
            task,
            target_url,
            DeliveryStatus::Success,
            Some(status_code),
            None,
        )
        .await;
    }

    /// Record a failed attempt, then retry or give up.
    async fn handle_failure(
        &self,
        task: &DeliveryTask,
        target_url: &str,
        status_code: Option<i32>,
        error: String,
    ) {
        tracing::warn!(
            target: "webhook_delivery",
            task_id = %task.task_id,
            subscription_id = task.subscription_id,
            attempt = task.attempt_number,
            status_code,
            error = %error,
            "Delivery attempt failed"
        );

        self.append_record(
            task,
            target_url,
            DeliveryStatus::FailedAttempt,
            status_code,
            Some(error.clone()),
        )
        .await;

        if task.attempt_number < self.max_retries {
            let delay = self.backoff_delay(task.attempt_number);
            self.queue.reschedule(task.clone(), delay);
        } else {
            tracing::warn!(
                target: "webhook_delivery",
                task_id = %task.task_id,
                subscription_id = task.subscription_id,
                attempts = task.attempt_number,
                "Retries exhausted, delivery abandoned"
            );

            self.append_record(
                task,
                target_url,
                DeliveryStatus::Failure,
                None,
                Some(format!("max retries reached: {error}")),
            )
            .await;
        }
    }

    /// Append one audit record for the current attempt.
    async fn append_record(
        &self,
        task: &DeliveryTask,
        target_url: &str,
        status: DeliveryStatus,
        status_code: Option<i32>,
        error_message: Option<String>,
    ) {
        let record = NewDeliveryAttempt {
            task_id: task.task_id.clone(),
            subscription_id: task.subscription_id,
            target_url: target_url.to_string(),
            payload: task.payload.clone(),
            attempt_number: task.attempt_number,
            status,
            status_code,
            error_message,
        };

        if let Err(e) = self.audit.append(record).await {
            tracing::error!(
                target: "webhook_delivery",
                task_id = %task.task_id,
                error = %e,
                "Failed to write delivery attempt record"
            );
        }
    }
}

/// Spawn `count` workers over one shared receiver.
pub fn spawn_workers(
    worker: DeliveryWorker,
    rx: mpsc::Receiver<DeliveryTask>,
    count: usize,
    shutdown: CancellationToken,
) -> Vec<tokio::task::JoinHandle<()>> {
    let rx = Arc::new(Mutex::new(rx));
    (0..count)
        .map(|index| {
            let worker = worker.clone();
            let rx = Arc::clone(&rx);
            let shutdown = shutdown.clone();
            tokio::spawn(async move {
                tracing::debug!(target: "delivery_worker", worker = index, "Delivery worker started");
                worker.run(rx, shutdown).await;
                tracing::debug!(target: "delivery_worker", worker = index, "Delivery worker stopped");
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
