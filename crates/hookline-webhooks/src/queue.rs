//! Asynchronous delivery task queue.
//!
//! `enqueue` admits one task per inbound event and returns immediately
//! with the assigned task identifier; the worker pool consumes the other
//! end of the channel. Retries re-enter the queue through `reschedule`,
//! which spawns a timer task so the backoff delay never blocks a worker.

use std::time::Duration;

use tokio::sync::mpsc;
use uuid::Uuid;

use crate::error::WebhookError;
use crate::models::DeliveryTask;

/// Default capacity of the delivery channel.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// Sending half of the delivery pipeline.
#[derive(Clone)]
pub struct DeliveryQueue {
    tx: mpsc::Sender<DeliveryTask>,
}

impl DeliveryQueue {
    /// Create a queue and the receiver the worker pool consumes.
    #[must_use]
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<DeliveryTask>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }

    /// Admit a new delivery task and return its task identifier.
    ///
    /// The caller never waits for delivery; execution is fully
    /// asynchronous from admission.
    pub async fn enqueue(
        &self,
        subscription_id: i64,
        payload: serde_json::Value,
        event_type: Option<String>,
    ) -> Result<String, WebhookError> {
        let task = DeliveryTask {
            task_id: Uuid::new_v4().to_string(),
            subscription_id,
            payload,
            event_type,
            attempt_number: 1,
        };
        let task_id = task.task_id.clone();

        tracing::debug!(
            target: "delivery_queue",
            task_id = %task_id,
            subscription_id,
            "Task enqueued"
        );

        self.tx
            .send(task)
            .await
            .map_err(|_| WebhookError::QueueUnavailable)?;
        Ok(task_id)
    }

    /// Re-submit a task with the attempt number incremented, no earlier
    /// than `delay` from now. The delay is a floor: under load the task
    /// may run later, never earlier.
    pub fn reschedule(&self, mut task: DeliveryTask, delay: Duration) {
        task.attempt_number += 1;

        tracing::debug!(
            target: "delivery_queue",
            task_id = %task.task_id,
            attempt = task.attempt_number,
            delay_ms = delay.as_millis() as u64,
            "Task rescheduled"
        );

        let tx = self.tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Err(err) = tx.send(task).await {
                tracing::warn!(
                    target: "delivery_queue",
                    task_id = %err.0.task_id,
                    "Delivery channel closed; dropping rescheduled task"
                );
            }
        });
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
