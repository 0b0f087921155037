//! Integration tests for the delivery tracking surface and retention.

mod common;

use common::*;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer};

use hookline_webhooks::audit::DeliveryLog;
use hookline_webhooks::models::DeliveryStatus;
use hookline_webhooks::services::retention::RetentionJob;

/// The status lookup returns the latest attempt for a task, here the
/// Success that followed one failure.
#[tokio::test]
async fn test_status_returns_latest_attempt() {
    let mock_server = MockServer::start().await;
    let failing = FailingResponder::fail_times(1);
    Mock::given(method("POST"))
        .respond_with(failing.clone())
        .mount(&mock_server)
        .await;

    let pipeline = TestPipeline::start(1);
    pipeline.seed(1, &mock_server.uri(), None, None).await;

    let task_id = pipeline
        .queue
        .enqueue(1, serde_json::json!({"n": 1}), None)
        .await
        .unwrap();

    let records = wait_for_terminal(&pipeline.audit, &task_id).await;
    assert_eq!(records.len(), 2);

    let latest = pipeline
        .audit
        .find_latest_by_task(&task_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(latest.attempt_number, 2);
    assert_eq!(latest.delivery_status(), Some(DeliveryStatus::Success));
}

/// Per-subscription history is bounded to the 20 most recent records,
/// newest first.
#[tokio::test]
async fn test_subscription_history_is_bounded() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(CountingResponder::new())
        .mount(&mock_server)
        .await;

    let pipeline = TestPipeline::start(4);
    pipeline.seed(1, &mock_server.uri(), None, None).await;

    let mut task_ids = Vec::new();
    for n in 0..25 {
        let task_id = pipeline
            .queue
            .enqueue(1, serde_json::json!({"n": n}), None)
            .await
            .unwrap();
        task_ids.push(task_id);
    }
    for task_id in &task_ids {
        wait_for_records(&pipeline.audit, task_id, 1).await;
    }

    let recent = pipeline
        .audit
        .list_recent_by_subscription(1, 20)
        .await
        .unwrap();
    assert_eq!(recent.len(), 20);
    assert!(recent.windows(2).all(|w| w[0].id > w[1].id));
}

/// The retention job deletes records older than the configured age and
/// nothing newer.
#[tokio::test]
async fn test_retention_purges_only_aged_records() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(CountingResponder::new())
        .mount(&mock_server)
        .await;

    let pipeline = TestPipeline::start(2);
    pipeline.seed(1, &mock_server.uri(), None, None).await;

    for n in 0..3 {
        let task_id = pipeline
            .queue
            .enqueue(1, serde_json::json!({"n": n}), None)
            .await
            .unwrap();
        wait_for_records(&pipeline.audit, &task_id, 1).await;
    }
    assert_eq!(pipeline.audit.len().await, 3);

    // A 72-hour window keeps everything that was just written.
    let keeping = RetentionJob::new(Arc::clone(&pipeline.audit) as Arc<dyn DeliveryLog>);
    assert_eq!(keeping.purge_once().await.unwrap(), 0);
    assert_eq!(pipeline.audit.len().await, 3);

    // A zero-length window ages everything out immediately.
    tokio::time::sleep(Duration::from_millis(10)).await;
    let purging = RetentionJob::new(Arc::clone(&pipeline.audit) as Arc<dyn DeliveryLog>)
        .with_max_age(Duration::ZERO);
    assert_eq!(purging.purge_once().await.unwrap(), 3);
    assert!(pipeline.audit.is_empty().await);
}
