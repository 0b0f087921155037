//! hookline API server.
//!
//! Wires the webhook delivery pipeline: HTTP ingress and CRUD surface,
//! the delivery worker pool, and the audit retention job, over Postgres
//! when `DATABASE_URL` is set or in-memory stores otherwise.

mod config;
mod logging;

use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use tokio_util::sync::CancellationToken;

use hookline_webhooks::audit::{DeliveryLog, InMemoryDeliveryLog, PgDeliveryLog};
use hookline_webhooks::cache::SubscriptionCache;
use hookline_webhooks::queue::DeliveryQueue;
use hookline_webhooks::router::{webhooks_router, WebhooksState};
use hookline_webhooks::services::retention::RetentionJob;
use hookline_webhooks::store::{InMemorySubscriptionStore, PgSubscriptionStore, SubscriptionStore};
use hookline_webhooks::worker::{spawn_workers, DeliveryWorker};

use config::AppConfig;

#[tokio::main]
async fn main() {
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("FATAL: configuration error: {e}");
            std::process::exit(1);
        }
    };

    logging::init_logging(&config.log_filter);

    if let Err(e) = run(config).await {
        tracing::error!(error = %e, "Server exited with error");
        std::process::exit(1);
    }
}

async fn run(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    // Storage: Postgres when configured, in-memory otherwise.
    let (store, audit): (Arc<dyn SubscriptionStore>, Arc<dyn DeliveryLog>) =
        match config.database_url {
            Some(ref url) => {
                let pool = PgPoolOptions::new().max_connections(10).connect(url).await?;
                sqlx::migrate!("./migrations").run(&pool).await?;
                tracing::info!("Connected to Postgres and applied migrations");
                (
                    Arc::new(PgSubscriptionStore::new(pool.clone())) as Arc<dyn SubscriptionStore>,
                    Arc::new(PgDeliveryLog::new(pool)) as Arc<dyn DeliveryLog>,
                )
            }
            None => {
                tracing::warn!("DATABASE_URL not set; using in-memory stores (state is lost on restart)");
                (
                    Arc::new(InMemorySubscriptionStore::new()) as Arc<dyn SubscriptionStore>,
                    Arc::new(InMemoryDeliveryLog::new()) as Arc<dyn DeliveryLog>,
                )
            }
        };

    let cache =
        Arc::new(SubscriptionCache::new(Arc::clone(&store)).with_ttl(config.cache_ttl));
    let (queue, rx) = DeliveryQueue::new(config.queue_capacity);
    let shutdown = CancellationToken::new();

    let worker = DeliveryWorker::new(Arc::clone(&cache), Arc::clone(&audit), queue.clone())?
        .with_max_retries(config.max_retries)
        .with_request_timeout(config.request_timeout);
    let worker_handles = spawn_workers(worker, rx, config.worker_count, shutdown.clone());

    let retention = RetentionJob::new(Arc::clone(&audit))
        .with_max_age(config.retention_max_age)
        .with_interval(config.retention_interval);
    let retention_handle = tokio::spawn(retention.run(shutdown.clone()));

    let state = WebhooksState::new(store, audit, cache, queue);
    let app = webhooks_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!(
        addr = %config.bind_addr,
        workers = config.worker_count,
        "hookline API listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown.clone()))
        .await?;

    // Drain the background tasks before exiting.
    shutdown.cancel();
    for handle in worker_handles {
        let _ = handle.await;
    }
    let _ = retention_handle.await;

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Resolves on SIGINT or SIGTERM and cancels the shared token.
async fn shutdown_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(_) => std::future::pending().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received");
    shutdown.cancel();
}
