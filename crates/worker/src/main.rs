//! Standalone recurring-rule worker.
//!
//! Runs the due-rule poller against the database without the HTTP server,
//! for deployments that separate the API from background execution.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use flowdesk_engine::store::{PgRecurringRuleStore, PgTicketStore};
use flowdesk_engine::{RecurringEngine, RecurringPoller};

/// Default poll interval in seconds.
const DEFAULT_POLL_INTERVAL_SECS: u64 = 60;

/// Default interval for rules that do not set one, in minutes.
const DEFAULT_RULE_INTERVAL_MINUTES: i64 = 60;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "flowdesk_worker=debug,flowdesk_engine=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;

    let pool = flowdesk_db::create_pool(&database_url)
        .await
        .context("Failed to connect to database")?;

    flowdesk_db::run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;

    let poll_interval_secs: u64 = std::env::var("RECURRING_POLL_INTERVAL_SECS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_POLL_INTERVAL_SECS);

    let default_interval_minutes: i64 = std::env::var("RECURRING_DEFAULT_INTERVAL_MINUTES")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_RULE_INTERVAL_MINUTES);

    let engine = Arc::new(RecurringEngine::new(
        Arc::new(PgRecurringRuleStore::new(pool.clone())),
        Arc::new(PgTicketStore::new(pool)),
        default_interval_minutes,
    ));

    let poller = RecurringPoller::new(engine, Duration::from_secs(poll_interval_secs));

    let cancel = tokio_util::sync::CancellationToken::new();
    let run_cancel = cancel.clone();
    let handle = tokio::spawn(async move {
        poller.run(run_cancel).await;
    });

    tracing::info!(poll_interval_secs, "Worker started");

    tokio::signal::ctrl_c()
        .await
        .context("Failed to install Ctrl+C handler")?;
    tracing::info!("Shutdown signal received");

    cancel.cancel();
    handle.await.context("Poller task panicked")?;

    Ok(())
}
