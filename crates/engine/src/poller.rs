//! Periodic due-rule execution.
//!
//! [`RecurringPoller`] is the only component that touches the wall clock:
//! it ticks on a fixed interval and hands `Utc::now()` to the otherwise
//! clock-free [`RecurringEngine`].

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;

use crate::recurring::RecurringEngine;

/// Background service that executes due recurring rules on an interval.
pub struct RecurringPoller {
    engine: Arc<RecurringEngine>,
    interval: Duration,
}

impl RecurringPoller {
    /// Create a new poller over the given engine.
    pub fn new(engine: Arc<RecurringEngine>, interval: Duration) -> Self {
        Self { engine, interval }
    }

    /// Run the polling loop.
    ///
    /// Executes all due rules on every tick. The loop exits gracefully when
    /// the provided [`CancellationToken`] is cancelled.
    pub async fn run(&self, cancel: CancellationToken) {
        tracing::info!(
            interval_secs = self.interval.as_secs(),
            "Recurring rule poller started"
        );

        let mut interval = tokio::time::interval(self.interval);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Recurring rule poller stopping");
                    break;
                }
                _ = interval.tick() => {
                    match self.engine.execute_due_rules(Utc::now()).await {
                        Ok(summary) => {
                            if summary.total_count > 0 {
                                tracing::info!(
                                    executed = summary.executed_count,
                                    errors = summary.error_count,
                                    total = summary.total_count,
                                    "Due-rule run finished"
                                );
                            } else {
                                tracing::debug!("No recurring rules due");
                            }
                        }
                        Err(e) => {
                            tracing::error!(error = %e, "Due-rule run failed");
                        }
                    }
                }
            }
        }
    }
}
