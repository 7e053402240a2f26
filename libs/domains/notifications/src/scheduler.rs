//! Background worker for trigger dispatches held back by `deliveryDelay`.
//!
//! Rows are leased rather than locked: a claimed row's `due_at` moves forward
//! by the lease, so if the process dies mid-dispatch another tick picks it up
//! again. Delivery is therefore at-least-once and never before the due time.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info, instrument, warn};

use crate::config::NotificationsConfig;
use crate::dispatch::DispatchEngine;
use crate::error::NotificationResult;
use crate::models::{DispatchRequest, ScheduledDispatch};
use crate::repository::ScheduledDispatchRepository;

const MAX_RETRY_DELAY: ChronoDuration = ChronoDuration::hours(1);
/// Time a claimed row stays invisible to other ticks.
const CLAIM_LEASE: ChronoDuration = ChronoDuration::minutes(5);

/// Counts from one worker tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickSummary {
    pub claimed: usize,
    pub completed: usize,
    pub failed: usize,
}

#[derive(Clone)]
pub struct DelayedDispatchWorker {
    scheduled: Arc<dyn ScheduledDispatchRepository>,
    dispatcher: DispatchEngine,
    poll_interval: Duration,
    batch_size: u64,
}

impl DelayedDispatchWorker {
    pub fn new(
        scheduled: Arc<dyn ScheduledDispatchRepository>,
        dispatcher: DispatchEngine,
        config: &NotificationsConfig,
    ) -> Self {
        Self {
            scheduled,
            dispatcher,
            poll_interval: config.scheduler_poll_interval,
            batch_size: config.scheduler_batch_size,
        }
    }

    /// Polls until `shutdown` turns true.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!(
            poll_interval_ms = self.poll_interval.as_millis() as u64,
            batch_size = self.batch_size,
            "Starting delayed dispatch worker"
        );

        loop {
            if *shutdown.borrow() {
                break;
            }

            match self.run_once(Utc::now()).await {
                Ok(summary) if summary.claimed > 0 => {
                    info!(
                        claimed = summary.claimed,
                        completed = summary.completed,
                        failed = summary.failed,
                        "Processed scheduled dispatches"
                    );
                }
                Ok(_) => {}
                Err(e) => error!(error = %e, "Failed to claim scheduled dispatches"),
            }

            tokio::select! {
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        break;
                    }
                }
                _ = tokio::time::sleep(self.poll_interval) => {}
            }
        }

        info!("Delayed dispatch worker stopped");
    }

    /// Claims and dispatches every row due at `now`. Only a failed claim is an
    /// error; per-row failures are rescheduled.
    #[instrument(skip(self))]
    pub async fn run_once(&self, now: DateTime<Utc>) -> NotificationResult<TickSummary> {
        let rows = self
            .scheduled
            .claim_due(now, CLAIM_LEASE, self.batch_size)
            .await?;

        let mut summary = TickSummary {
            claimed: rows.len(),
            ..Default::default()
        };
        for row in rows {
            match self.process(&row).await {
                Ok(created) => {
                    debug!(id = %row.id, created, "Scheduled dispatch completed");
                    if let Err(e) = self.scheduled.complete(row.id).await {
                        // The lease brings the row back; dispatch may repeat.
                        warn!(id = %row.id, error = %e, "Failed to mark scheduled dispatch completed");
                    }
                    summary.completed += 1;
                }
                Err(e) => {
                    let retry_at = now + self.retry_delay(row.attempts);
                    warn!(
                        id = %row.id,
                        attempts = row.attempts,
                        %retry_at,
                        error = %e,
                        "Scheduled dispatch failed"
                    );
                    if let Err(e) = self.scheduled.fail(row.id, e.to_string(), retry_at).await {
                        warn!(id = %row.id, error = %e, "Failed to reschedule dispatch");
                    }
                    summary.failed += 1;
                }
            }
        }
        Ok(summary)
    }

    async fn process(&self, row: &ScheduledDispatch) -> NotificationResult<usize> {
        let request: DispatchRequest = serde_json::from_value(row.request.clone())?;
        let created = self.dispatcher.dispatch(request).await?;
        Ok(created.len())
    }

    /// Linear backoff by attempt, capped at an hour.
    fn retry_delay(&self, attempts: i32) -> ChronoDuration {
        let step = ChronoDuration::from_std(self.poll_interval).unwrap_or(ChronoDuration::seconds(5));
        (step * attempts.max(1)).min(MAX_RETRY_DELAY)
    }
}
