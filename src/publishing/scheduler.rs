//! # Publishing Scheduler
//!
//! The process-wide recurring task that promotes due lessons. Once per fixed
//! interval it retrieves every lesson whose publish time has elapsed and
//! drives each through the cascading publish transaction, strictly
//! sequentially, isolating per-lesson failures so one bad lesson neither
//! blocks the rest of the batch nor aborts future ticks.
//!
//! There is no dead-letter tracking: a lesson that keeps failing stays
//! `scheduled` and is retried every tick until it succeeds or is archived.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Notify, RwLock};
use tracing::{debug, error, info, instrument, warn};

use crate::config::CatalogConfig;

use super::service::{LessonPublicationService, PublicationError};

/// Configuration for the publishing scheduler
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishingSchedulerConfig {
    /// Seconds between publishing ticks (no jitter, no backoff)
    pub poll_interval_seconds: u64,
}

impl Default for PublishingSchedulerConfig {
    fn default() -> Self {
        Self {
            poll_interval_seconds: 60,
        }
    }
}

impl PublishingSchedulerConfig {
    /// Create a scheduler config from the crate-wide configuration
    pub fn from_catalog_config(config: &CatalogConfig) -> Self {
        Self {
            poll_interval_seconds: config.publish_poll_interval_secs,
        }
    }
}

/// Result of a single publishing tick
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickOutcome {
    /// Lessons the due query returned
    pub due: usize,
    /// Lessons published by this tick
    pub published: usize,
    /// Lessons that turned out to need no write (concurrently moved out of
    /// `scheduled`)
    pub skipped: usize,
    /// Lessons whose publish failed; they stay `scheduled` for the next tick
    pub failed: usize,
}

/// Process-wide recurring task promoting scheduled lessons.
///
/// An explicitly owned handle: started once at process initialization and
/// stopped at shutdown. Tests bypass the timer entirely and drive
/// [`run_tick`](Self::run_tick) manually with a chosen clock value.
pub struct PublishingScheduler {
    service: Arc<LessonPublicationService>,
    config: PublishingSchedulerConfig,
    shutdown_notify: Arc<Notify>,
    running: Arc<RwLock<bool>>,
}

impl PublishingScheduler {
    /// Create a new publishing scheduler over a connection pool
    pub fn new(pool: PgPool, config: PublishingSchedulerConfig) -> Self {
        Self {
            service: Arc::new(LessonPublicationService::new(pool)),
            config,
            shutdown_notify: Arc::new(Notify::new()),
            running: Arc::new(RwLock::new(false)),
        }
    }

    /// Start the recurring publishing loop.
    ///
    /// Ticks never overlap within a process: the loop sleeps only after the
    /// previous tick completes, so a slow batch delays the next tick instead
    /// of racing it. Concurrent processes remain safe through the conditional
    /// writes inside the publish transaction.
    pub async fn start(&self) {
        let mut running = self.running.write().await;
        if *running {
            warn!("Publishing scheduler already running");
            return;
        }
        *running = true;
        drop(running);

        let service = self.service.clone();
        let shutdown_notify = self.shutdown_notify.clone();
        let interval = Duration::from_secs(self.config.poll_interval_seconds);

        info!(
            poll_interval_seconds = self.config.poll_interval_seconds,
            "Starting publishing scheduler loop"
        );

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = tokio::time::sleep(interval) => {
                        match Self::process_due_lessons(&service, Utc::now()).await {
                            Ok(outcome) if outcome.failed > 0 => {
                                warn!(
                                    due = outcome.due,
                                    published = outcome.published,
                                    failed = outcome.failed,
                                    "Publishing tick completed with failures"
                                );
                            }
                            Ok(outcome) => {
                                debug!(
                                    due = outcome.due,
                                    published = outcome.published,
                                    "Publishing tick completed"
                                );
                            }
                            Err(e) => {
                                // Batch retrieval failed; nothing was
                                // processed this tick. The next tick retries.
                                error!(error = %e, "Publishing tick failed");
                            }
                        }
                    }
                    _ = shutdown_notify.notified() => {
                        info!("Publishing scheduler loop shutting down");
                        break;
                    }
                }
            }
        });
    }

    /// Stop the scheduler gracefully
    pub async fn stop(&self) {
        let mut running = self.running.write().await;
        if !*running {
            info!("Publishing scheduler already stopped");
            return;
        }

        self.shutdown_notify.notify_waiters();
        *running = false;

        info!("Publishing scheduler stopped");
    }

    /// Check if the scheduler loop is running
    pub async fn is_running(&self) -> bool {
        *self.running.read().await
    }

    /// Run a single publishing tick at the given clock value.
    ///
    /// Public so tests and operational tooling can drive ticks without the
    /// timer. Errors from this function mean the due-lesson query itself
    /// failed; per-lesson failures are captured in the outcome.
    pub async fn run_tick(&self, now: DateTime<Utc>) -> Result<TickOutcome, PublicationError> {
        Self::process_due_lessons(&self.service, now).await
    }

    #[instrument(skip(service))]
    async fn process_due_lessons(
        service: &LessonPublicationService,
        now: DateTime<Utc>,
    ) -> Result<TickOutcome, PublicationError> {
        let due = service.find_due(now).await?;

        if due.is_empty() {
            debug!("No scheduled lessons due for publishing");
            return Ok(TickOutcome::default());
        }

        info!(due = due.len(), "Found lessons ready for publishing");

        let mut outcome = TickOutcome {
            due: due.len(),
            ..TickOutcome::default()
        };

        for lesson in due {
            match service.publish_due_lesson(lesson.id).await {
                Ok(context) if context.lesson.status == "published" => {
                    outcome.published += 1;
                }
                Ok(context) => {
                    debug!(
                        lesson_id = %lesson.id,
                        status = %context.lesson.status,
                        "Due lesson no longer scheduled, skipped"
                    );
                    outcome.skipped += 1;
                }
                Err(e) => {
                    // One bad lesson must not block the rest of the batch.
                    error!(
                        lesson_id = %lesson.id,
                        error = %e,
                        "Failed to publish scheduled lesson"
                    );
                    outcome.failed += 1;
                }
            }
        }

        Ok(outcome)
    }
}
