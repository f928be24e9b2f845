//! # Publication Services
//!
//! Owns every status mutation in the catalog. Direct operations (publish now,
//! schedule, archive) guard the requested transition against the shared
//! status model before writing; the cascading publish transaction promotes a
//! due lesson and, when needed, its parent program as one atomic unit.
//!
//! The cascade's correctness does not rest on the pre-read alone: the lesson
//! flip is a conditional write keyed on `status = 'scheduled'` and the
//! program promotion on `status <> 'published'`, so concurrent or retried
//! invocations converge on the no-op path instead of double-publishing.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::models::{Lesson, LessonContext, Program};
use crate::state_machine::{plan_publish_cascade, PublishStatus};

/// Error types for publication operations
#[derive(Debug, thiserror::Error)]
pub enum PublicationError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: Uuid },

    #[error("invalid status transition from {from} to {to}")]
    InvalidTransition {
        from: PublishStatus,
        to: PublishStatus,
    },

    #[error("validation failed: {0}")]
    ValidationFailed(String),

    #[error("invalid stored status for {entity} {id}: {value}")]
    CorruptStatus {
        entity: &'static str,
        id: Uuid,
        value: String,
    },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Guard a requested transition against the shared status model.
fn ensure_transition(
    from: PublishStatus,
    to: PublishStatus,
) -> Result<(), PublicationError> {
    if !from.can_transition_to(to) {
        return Err(PublicationError::InvalidTransition { from, to });
    }

    Ok(())
}

fn parse_status(
    entity: &'static str,
    id: Uuid,
    value: &str,
) -> Result<PublishStatus, PublicationError> {
    value
        .parse()
        .map_err(|_| PublicationError::CorruptStatus {
            entity,
            id,
            value: value.to_string(),
        })
}

/// Service for lesson publication lifecycle operations
#[derive(Debug, Clone)]
pub struct LessonPublicationService {
    pool: PgPool,
}

impl LessonPublicationService {
    /// Create a new lesson publication service
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn load_lesson(&self, lesson_id: Uuid) -> Result<Lesson, PublicationError> {
        Lesson::find_by_id(&self.pool, lesson_id)
            .await?
            .ok_or(PublicationError::NotFound {
                entity: "lesson",
                id: lesson_id,
            })
    }

    /// Publish a lesson immediately, skipping any scheduling step.
    ///
    /// Legal from `draft` and `scheduled`. Does not touch the parent program
    /// — only the scheduler-driven cascade promotes programs.
    #[instrument(skip(self))]
    pub async fn publish_now(&self, lesson_id: Uuid) -> Result<Lesson, PublicationError> {
        let lesson = self.load_lesson(lesson_id).await?;
        let from = parse_status("lesson", lesson_id, &lesson.status)?;
        ensure_transition(from, PublishStatus::Published)?;

        let now = Utc::now();
        let lesson = Lesson::apply_status(
            &self.pool,
            lesson_id,
            PublishStatus::Published,
            None,
            Some(now),
        )
        .await?
        .ok_or(PublicationError::NotFound {
            entity: "lesson",
            id: lesson_id,
        })?;

        info!(lesson_id = %lesson_id, "Lesson published immediately");
        Ok(lesson)
    }

    /// Schedule a lesson for automatic publication at `publish_at`.
    ///
    /// The publish time must lie in the future. Re-scheduling an already
    /// scheduled lesson replaces its publish time.
    #[instrument(skip(self))]
    pub async fn schedule(
        &self,
        lesson_id: Uuid,
        publish_at: DateTime<Utc>,
    ) -> Result<Lesson, PublicationError> {
        if publish_at <= Utc::now() {
            return Err(PublicationError::ValidationFailed(
                "publish time must lie in the future".to_string(),
            ));
        }

        let lesson = self.load_lesson(lesson_id).await?;
        let from = parse_status("lesson", lesson_id, &lesson.status)?;
        ensure_transition(from, PublishStatus::Scheduled)?;

        let lesson = Lesson::apply_status(
            &self.pool,
            lesson_id,
            PublishStatus::Scheduled,
            Some(publish_at),
            None,
        )
        .await?
        .ok_or(PublicationError::NotFound {
            entity: "lesson",
            id: lesson_id,
        })?;

        info!(lesson_id = %lesson_id, publish_at = %publish_at, "Lesson scheduled");
        Ok(lesson)
    }

    /// Archive a lesson; legal from any prior state.
    #[instrument(skip(self))]
    pub async fn archive(&self, lesson_id: Uuid) -> Result<Lesson, PublicationError> {
        let lesson = self.load_lesson(lesson_id).await?;
        let from = parse_status("lesson", lesson_id, &lesson.status)?;
        ensure_transition(from, PublishStatus::Archived)?;

        let lesson = Lesson::apply_status(
            &self.pool,
            lesson_id,
            PublishStatus::Archived,
            None,
            None,
        )
        .await?
        .ok_or(PublicationError::NotFound {
            entity: "lesson",
            id: lesson_id,
        })?;

        info!(lesson_id = %lesson_id, "Lesson archived");
        Ok(lesson)
    }

    /// Find the lessons due for automatic publication at `now`.
    pub async fn find_due(&self, now: DateTime<Utc>) -> Result<Vec<Lesson>, PublicationError> {
        Ok(Lesson::find_due(&self.pool, now).await?)
    }

    /// Publish one due lesson and cascade its program, as a single atomic
    /// unit against the store.
    ///
    /// The lesson's status is re-read inside the transaction — a status read
    /// before the transaction began must not be trusted, since the lesson may
    /// have been published or archived concurrently between selection and
    /// execution. A lesson no longer `scheduled` is returned as-is without
    /// any write, making the operation idempotent and safe to retry.
    #[instrument(skip(self))]
    pub async fn publish_due_lesson(
        &self,
        lesson_id: Uuid,
    ) -> Result<LessonContext, PublicationError> {
        let mut tx = self.pool.begin().await?;

        let context = Lesson::find_with_context(&mut tx, lesson_id)
            .await?
            .ok_or(PublicationError::NotFound {
                entity: "lesson",
                id: lesson_id,
            })?;

        let lesson_status = parse_status("lesson", lesson_id, &context.lesson.status)?;
        let program_status =
            parse_status("program", context.program.id, &context.program.status)?;

        let plan = plan_publish_cascade(lesson_status, program_status);
        if !plan.publish_lesson {
            tx.commit().await?;
            debug!(
                lesson_id = %lesson_id,
                status = %context.lesson.status,
                "Lesson no longer scheduled, publish is a no-op"
            );
            return Ok(context);
        }

        let now = Utc::now();
        let updated = Lesson::mark_published(&mut tx, lesson_id, now).await?;
        if !updated {
            // A concurrent transition moved the lesson out of `scheduled`
            // between our read and the conditional write; abandon the
            // transaction and report current state.
            tx.rollback().await?;
            let mut conn = self.pool.acquire().await?;
            return Lesson::find_with_context(&mut conn, lesson_id)
                .await?
                .ok_or(PublicationError::NotFound {
                    entity: "lesson",
                    id: lesson_id,
                });
        }

        if plan.promote_program {
            Program::promote_to_published(&mut tx, context.program.id, now).await?;
        }

        let context = Lesson::find_with_context(&mut tx, lesson_id)
            .await?
            .ok_or(PublicationError::NotFound {
                entity: "lesson",
                id: lesson_id,
            })?;

        tx.commit().await?;

        info!(
            lesson_id = %lesson_id,
            program_id = %context.program.id,
            program_status = %context.program.status,
            "Published scheduled lesson"
        );
        Ok(context)
    }
}

/// Service for direct program lifecycle operations
#[derive(Debug, Clone)]
pub struct ProgramPublicationService {
    pool: PgPool,
}

impl ProgramPublicationService {
    /// Create a new program publication service
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn load_program(&self, program_id: Uuid) -> Result<Program, PublicationError> {
        Program::find_by_id(&self.pool, program_id)
            .await?
            .ok_or(PublicationError::NotFound {
                entity: "program",
                id: program_id,
            })
    }

    /// Publish a program directly, independent of its lessons.
    #[instrument(skip(self))]
    pub async fn publish_now(&self, program_id: Uuid) -> Result<Program, PublicationError> {
        let program = self.load_program(program_id).await?;
        let from = parse_status("program", program_id, &program.status)?;
        ensure_transition(from, PublishStatus::Published)?;

        let program = Program::apply_status(
            &self.pool,
            program_id,
            PublishStatus::Published,
            Some(Utc::now()),
        )
        .await?
        .ok_or(PublicationError::NotFound {
            entity: "program",
            id: program_id,
        })?;

        info!(program_id = %program_id, "Program published");
        Ok(program)
    }

    /// Archive a program; legal from any prior state.
    #[instrument(skip(self))]
    pub async fn archive(&self, program_id: Uuid) -> Result<Program, PublicationError> {
        let program = self.load_program(program_id).await?;
        let from = parse_status("program", program_id, &program.status)?;
        ensure_transition(from, PublishStatus::Archived)?;

        let program =
            Program::apply_status(&self.pool, program_id, PublishStatus::Archived, None)
                .await?
                .ok_or(PublicationError::NotFound {
                    entity: "program",
                    id: program_id,
                })?;

        info!(program_id = %program_id, "Program archived");
        Ok(program)
    }
}
