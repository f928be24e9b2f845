//! # Lesson Model
//!
//! The publishable unit of the catalog. A lesson belongs to exactly one term,
//! is ordered by `lesson_number` within it, and moves through the shared
//! publication lifecycle. `publish_at` is only meaningful while the lesson is
//! `scheduled`; `published_at` is written exactly once, the first time the
//! lesson becomes `published`, and never cleared or overwritten — both
//! invariants are enforced in SQL (`COALESCE(published_at, $n)`) rather than
//! in read-then-write application code.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgConnection, PgPool};
use std::fmt;
use uuid::Uuid;

use crate::error::Result;
use crate::state_machine::PublishStatus;
use crate::validation;

use super::program::Program;
use super::term::Term;

/// Lesson content kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    Video,
    Article,
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Video => write!(f, "video"),
            Self::Article => write!(f, "article"),
        }
    }
}

impl std::str::FromStr for ContentType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "video" => Ok(Self::Video),
            "article" => Ok(Self::Article),
            _ => Err(format!("Invalid content type: {s}")),
        }
    }
}

/// Maps to the `catalog_lessons` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Lesson {
    pub id: Uuid,
    pub term_id: Uuid,
    pub lesson_number: i32,
    pub title: String,
    pub content_type: String,
    pub duration_ms: Option<i64>,
    pub is_paid: bool,
    pub content_language_primary: String,
    pub content_languages_available: Vec<String>,
    pub content_urls_by_language: serde_json::Value,
    pub subtitle_languages: Vec<String>,
    pub subtitle_urls_by_language: Option<serde_json::Value>,
    pub status: String,
    pub publish_at: Option<DateTime<Utc>>,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// New Lesson for creation (without generated fields)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewLesson {
    pub term_id: Uuid,
    pub lesson_number: i32,
    pub title: String,
    pub content_type: ContentType,
    pub duration_ms: Option<i64>,
    pub is_paid: bool,
    pub content_language_primary: String,
    pub content_languages_available: Vec<String>,
    pub content_urls_by_language: serde_json::Value,
    pub subtitle_languages: Vec<String>,
    pub subtitle_urls_by_language: Option<serde_json::Value>,
}

/// Partial update of lesson content fields
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateLesson {
    pub title: Option<String>,
    pub content_type: Option<ContentType>,
    pub duration_ms: Option<i64>,
    pub is_paid: Option<bool>,
    pub content_language_primary: Option<String>,
    pub content_languages_available: Option<Vec<String>>,
    pub content_urls_by_language: Option<serde_json::Value>,
    pub subtitle_languages: Option<Vec<String>>,
    pub subtitle_urls_by_language: Option<serde_json::Value>,
}

/// A lesson with its resolved term and program, as returned by the
/// cascading publish transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LessonContext {
    pub lesson: Lesson,
    pub term: Term,
    pub program: Program,
}

const LESSON_COLUMNS: &str = "id, term_id, lesson_number, title, content_type, duration_ms, \
     is_paid, content_language_primary, content_languages_available, content_urls_by_language, \
     subtitle_languages, subtitle_urls_by_language, status, publish_at, published_at, \
     created_at, updated_at";

impl Lesson {
    /// Parse the stored status into the shared lifecycle enum
    pub fn publish_status(&self) -> std::result::Result<PublishStatus, String> {
        self.status.parse()
    }

    /// Create a new lesson in `draft` status
    pub async fn create(pool: &PgPool, new_lesson: NewLesson) -> Result<Lesson> {
        validation::validate_new_lesson(&new_lesson)?;

        let lesson = sqlx::query_as::<_, Lesson>(&format!(
            r#"
            INSERT INTO catalog_lessons (
                id, term_id, lesson_number, title, content_type, duration_ms, is_paid,
                content_language_primary, content_languages_available,
                content_urls_by_language, subtitle_languages, subtitle_urls_by_language
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING {LESSON_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(new_lesson.term_id)
        .bind(new_lesson.lesson_number)
        .bind(&new_lesson.title)
        .bind(new_lesson.content_type.to_string())
        .bind(new_lesson.duration_ms)
        .bind(new_lesson.is_paid)
        .bind(&new_lesson.content_language_primary)
        .bind(&new_lesson.content_languages_available)
        .bind(&new_lesson.content_urls_by_language)
        .bind(&new_lesson.subtitle_languages)
        .bind(&new_lesson.subtitle_urls_by_language)
        .fetch_one(pool)
        .await?;

        Ok(lesson)
    }

    /// Update lesson content fields (not status — status moves through the
    /// publication service or the cascade only)
    pub async fn update(pool: &PgPool, id: Uuid, update: UpdateLesson) -> Result<Lesson> {
        validation::validate_lesson_update(&update)?;

        let lesson = sqlx::query_as::<_, Lesson>(&format!(
            r#"
            UPDATE catalog_lessons
            SET
                title = COALESCE($2, title),
                content_type = COALESCE($3, content_type),
                duration_ms = COALESCE($4, duration_ms),
                is_paid = COALESCE($5, is_paid),
                content_language_primary = COALESCE($6, content_language_primary),
                content_languages_available = COALESCE($7, content_languages_available),
                content_urls_by_language = COALESCE($8, content_urls_by_language),
                subtitle_languages = COALESCE($9, subtitle_languages),
                subtitle_urls_by_language = COALESCE($10, subtitle_urls_by_language),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {LESSON_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&update.title)
        .bind(update.content_type.map(|ct| ct.to_string()))
        .bind(update.duration_ms)
        .bind(update.is_paid)
        .bind(&update.content_language_primary)
        .bind(&update.content_languages_available)
        .bind(&update.content_urls_by_language)
        .bind(&update.subtitle_languages)
        .bind(&update.subtitle_urls_by_language)
        .fetch_one(pool)
        .await?;

        Ok(lesson)
    }

    /// Find a lesson by ID
    pub async fn find_by_id(
        pool: &PgPool,
        id: Uuid,
    ) -> std::result::Result<Option<Lesson>, sqlx::Error> {
        sqlx::query_as::<_, Lesson>(&format!(
            r#"
            SELECT {LESSON_COLUMNS}
            FROM catalog_lessons
            WHERE id = $1
            "#
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Find a lesson with its term and program resolved, on an arbitrary
    /// connection so the publish transaction can re-read inside its own
    /// transaction boundary.
    pub async fn find_with_context(
        conn: &mut PgConnection,
        id: Uuid,
    ) -> std::result::Result<Option<LessonContext>, sqlx::Error> {
        let lesson = sqlx::query_as::<_, Lesson>(&format!(
            r#"
            SELECT {LESSON_COLUMNS}
            FROM catalog_lessons
            WHERE id = $1
            "#
        ))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

        let Some(lesson) = lesson else {
            return Ok(None);
        };

        let term = sqlx::query_as::<_, Term>(
            r#"
            SELECT id, program_id, term_number, title, created_at, updated_at
            FROM catalog_terms
            WHERE id = $1
            "#,
        )
        .bind(lesson.term_id)
        .fetch_one(&mut *conn)
        .await?;

        let program = sqlx::query_as::<_, Program>(
            r#"
            SELECT id, title, description, language_primary, languages_available,
                   status, published_at, created_at, updated_at
            FROM catalog_programs
            WHERE id = $1
            "#,
        )
        .bind(term.program_id)
        .fetch_one(&mut *conn)
        .await?;

        Ok(Some(LessonContext {
            lesson,
            term,
            program,
        }))
    }

    /// List the lessons of a term in lesson-number order
    pub async fn list_for_term(
        pool: &PgPool,
        term_id: Uuid,
    ) -> std::result::Result<Vec<Lesson>, sqlx::Error> {
        sqlx::query_as::<_, Lesson>(&format!(
            r#"
            SELECT {LESSON_COLUMNS}
            FROM catalog_lessons
            WHERE term_id = $1
            ORDER BY lesson_number
            "#
        ))
        .bind(term_id)
        .fetch_all(pool)
        .await
    }

    /// Find the lessons due for automatic publication: still `scheduled`,
    /// with a `publish_at` at or before `now`. No ordering guarantee — the
    /// scheduler processes each lesson independently.
    pub async fn find_due(
        pool: &PgPool,
        now: DateTime<Utc>,
    ) -> std::result::Result<Vec<Lesson>, sqlx::Error> {
        sqlx::query_as::<_, Lesson>(&format!(
            r#"
            SELECT {LESSON_COLUMNS}
            FROM catalog_lessons
            WHERE status = 'scheduled' AND publish_at <= $1
            "#
        ))
        .bind(now)
        .fetch_all(pool)
        .await
    }

    /// Apply a status change decided by the publication service.
    ///
    /// `publish_at` is passed only when scheduling and replaces the stored
    /// value; `published_at` is passed only when publishing and is coalesced
    /// against the existing value so it is written at most once.
    pub async fn apply_status(
        pool: &PgPool,
        id: Uuid,
        status: PublishStatus,
        publish_at: Option<DateTime<Utc>>,
        published_at: Option<DateTime<Utc>>,
    ) -> std::result::Result<Option<Lesson>, sqlx::Error> {
        sqlx::query_as::<_, Lesson>(&format!(
            r#"
            UPDATE catalog_lessons
            SET
                status = $2,
                publish_at = COALESCE($3, publish_at),
                published_at = COALESCE(published_at, $4),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {LESSON_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(status.to_string())
        .bind(publish_at)
        .bind(published_at)
        .fetch_optional(pool)
        .await
    }

    /// Conditionally flip a lesson `scheduled -> published` inside the
    /// cascading publish transaction.
    ///
    /// This is a compare-and-swap keyed on the expected prior status: a
    /// concurrent transition that moved the lesson out of `scheduled` between
    /// selection and this write makes it affect zero rows, and the caller
    /// degrades to the idempotent no-op path. Returns whether a row was
    /// updated.
    pub async fn mark_published(
        conn: &mut PgConnection,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> std::result::Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE catalog_lessons
            SET
                status = 'published',
                published_at = COALESCE(published_at, $2),
                updated_at = NOW()
            WHERE id = $1 AND status = 'scheduled'
            "#,
        )
        .bind(id)
        .bind(now)
        .execute(conn)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete a lesson (hard delete)
    pub async fn delete(pool: &PgPool, id: Uuid) -> std::result::Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM catalog_lessons WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
