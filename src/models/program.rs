//! # Program Model
//!
//! Top level of the catalog hierarchy. A program owns terms (which own
//! lessons), carries a publication status, and is promoted to `published`
//! by the cascading publish transaction as soon as its first lesson goes
//! live. Promotion is one-directional: nothing in this crate demotes a
//! program or rewrites its `published_at`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;

use crate::error::Result;
use crate::state_machine::PublishStatus;
use crate::validation;

use super::topic::Topic;

/// Maps to the `catalog_programs` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Program {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub language_primary: String,
    pub languages_available: Vec<String>,
    pub status: String,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// New Program for creation (without generated fields)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProgram {
    pub title: String,
    pub description: Option<String>,
    pub language_primary: String,
    pub languages_available: Vec<String>,
    pub topic_ids: Vec<Uuid>,
}

/// Partial update of program metadata
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateProgram {
    pub title: Option<String>,
    pub description: Option<String>,
    pub language_primary: Option<String>,
    pub languages_available: Option<Vec<String>>,
}

const PROGRAM_COLUMNS: &str = "id, title, description, language_primary, languages_available, \
     status, published_at, created_at, updated_at";

impl Program {
    /// Parse the stored status into the shared lifecycle enum
    pub fn publish_status(&self) -> std::result::Result<PublishStatus, String> {
        self.status.parse()
    }

    /// Create a new program in `draft` status
    pub async fn create(pool: &PgPool, new_program: NewProgram) -> Result<Program> {
        validation::validate_new_program(&new_program)?;

        let program = sqlx::query_as::<_, Program>(&format!(
            r#"
            INSERT INTO catalog_programs (id, title, description, language_primary, languages_available)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {PROGRAM_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&new_program.title)
        .bind(&new_program.description)
        .bind(&new_program.language_primary)
        .bind(&new_program.languages_available)
        .fetch_one(pool)
        .await?;

        if !new_program.topic_ids.is_empty() {
            Self::set_topics(pool, program.id, &new_program.topic_ids).await?;
        }

        Ok(program)
    }

    /// Find a program by ID
    pub async fn find_by_id(
        pool: &PgPool,
        id: Uuid,
    ) -> std::result::Result<Option<Program>, sqlx::Error> {
        sqlx::query_as::<_, Program>(&format!(
            r#"
            SELECT {PROGRAM_COLUMNS}
            FROM catalog_programs
            WHERE id = $1
            "#
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// List all programs, most recently created first
    pub async fn list_all(pool: &PgPool) -> std::result::Result<Vec<Program>, sqlx::Error> {
        sqlx::query_as::<_, Program>(&format!(
            r#"
            SELECT {PROGRAM_COLUMNS}
            FROM catalog_programs
            ORDER BY created_at DESC
            "#
        ))
        .fetch_all(pool)
        .await
    }

    /// List programs in a given lifecycle status
    pub async fn list_by_status(
        pool: &PgPool,
        status: PublishStatus,
    ) -> std::result::Result<Vec<Program>, sqlx::Error> {
        sqlx::query_as::<_, Program>(&format!(
            r#"
            SELECT {PROGRAM_COLUMNS}
            FROM catalog_programs
            WHERE status = $1
            ORDER BY created_at DESC
            "#
        ))
        .bind(status.to_string())
        .fetch_all(pool)
        .await
    }

    /// Update program metadata (not status — status moves through the
    /// publication service or the cascade only)
    pub async fn update_metadata(pool: &PgPool, id: Uuid, update: UpdateProgram) -> Result<Program> {
        validation::validate_program_update(&update)?;

        let program = sqlx::query_as::<_, Program>(&format!(
            r#"
            UPDATE catalog_programs
            SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                language_primary = COALESCE($4, language_primary),
                languages_available = COALESCE($5, languages_available),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {PROGRAM_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&update.title)
        .bind(&update.description)
        .bind(&update.language_primary)
        .bind(&update.languages_available)
        .fetch_one(pool)
        .await?;

        Ok(program)
    }

    /// Apply a status change decided by the publication service.
    ///
    /// `published_at` is passed only when the target status is `published`
    /// and is coalesced against the existing value so it is written at most
    /// once over the program's lifetime.
    pub async fn apply_status(
        pool: &PgPool,
        id: Uuid,
        status: PublishStatus,
        published_at: Option<DateTime<Utc>>,
    ) -> std::result::Result<Option<Program>, sqlx::Error> {
        sqlx::query_as::<_, Program>(&format!(
            r#"
            UPDATE catalog_programs
            SET
                status = $2,
                published_at = COALESCE(published_at, $3),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {PROGRAM_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(status.to_string())
        .bind(published_at)
        .fetch_optional(pool)
        .await
    }

    /// Conditionally promote a program to `published` inside the cascading
    /// publish transaction.
    ///
    /// This is a compare-and-swap keyed on "not already published": the
    /// update applies zero rows when a concurrent cascade from a sibling
    /// lesson already promoted the program, and it never rewrites
    /// `published_at` once set. Returns whether a row was updated.
    pub async fn promote_to_published(
        conn: &mut PgConnection,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> std::result::Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE catalog_programs
            SET
                status = 'published',
                published_at = COALESCE(published_at, $2),
                updated_at = NOW()
            WHERE id = $1 AND status <> 'published'
            "#,
        )
        .bind(id)
        .bind(now)
        .execute(conn)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Replace the program's topic associations
    pub async fn set_topics(
        pool: &PgPool,
        id: Uuid,
        topic_ids: &[Uuid],
    ) -> std::result::Result<(), sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query("DELETE FROM catalog_program_topics WHERE program_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        for topic_id in topic_ids {
            sqlx::query(
                r#"
                INSERT INTO catalog_program_topics (program_id, topic_id)
                VALUES ($1, $2)
                "#,
            )
            .bind(id)
            .bind(topic_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await
    }

    /// List the topics attached to a program
    pub async fn topics(pool: &PgPool, id: Uuid) -> std::result::Result<Vec<Topic>, sqlx::Error> {
        sqlx::query_as::<_, Topic>(
            r#"
            SELECT t.id, t.name, t.created_at, t.updated_at
            FROM catalog_topics t
            INNER JOIN catalog_program_topics pt ON pt.topic_id = t.id
            WHERE pt.program_id = $1
            ORDER BY t.name
            "#,
        )
        .bind(id)
        .fetch_all(pool)
        .await
    }

    /// Delete a program (hard delete; terms and lessons cascade)
    pub async fn delete(pool: &PgPool, id: Uuid) -> std::result::Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM catalog_programs WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
