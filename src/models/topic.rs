//! # Topic Model
//!
//! Flat taxonomy attached to programs through `catalog_program_topics`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// Maps to the `catalog_topics` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Topic {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Topic {
    /// Create a new topic
    pub async fn create(pool: &PgPool, name: &str) -> Result<Topic, sqlx::Error> {
        sqlx::query_as::<_, Topic>(
            r#"
            INSERT INTO catalog_topics (id, name)
            VALUES ($1, $2)
            RETURNING id, name, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .fetch_one(pool)
        .await
    }

    /// Find a topic by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Topic>, sqlx::Error> {
        sqlx::query_as::<_, Topic>(
            r#"
            SELECT id, name, created_at, updated_at
            FROM catalog_topics
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Find a topic by its unique name
    pub async fn find_by_name(pool: &PgPool, name: &str) -> Result<Option<Topic>, sqlx::Error> {
        sqlx::query_as::<_, Topic>(
            r#"
            SELECT id, name, created_at, updated_at
            FROM catalog_topics
            WHERE name = $1
            "#,
        )
        .bind(name)
        .fetch_optional(pool)
        .await
    }

    /// List all topics
    pub async fn list_all(pool: &PgPool) -> Result<Vec<Topic>, sqlx::Error> {
        sqlx::query_as::<_, Topic>(
            r#"
            SELECT id, name, created_at, updated_at
            FROM catalog_topics
            ORDER BY name
            "#,
        )
        .fetch_all(pool)
        .await
    }

    /// Delete a topic (associations cascade)
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM catalog_topics WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
