//! # Term Model
//!
//! Structural grouping between a program and its lessons. Terms carry no
//! publication lifecycle of their own.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// Maps to the `catalog_terms` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Term {
    pub id: Uuid,
    pub program_id: Uuid,
    pub term_number: i32,
    pub title: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// New Term for creation (without generated fields)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTerm {
    pub program_id: Uuid,
    pub term_number: i32,
    pub title: Option<String>,
}

impl Term {
    /// Create a new term within a program
    pub async fn create(pool: &PgPool, new_term: NewTerm) -> Result<Term, sqlx::Error> {
        sqlx::query_as::<_, Term>(
            r#"
            INSERT INTO catalog_terms (id, program_id, term_number, title)
            VALUES ($1, $2, $3, $4)
            RETURNING id, program_id, term_number, title, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(new_term.program_id)
        .bind(new_term.term_number)
        .bind(&new_term.title)
        .fetch_one(pool)
        .await
    }

    /// Find a term by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Term>, sqlx::Error> {
        sqlx::query_as::<_, Term>(
            r#"
            SELECT id, program_id, term_number, title, created_at, updated_at
            FROM catalog_terms
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// List the terms of a program in term-number order
    pub async fn list_for_program(
        pool: &PgPool,
        program_id: Uuid,
    ) -> Result<Vec<Term>, sqlx::Error> {
        sqlx::query_as::<_, Term>(
            r#"
            SELECT id, program_id, term_number, title, created_at, updated_at
            FROM catalog_terms
            WHERE program_id = $1
            ORDER BY term_number
            "#,
        )
        .bind(program_id)
        .fetch_all(pool)
        .await
    }

    /// Update a term's number or title
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        term_number: Option<i32>,
        title: Option<String>,
    ) -> Result<Term, sqlx::Error> {
        sqlx::query_as::<_, Term>(
            r#"
            UPDATE catalog_terms
            SET
                term_number = COALESCE($2, term_number),
                title = COALESCE($3, title),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, program_id, term_number, title, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(term_number)
        .bind(&title)
        .fetch_one(pool)
        .await
    }

    /// Delete a term (hard delete; lessons cascade)
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM catalog_terms WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
