#![allow(clippy::doc_markdown)] // Allow technical terms like PostgreSQL, SQLx in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Catalog Core Rust
//!
//! Rust core for a hierarchical educational catalog (Program → Term →
//! Lesson) with a scheduled-publishing workflow.
//!
//! ## Overview
//!
//! Lessons and programs share a four-state publication lifecycle
//! (`draft → scheduled → published → archived`). The correctness-critical
//! piece is the cascading publish transaction: one atomic unit that flips a
//! due lesson from `scheduled` to `published` and, when the lesson is the
//! program's first to go live, promotes the parent program. A recurring
//! scheduler polls for due lessons once a minute and drives each through
//! that transaction, isolating per-lesson failures.
//!
//! Both status flips are conditional writes keyed on the expected prior
//! status (`WHERE status = 'scheduled'`, `WHERE status <> 'published'`), so
//! concurrent or retried invocations converge on an idempotent no-op instead
//! of double-publishing.
//!
//! ## Module Organization
//!
//! - [`models`] - Data layer for programs, terms, lessons, and topics
//! - [`database`] - Connection pool and embedded migrations
//! - [`state_machine`] - Shared status model and the pure cascade planner
//! - [`publishing`] - Publication services and the recurring scheduler
//! - [`config`] - Configuration management
//! - [`error`] - Structured error handling
//! - [`logging`] - Tracing bootstrap
//! - [`validation`] - Content validation for creation/update payloads
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use catalog_core::config::CatalogConfig;
//! use catalog_core::database::DatabaseConnection;
//! use catalog_core::publishing::{PublishingScheduler, PublishingSchedulerConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = CatalogConfig::from_env()?;
//! let db = DatabaseConnection::new(&config).await?;
//!
//! let scheduler = PublishingScheduler::new(
//!     db.pool().clone(),
//!     PublishingSchedulerConfig::from_catalog_config(&config),
//! );
//! scheduler.start().await;
//! # Ok(())
//! # }
//! ```
//!
//! ## Testing
//!
//! Unit tests cover the status model and cascade planner without a store;
//! `#[sqlx::test]` integration tests exercise the transaction and scheduler
//! against an isolated database per test:
//!
//! ```bash
//! cargo test --lib    # Unit tests
//! cargo test          # All tests
//! ```

pub mod config;
pub mod database;
pub mod error;
pub mod logging;
pub mod models;
pub mod publishing;
pub mod state_machine;
pub mod validation;

pub use config::CatalogConfig;
pub use error::{CatalogError, Result};
pub use models::{Lesson, LessonContext, Program, Term, Topic};
pub use publishing::{
    LessonPublicationService, ProgramPublicationService, PublicationError, PublishingScheduler,
    PublishingSchedulerConfig,
};
pub use state_machine::PublishStatus;
