// Publishing module for the catalog lifecycle
//
// The publication services own every status mutation; the scheduler is the
// recurring task that promotes due lessons through the cascading publish
// transaction.

pub mod scheduler;
pub mod service;

// Re-export main types for convenient access
pub use scheduler::{PublishingScheduler, PublishingSchedulerConfig, TickOutcome};
pub use service::{LessonPublicationService, ProgramPublicationService, PublicationError};
