//! Pure planning for the cascading publish operation.
//!
//! Given the statuses read inside the publish transaction, the planner decides
//! which of the two conditional writes apply: flipping the lesson to
//! `published`, and promoting its parent program. Keeping this decision free
//! of store types lets the transition logic be unit-tested without a live
//! transaction; the transaction layer is responsible for executing each write
//! as a compare-and-swap keyed on the expected prior status.

use super::states::PublishStatus;

/// The pair of writes a cascading publish may apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CascadePlan {
    /// Flip the lesson `scheduled -> published`
    pub publish_lesson: bool,
    /// Promote the parent program to `published`
    pub promote_program: bool,
}

impl CascadePlan {
    /// A plan that applies no writes (the idempotent no-op path).
    pub fn noop() -> Self {
        Self {
            publish_lesson: false,
            promote_program: false,
        }
    }

    pub fn is_noop(&self) -> bool {
        !self.publish_lesson && !self.promote_program
    }
}

/// Decide the writes for publishing one due lesson.
///
/// Only a lesson still in `scheduled` is published; anything else is a no-op,
/// which is what makes concurrent or retried invocations safe. The program is
/// promoted exactly when the lesson write applies and the program is not
/// already `published` — promotion is one-directional and never repeats.
pub fn plan_publish_cascade(
    lesson_status: PublishStatus,
    program_status: PublishStatus,
) -> CascadePlan {
    if lesson_status != PublishStatus::Scheduled {
        return CascadePlan::noop();
    }

    CascadePlan {
        publish_lesson: true,
        promote_program: program_status != PublishStatus::Published,
    }
}
