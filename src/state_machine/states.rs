use serde::{Deserialize, Serialize};
use std::fmt;

/// Publication lifecycle shared by lessons and programs.
///
/// Legal transitions:
/// - `draft -> scheduled`
/// - `draft -> published`
/// - `scheduled -> published`
/// - `scheduled -> scheduled` (re-scheduling with a new publish time)
/// - any state -> `archived`
///
/// No transition leaves `archived` for another state, and no transition
/// re-enters `draft`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PublishStatus {
    /// Initial state on creation, not visible to learners
    Draft,
    /// Queued for automatic publication at `publish_at`
    Scheduled,
    /// Live in the catalog
    Published,
    /// Removed from circulation
    Archived,
}

impl PublishStatus {
    /// Check if this is a terminal state (no transition leaves it)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Archived)
    }

    /// Check if the entity is live in the catalog
    pub fn is_live(&self) -> bool {
        matches!(self, Self::Published)
    }

    /// Check if the entity is waiting on the publishing scheduler
    pub fn is_pending_publication(&self) -> bool {
        matches!(self, Self::Scheduled)
    }

    /// Whether a transition from this state to `target` is legal.
    pub fn can_transition_to(&self, target: PublishStatus) -> bool {
        matches!(
            (self, target),
            (Self::Draft, Self::Scheduled)
                | (Self::Draft, Self::Published)
                | (Self::Scheduled, Self::Scheduled)
                | (Self::Scheduled, Self::Published)
                | (_, Self::Archived)
        )
    }
}

impl fmt::Display for PublishStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Draft => write!(f, "draft"),
            Self::Scheduled => write!(f, "scheduled"),
            Self::Published => write!(f, "published"),
            Self::Archived => write!(f, "archived"),
        }
    }
}

impl std::str::FromStr for PublishStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(Self::Draft),
            "scheduled" => Ok(Self::Scheduled),
            "published" => Ok(Self::Published),
            "archived" => Ok(Self::Archived),
            _ => Err(format!("Invalid publish status: {s}")),
        }
    }
}

/// Default state for newly created lessons and programs
impl Default for PublishStatus {
    fn default() -> Self {
        Self::Draft
    }
}
