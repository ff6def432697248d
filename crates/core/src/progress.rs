//! Progress model - a learner's state on one roadmap module.

use serde::{Deserialize, Serialize};
use crate::id::{ModuleId, ProgressId, RoadmapId, UserId};
use crate::Time;

/// Progress status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStatus {
    /// Not started (also the implicit state when no record exists)
    NotStarted,
    /// Being worked on
    InProgress,
    /// Finished
    Completed,
    /// Deliberately skipped
    Skipped,
}

impl ProgressStatus {
    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProgressStatus::NotStarted => "not_started",
            ProgressStatus::InProgress => "in_progress",
            ProgressStatus::Completed => "completed",
            ProgressStatus::Skipped => "skipped",
        }
    }
}

impl std::fmt::Display for ProgressStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ProgressStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "not_started" => Ok(ProgressStatus::NotStarted),
            "in_progress" => Ok(ProgressStatus::InProgress),
            "completed" => Ok(ProgressStatus::Completed),
            "skipped" => Ok(ProgressStatus::Skipped),
            other => Err(format!("unknown progress status: {}", other)),
        }
    }
}

/// One record per (user, module), created lazily on the first status change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    /// Unique identifier
    pub id: ProgressId,

    /// Learner
    pub user_id: UserId,

    /// Roadmap the module belongs to
    pub roadmap_id: RoadmapId,

    /// Module
    pub module_id: ModuleId,

    /// Current status
    pub status: ProgressStatus,

    /// First time work started
    pub started_at: Option<Time>,

    /// Completion time, cleared on reset
    pub completed_at: Option<Time>,

    /// Reported time spent
    pub time_spent_minutes: u32,

    /// Free-form learner notes
    #[serde(default)]
    pub notes: Option<String>,

    /// Last updated
    pub updated_at: Time,
}

impl Progress {
    /// The implicit `not_started` record for a module without one.
    pub fn not_started(user_id: UserId, roadmap_id: RoadmapId, module_id: ModuleId, now: Time) -> Self {
        Self {
            id: ProgressId::new(),
            user_id,
            roadmap_id,
            module_id,
            status: ProgressStatus::NotStarted,
            started_at: None,
            completed_at: None,
            time_spent_minutes: 0,
            notes: None,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse_accepts_dashes() {
        assert_eq!("in-progress".parse::<ProgressStatus>(), Ok(ProgressStatus::InProgress));
        assert_eq!("completed".parse::<ProgressStatus>(), Ok(ProgressStatus::Completed));
        assert!("done".parse::<ProgressStatus>().is_err());
    }

    #[test]
    fn test_status_display_matches_serde() {
        let json = serde_json::to_string(&ProgressStatus::NotStarted).unwrap();
        assert_eq!(json, format!("\"{}\"", ProgressStatus::NotStarted));
    }
}
