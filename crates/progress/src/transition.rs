//! Per-module progress state machine.
//!
//! ```text
//! not_started -> in_progress -> completed
//!      ^                            |
//!      +--------- reset ------------+
//! any state -> skipped
//! ```

use skillpath_core::{Progress, ProgressStatus, Time};

/// What a status change did to a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Target equals the current status
    Unchanged,
    /// Work started (or resumed)
    Started,
    /// The module became completed
    Completed,
    /// Moved back to not started
    Reset,
    /// The module was skipped
    Skipped,
}

impl Transition {
    /// True only for a fresh completion; repeats report `Unchanged`.
    pub fn is_completion(self) -> bool {
        self == Transition::Completed
    }
}

/// Move `record` to `target`.
///
/// Timestamps: starting sets `started_at` once; completing sets
/// `completed_at` and backfills a missing `started_at`; resetting or resuming
/// a completed module clears `completed_at`. Skipping only changes status.
pub fn apply_transition(record: &mut Progress, target: ProgressStatus, now: Time) -> Transition {
    if record.status == target {
        return Transition::Unchanged;
    }

    let was_completed = record.status == ProgressStatus::Completed;
    record.status = target;

    match target {
        ProgressStatus::InProgress => {
            record.started_at.get_or_insert(now);
            if was_completed {
                record.completed_at = None;
            }
            Transition::Started
        }
        ProgressStatus::Completed => {
            record.completed_at = Some(now);
            record.started_at.get_or_insert(now);
            Transition::Completed
        }
        ProgressStatus::NotStarted => {
            record.completed_at = None;
            Transition::Reset
        }
        ProgressStatus::Skipped => Transition::Skipped,
    }
}
