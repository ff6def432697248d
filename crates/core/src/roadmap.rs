//! Roadmap model - a learner's ordered curriculum for one target role.

use serde::{Deserialize, Serialize};
use crate::id::{ModuleId, RoadmapId, SkillId, UserId};
use crate::skill::Phase;
use crate::Time;

/// A generated curriculum.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Roadmap {
    /// Unique identifier
    pub id: RoadmapId,

    /// Owner
    pub user_id: UserId,

    /// Role the roadmap was generated for
    pub target_role: String,

    /// Buffered estimate over non-skipped modules
    pub estimated_hours: f64,

    /// Raw sum of skill hours over completed modules
    pub completed_hours: f64,

    /// A cycle was pruned while sequencing
    #[serde(default)]
    pub has_circular_dependency: bool,

    /// When created
    pub created_at: Time,

    /// Last updated
    pub updated_at: Time,
}

/// One skill inside a roadmap. Never deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoadmapModule {
    /// Unique identifier
    pub id: ModuleId,

    /// Owning roadmap
    pub roadmap_id: RoadmapId,

    /// Skill taught by this module
    pub skill_id: SkillId,

    /// Curriculum stage
    pub phase: Phase,

    /// Position in the roadmap, unique and contiguous from 1
    pub sequence_order: u32,

    /// Locked until the previous module is completed
    pub is_locked: bool,

    /// Skipped modules are excluded from time aggregates
    pub is_skipped: bool,
}
