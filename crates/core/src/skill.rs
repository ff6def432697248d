//! Skill catalog - learnable units, prerequisite edges and resources.

use serde::{Deserialize, Serialize};
use crate::id::{ResourceId, SkillId, UserId};
use crate::Time;

/// A curriculum stage. Variants are declared in canonical order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Fundamentals every later skill builds on
    Foundation,
    /// The main body of the target role
    Core,
    /// Specialised or senior-level material
    Advanced,
}

impl Phase {
    /// All phases in canonical order.
    pub const ALL: [Phase; 3] = [Phase::Foundation, Phase::Core, Phase::Advanced];

    /// Position in the canonical order, starting at 0.
    pub fn index(self) -> usize {
        match self {
            Phase::Foundation => 0,
            Phase::Core => 1,
            Phase::Advanced => 2,
        }
    }

    /// Priority bonus rank: earlier phases rank higher.
    pub fn rank(self) -> i64 {
        (Self::ALL.len() - 1 - self.index()) as i64
    }

    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Foundation => "foundation",
            Phase::Core => "core",
            Phase::Advanced => "advanced",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Phase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "foundation" => Ok(Phase::Foundation),
            "core" => Ok(Phase::Core),
            "advanced" => Ok(Phase::Advanced),
            other => Err(format!("unknown phase: {}", other)),
        }
    }
}

/// A catalog skill. Read-only to the planner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Skill {
    /// Unique identifier
    pub id: SkillId,

    /// Stable human-readable key
    pub slug: String,

    /// Display name
    pub name: String,

    /// Curriculum stage
    pub phase: Phase,

    /// Curator estimate of learning time, in hours
    pub estimated_hours: f64,

    /// Optional skills are never required by default
    #[serde(default)]
    pub is_optional: bool,

    /// Curator-assigned ordering hint (lower comes first)
    #[serde(default)]
    pub sequence_order: i32,
}

impl Skill {
    /// Create a skill with a fresh id.
    pub fn new(slug: impl Into<String>, phase: Phase, estimated_hours: f64) -> Self {
        let slug = slug.into();
        Self {
            id: SkillId::new(),
            name: slug.clone(),
            slug,
            phase,
            estimated_hours,
            is_optional: false,
            sequence_order: 0,
        }
    }

    /// Set the curator ordering hint.
    pub fn with_sequence_order(mut self, order: i32) -> Self {
        self.sequence_order = order;
        self
    }

    /// Mark the skill optional.
    pub fn optional(mut self) -> Self {
        self.is_optional = true;
        self
    }
}

/// `skill_id` depends on `depends_on_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DependencyEdge {
    /// The dependent skill
    pub skill_id: SkillId,

    /// Its prerequisite
    pub depends_on_id: SkillId,

    /// Mandatory prerequisite
    #[serde(default = "default_hard")]
    pub is_hard: bool,
}

fn default_hard() -> bool {
    true
}

impl DependencyEdge {
    /// A hard prerequisite edge.
    pub fn new(skill_id: SkillId, depends_on_id: SkillId) -> Self {
        Self {
            skill_id,
            depends_on_id,
            is_hard: true,
        }
    }
}

/// A learning resource attached to a skill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    /// Unique identifier
    pub id: ResourceId,

    /// Skill this resource teaches
    pub skill_id: SkillId,

    /// Title
    pub title: String,

    /// Location of the material
    #[serde(default)]
    pub url: Option<String>,

    /// Duration in minutes, when known
    #[serde(default)]
    pub duration_minutes: Option<u32>,

    /// Curator quality score (0.0 - 1.0)
    #[serde(default)]
    pub quality: f32,
}

impl Resource {
    /// Create a resource with an optional duration.
    pub fn new(skill_id: SkillId, title: impl Into<String>, duration_minutes: Option<u32>) -> Self {
        Self {
            id: ResourceId::new(),
            skill_id,
            title: title.into(),
            url: None,
            duration_minutes,
            quality: 0.0,
        }
    }
}

/// Skills a learner declared during onboarding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSkillProfile {
    /// Owner
    pub user_id: UserId,

    /// Known skills, each either a skill id or a slug
    pub known_skills: Vec<String>,

    /// Last updated
    pub updated_at: Time,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_rank_rewards_earlier_phases() {
        assert!(Phase::Foundation.rank() > Phase::Core.rank());
        assert!(Phase::Core.rank() > Phase::Advanced.rank());
        assert_eq!(Phase::Advanced.rank(), 0);
    }

    #[test]
    fn test_phase_parse() {
        assert_eq!("Core".parse::<Phase>(), Ok(Phase::Core));
        assert!("expert".parse::<Phase>().is_err());
    }

    #[test]
    fn test_phase_serializes_snake_case() {
        let json = serde_json::to_string(&Phase::Foundation).unwrap();
        assert_eq!(json, "\"foundation\"");
    }

    #[test]
    fn test_edge_defaults_to_hard() {
        let json = format!(
            r#"{{"skill_id":"{}","depends_on_id":"{}"}}"#,
            SkillId::new(),
            SkillId::new()
        );
        let edge: DependencyEdge = serde_json::from_str(&json).unwrap();
        assert!(edge.is_hard);
    }
}
