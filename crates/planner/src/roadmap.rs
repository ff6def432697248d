//! Roadmap assembly from a gap analysis.

use skillpath_core::{ModuleId, Roadmap, RoadmapId, RoadmapModule, Time, UserId};

use crate::gap::GapAnalysis;

/// Lays out roadmap modules phase by phase.
pub struct RoadmapBuilder;

impl RoadmapBuilder {
    /// Build a roadmap and its modules.
    ///
    /// Modules follow the phase groups with contiguous `sequence_order`
    /// starting at 1. Only the first module starts unlocked. The estimate is
    /// left at zero for the caller to fill in.
    pub fn build(
        user_id: UserId,
        target_role: &str,
        analysis: &GapAnalysis,
        now: Time,
    ) -> (Roadmap, Vec<RoadmapModule>) {
        let roadmap = Roadmap {
            id: RoadmapId::new(),
            user_id,
            target_role: target_role.to_string(),
            estimated_hours: 0.0,
            completed_hours: 0.0,
            has_circular_dependency: analysis.has_circular_dependency,
            created_at: now,
            updated_at: now,
        };

        let modules: Vec<RoadmapModule> = analysis
            .phase_groups
            .iter()
            .flat_map(|group| {
                group
                    .skills
                    .iter()
                    .enumerate()
                    .map(move |(i, s)| (group.sequence_start + i as u32, s))
            })
            .map(|(order, s)| RoadmapModule {
                id: ModuleId::new(),
                roadmap_id: roadmap.id,
                skill_id: s.skill.id,
                phase: s.skill.phase,
                sequence_order: order,
                is_locked: order != 1,
                is_skipped: false,
            })
            .collect();

        (roadmap, modules)
    }
}
