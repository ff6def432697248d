//! Gap analysis: which required skills a learner still has to learn.

use serde::Serialize;
use skillpath_core::{DependencyEdge, Skill, SkillId};
use std::collections::HashSet;
use tracing::debug;

use crate::graph::SkillGraph;
use crate::sequencer::{DependencySequencer, PhaseGroup, SequencedSkill};

/// Result of a gap analysis.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GapAnalysis {
    /// Required skills not yet satisfied, in required-skills order
    pub missing_skills: Vec<Skill>,
    /// Missing skills in learning order
    pub ordered_skills: Vec<SequencedSkill>,
    /// Ordered skills bucketed by phase
    pub phase_groups: Vec<PhaseGroup>,
    /// Sum of estimated hours over the ordered skills
    pub total_hours: f64,
    /// Sequencing pruned a cycle
    pub has_circular_dependency: bool,
    /// The pruned cycle, if any
    pub circular_dependency_path: Option<Vec<String>>,
}

/// Computes the transitively-unsatisfied subset of required skills.
#[derive(Debug, Clone, Default)]
pub struct GapAnalyzer {
    sequencer: DependencySequencer,
}

impl GapAnalyzer {
    /// Create an analyzer that orders its output with `sequencer`.
    pub fn new(sequencer: DependencySequencer) -> Self {
        Self { sequencer }
    }

    /// A required skill is satisfied when it is known, or when some known
    /// skill transitively depends on it. Total over its input: an empty
    /// requirement list is the degenerate empty result, not an error.
    pub fn analyze(
        &self,
        required_skills: &[Skill],
        known_skill_ids: &HashSet<SkillId>,
        dependencies: &[DependencyEdge],
    ) -> GapAnalysis {
        if required_skills.is_empty() {
            return GapAnalysis::default();
        }

        let graph = SkillGraph::from_edges(dependencies);
        let satisfied = graph.satisfied_by(known_skill_ids);

        let missing_skills: Vec<Skill> = required_skills
            .iter()
            .filter(|s| !satisfied.contains(&s.id))
            .cloned()
            .collect();
        debug!(
            "Gap analysis: {} required, {} satisfied, {} missing",
            required_skills.len(),
            required_skills.len() - missing_skills.len(),
            missing_skills.len()
        );

        let sequencing = self.sequencer.sequence(&missing_skills, dependencies);
        let total_hours = sequencing
            .sequenced_skills
            .iter()
            .map(|s| s.skill.estimated_hours)
            .sum();

        GapAnalysis {
            missing_skills,
            ordered_skills: sequencing.sequenced_skills,
            phase_groups: sequencing.phase_groups,
            total_hours,
            has_circular_dependency: sequencing.has_circular_dependency,
            circular_dependency_path: sequencing.circular_dependency_path,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skillpath_core::Phase;

    fn known(ids: &[SkillId]) -> HashSet<SkillId> {
        ids.iter().copied().collect()
    }

    #[test]
    fn test_transitive_satisfaction() {
        let a = Skill::new("a", Phase::Advanced, 5.0);
        let b = Skill::new("b", Phase::Core, 5.0);
        let c = Skill::new("c", Phase::Foundation, 5.0);
        // A depends on B depends on C
        let edges = vec![DependencyEdge::new(a.id, b.id), DependencyEdge::new(b.id, c.id)];

        // C is known directly.
        let analysis = GapAnalyzer::default().analyze(&[c.clone()], &known(&[c.id]), &edges);
        assert!(analysis.missing_skills.is_empty());

        // Knowing A implies B and C.
        let analysis = GapAnalyzer::default()
            .analyze(&[a.clone(), b.clone(), c.clone()], &known(&[a.id]), &edges);
        assert!(analysis.missing_skills.is_empty());
        assert_eq!(analysis.total_hours, 0.0);
    }

    #[test]
    fn test_known_leaf_does_not_satisfy_dependents() {
        let a = Skill::new("a", Phase::Advanced, 5.0);
        let b = Skill::new("b", Phase::Core, 3.0);
        let c = Skill::new("c", Phase::Foundation, 2.0);
        let edges = vec![DependencyEdge::new(a.id, b.id), DependencyEdge::new(b.id, c.id)];

        let analysis = GapAnalyzer::default()
            .analyze(&[a.clone(), b.clone(), c.clone()], &known(&[c.id]), &edges);
        let missing: Vec<_> = analysis.missing_skills.iter().map(|s| s.slug.as_str()).collect();
        assert_eq!(missing, vec!["a", "b"]);
        assert_eq!(analysis.total_hours, 8.0);

        let ordered: Vec<_> = analysis.ordered_skills.iter().map(|s| s.skill.slug.as_str()).collect();
        assert_eq!(ordered, vec!["b", "a"]);
    }

    #[test]
    fn test_satisfaction_through_skill_outside_requirements() {
        let a = Skill::new("a", Phase::Core, 5.0);
        let hidden = SkillId::new();
        let c = Skill::new("c", Phase::Foundation, 5.0);
        // known -> hidden -> c
        let known_id = SkillId::new();
        let edges = vec![
            DependencyEdge::new(known_id, hidden),
            DependencyEdge::new(hidden, c.id),
        ];

        let analysis = GapAnalyzer::default().analyze(&[a.clone(), c], &known(&[known_id]), &edges);
        assert_eq!(analysis.missing_skills, vec![a]);
    }

    #[test]
    fn test_missing_skills_keep_required_order() {
        let x = Skill::new("x", Phase::Advanced, 1.0).with_sequence_order(1);
        let y = Skill::new("y", Phase::Foundation, 1.0).with_sequence_order(2);

        let analysis = GapAnalyzer::default().analyze(&[x.clone(), y.clone()], &known(&[]), &[]);
        assert_eq!(analysis.missing_skills, vec![x, y]);
        let ordered: Vec<_> = analysis.ordered_skills.iter().map(|s| s.skill.slug.as_str()).collect();
        assert_eq!(ordered, vec!["y", "x"]);
    }

    #[test]
    fn test_empty_requirements_are_degenerate() {
        let analysis = GapAnalyzer::default().analyze(&[], &known(&[SkillId::new()]), &[]);
        assert_eq!(analysis, GapAnalysis::default());
        assert_eq!(analysis.total_hours, 0.0);
    }

    #[test]
    fn test_cyclic_known_graph_terminates() {
        let a = Skill::new("a", Phase::Core, 1.0);
        let b = Skill::new("b", Phase::Core, 1.0);
        let edges = vec![DependencyEdge::new(a.id, b.id), DependencyEdge::new(b.id, a.id)];

        let analysis = GapAnalyzer::default().analyze(&[a.clone(), b], &known(&[a.id]), &edges);
        assert!(analysis.missing_skills.is_empty());
    }
}
