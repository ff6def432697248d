//! Priority-aware topological sequencing of skills.
//!
//! Pipeline: restrict the prerequisite graph to the input skills, detect and
//! prune one cycle, run a priority Kahn sort, bucket the result into phases,
//! then verify phase boundaries (diagnostics only).

use serde::Serialize;
use skillpath_core::{DependencyEdge, Phase, SequencerConfig, Skill, SkillId};
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashSet};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::graph::SkillGraph;

/// A skill with its assigned position.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SequencedSkill {
    /// The catalog skill
    pub skill: Skill,
    /// Position in the topological order, starting at 1
    pub sequence_order: u32,
}

/// Skills of one phase, in topological order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhaseGroup {
    /// Phase
    pub phase: Phase,
    /// Skills in this phase
    pub skills: Vec<SequencedSkill>,
    /// Sum of estimated hours
    pub total_hours: f64,
    /// Roadmap position of the first skill in this group
    pub sequence_start: u32,
}

/// Output of [`DependencySequencer::sequence`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SequencingResult {
    /// Every input skill, in topological order
    pub sequenced_skills: Vec<SequencedSkill>,
    /// Non-empty phase buckets in canonical phase order
    pub phase_groups: Vec<PhaseGroup>,
    /// A cycle was found and pruned
    pub has_circular_dependency: bool,
    /// Slugs along the pruned cycle, first slug repeated at the end
    pub circular_dependency_path: Option<Vec<String>>,
}

/// Ordering score: higher is scheduled first.
///
/// Lower curator order, required skills and earlier phases all push a skill
/// forward.
pub fn priority_score(skill: &Skill) -> i64 {
    let base = 1000 - i64::from(skill.sequence_order);
    let optional_penalty = if skill.is_optional { -100 } else { 0 };
    base + optional_penalty + skill.phase.rank() * 10
}

/// Orders skill subsets respecting prerequisites.
#[derive(Debug, Clone, Default)]
pub struct DependencySequencer {
    config: SequencerConfig,
}

impl DependencySequencer {
    /// Create a sequencer.
    pub fn new(config: SequencerConfig) -> Self {
        Self { config }
    }

    /// Sequence `skills`. Total over its input: cycles degrade to a flagged
    /// best-effort order and no skill is ever dropped.
    pub fn sequence(&self, skills: &[Skill], dependencies: &[DependencyEdge]) -> SequencingResult {
        let started = Instant::now();

        // Skills are keyed by id; a repeated id keeps its first occurrence.
        let mut seen = HashSet::new();
        let skills: Vec<&Skill> = skills.iter().filter(|s| seen.insert(s.id)).collect();
        if skills.is_empty() {
            return SequencingResult::default();
        }

        let ids: Vec<SkillId> = skills.iter().map(|s| s.id).collect();
        let mut graph = SkillGraph::restricted(&ids, dependencies);

        let mut circular_dependency_path = None;
        if let Some(cycle) = graph.find_cycle() {
            let mut path: Vec<String> = cycle.iter().map(|&n| skills[n].slug.clone()).collect();
            path.push(skills[cycle[0]].slug.clone());
            warn!("Circular dependency detected: {}", path.join(" -> "));

            let members: HashSet<usize> = cycle.into_iter().collect();
            let removed = graph.remove_edges_within(&members);
            debug!("Pruned {} edges inside the cycle", removed);
            circular_dependency_path = Some(path);
        }

        let order = self.priority_order(&skills, &graph);
        let sequenced_skills: Vec<SequencedSkill> = order
            .iter()
            .enumerate()
            .map(|(pos, &n)| SequencedSkill {
                skill: skills[n].clone(),
                sequence_order: pos as u32 + 1,
            })
            .collect();

        let phase_groups = group_by_phase(&sequenced_skills);
        verify_phase_boundaries(&skills, &graph);

        let elapsed = started.elapsed();
        if elapsed > Duration::from_millis(self.config.performance_budget_ms) {
            warn!(
                "Sequencing {} skills took {:?}, over the {}ms budget",
                skills.len(),
                elapsed,
                self.config.performance_budget_ms
            );
        }

        SequencingResult {
            sequenced_skills,
            phase_groups,
            has_circular_dependency: circular_dependency_path.is_some(),
            circular_dependency_path,
        }
    }

    /// Kahn's algorithm with a max-heap on (score, earliest input position).
    fn priority_order(&self, skills: &[&Skill], graph: &SkillGraph) -> Vec<usize> {
        let n = skills.len();
        let scores: Vec<i64> = skills.iter().map(|s| priority_score(s)).collect();
        let dependents = graph.dependents();
        let mut in_degree: Vec<usize> = (0..n).map(|i| graph.prerequisites(i).len()).collect();
        let mut placed = vec![false; n];
        let mut order = Vec::with_capacity(n);

        let mut ready: BinaryHeap<(i64, Reverse<usize>)> = (0..n)
            .filter(|&i| in_degree[i] == 0)
            .map(|i| (scores[i], Reverse(i)))
            .collect();

        while order.len() < n {
            let next = match ready.pop() {
                Some((_, Reverse(i))) => i,
                None => {
                    // Only reachable when a second cycle survived pruning.
                    let Some(forced) = (0..n)
                        .filter(|&i| !placed[i])
                        .max_by_key(|&i| (scores[i], Reverse(i)))
                    else {
                        break;
                    };
                    warn!(
                        "Residual dependency cycle: placing '{}' before its prerequisites",
                        skills[forced].slug
                    );
                    forced
                }
            };
            if placed[next] {
                continue;
            }
            placed[next] = true;
            order.push(next);

            for &d in &dependents[next] {
                in_degree[d] = in_degree[d].saturating_sub(1);
                if in_degree[d] == 0 && !placed[d] {
                    ready.push((scores[d], Reverse(d)));
                }
            }
        }

        order
    }
}

fn group_by_phase(sequenced: &[SequencedSkill]) -> Vec<PhaseGroup> {
    let mut groups = Vec::new();
    let mut next_start = 1u32;

    for phase in Phase::ALL {
        let skills: Vec<SequencedSkill> = sequenced
            .iter()
            .filter(|s| s.skill.phase == phase)
            .cloned()
            .collect();
        if skills.is_empty() {
            continue;
        }
        let total_hours = skills.iter().map(|s| s.skill.estimated_hours).sum();
        let len = skills.len() as u32;
        groups.push(PhaseGroup {
            phase,
            skills,
            total_hours,
            sequence_start: next_start,
        });
        next_start += len;
    }

    groups
}

/// Warn about prerequisites that land in a later phase than their
/// dependents. Returns the number of violations.
fn verify_phase_boundaries(skills: &[&Skill], graph: &SkillGraph) -> usize {
    let mut violations = 0;
    for (node, skill) in skills.iter().enumerate() {
        for &p in graph.prerequisites(node) {
            let prereq = skills[p];
            if prereq.phase > skill.phase {
                warn!(
                    "Phase boundary violation: '{}' ({}) depends on '{}' ({})",
                    skill.slug, skill.phase, prereq.slug, prereq.phase
                );
                violations += 1;
            }
        }
    }
    violations
}

#[cfg(test)]
mod tests {
    use super::*;

    fn skill(slug: &str, phase: Phase, hours: f64, order: i32) -> Skill {
        Skill::new(slug, phase, hours).with_sequence_order(order)
    }

    fn slugs(result: &SequencingResult) -> Vec<&str> {
        result.sequenced_skills.iter().map(|s| s.skill.slug.as_str()).collect()
    }

    fn position(result: &SequencingResult, id: SkillId) -> usize {
        result
            .sequenced_skills
            .iter()
            .position(|s| s.skill.id == id)
            .unwrap()
    }

    #[test]
    fn test_priority_score_formula() {
        let base = skill("a", Phase::Advanced, 1.0, 5);
        assert_eq!(priority_score(&base), 995);
        assert_eq!(priority_score(&base.clone().optional()), 895);
        assert_eq!(priority_score(&skill("b", Phase::Foundation, 1.0, 5)), 1015);
    }

    #[test]
    fn test_empty_input() {
        let result = DependencySequencer::default().sequence(&[], &[]);
        assert!(result.sequenced_skills.is_empty());
        assert!(result.phase_groups.is_empty());
        assert!(!result.has_circular_dependency);
    }

    #[test]
    fn test_topological_validity() {
        let html = skill("html", Phase::Foundation, 10.0, 9);
        let css = skill("css", Phase::Foundation, 10.0, 1);
        let js = skill("js", Phase::Core, 20.0, 0);
        let react = skill("react", Phase::Advanced, 30.0, 0);
        let edges = vec![
            DependencyEdge::new(css.id, html.id),
            DependencyEdge::new(js.id, html.id),
            DependencyEdge::new(react.id, js.id),
            DependencyEdge::new(react.id, css.id),
        ];
        let skills = vec![react.clone(), js.clone(), css.clone(), html.clone()];

        let result = DependencySequencer::default().sequence(&skills, &edges);
        assert_eq!(result.sequenced_skills.len(), 4);
        for edge in &edges {
            assert!(position(&result, edge.depends_on_id) < position(&result, edge.skill_id));
        }
        let orders: Vec<u32> = result.sequenced_skills.iter().map(|s| s.sequence_order).collect();
        assert_eq!(orders, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_priority_tie_break_prefers_lower_sequence_order() {
        let late = skill("late-root", Phase::Core, 5.0, 7);
        let early = skill("early-root", Phase::Core, 5.0, 2);
        let leaf = skill("leaf", Phase::Core, 5.0, 0);
        let edges = vec![
            DependencyEdge::new(leaf.id, late.id),
            DependencyEdge::new(leaf.id, early.id),
        ];

        let result = DependencySequencer::default()
            .sequence(&[leaf.clone(), late.clone(), early.clone()], &edges);
        assert_eq!(slugs(&result), vec!["early-root", "late-root", "leaf"]);
    }

    #[test]
    fn test_equal_scores_keep_input_order() {
        let a = skill("a", Phase::Core, 1.0, 0);
        let b = skill("b", Phase::Core, 1.0, 0);
        let c = skill("c", Phase::Core, 1.0, 0);

        let sequencer = DependencySequencer::default();
        let first = sequencer.sequence(&[b.clone(), a.clone(), c.clone()], &[]);
        let second = sequencer.sequence(&[b, a, c], &[]);
        assert_eq!(slugs(&first), vec!["b", "a", "c"]);
        assert_eq!(first, second);
    }

    #[test]
    fn test_optional_skills_sort_after_required() {
        let optional = skill("extra", Phase::Foundation, 1.0, 0).optional();
        let required = skill("must", Phase::Foundation, 1.0, 50);

        let result = DependencySequencer::default().sequence(&[optional, required], &[]);
        assert_eq!(slugs(&result), vec!["must", "extra"]);
    }

    #[test]
    fn test_cycle_tolerance() {
        let a = skill("a", Phase::Core, 1.0, 1);
        let b = skill("b", Phase::Core, 1.0, 2);
        let c = skill("c", Phase::Core, 1.0, 3);
        // A -> C, B -> A, C -> B
        let edges = vec![
            DependencyEdge::new(a.id, c.id),
            DependencyEdge::new(b.id, a.id),
            DependencyEdge::new(c.id, b.id),
        ];

        let result = DependencySequencer::default().sequence(&[a, b, c], &edges);
        assert!(result.has_circular_dependency);
        let path = result.circular_dependency_path.clone().unwrap();
        assert_eq!(path, vec!["a", "c", "b", "a"]);
        assert_eq!(result.sequenced_skills.len(), 3);
    }

    #[test]
    fn test_cycle_pruning_keeps_edges_to_outside_skills() {
        let base = skill("base", Phase::Foundation, 1.0, 99);
        let x = skill("x", Phase::Core, 1.0, 1);
        let y = skill("y", Phase::Core, 1.0, 2);
        // x <-> y, and x still needs base
        let edges = vec![
            DependencyEdge::new(x.id, y.id),
            DependencyEdge::new(y.id, x.id),
            DependencyEdge::new(x.id, base.id),
        ];

        let result = DependencySequencer::default().sequence(&[x.clone(), y, base.clone()], &edges);
        assert!(result.has_circular_dependency);
        assert!(position(&result, base.id) < position(&result, x.id));
    }

    #[test]
    fn test_second_cycle_still_places_every_skill() {
        let a = skill("a", Phase::Core, 1.0, 1);
        let b = skill("b", Phase::Core, 1.0, 2);
        let c = skill("c", Phase::Core, 1.0, 3);
        let d = skill("d", Phase::Core, 1.0, 4);
        let edges = vec![
            DependencyEdge::new(a.id, b.id),
            DependencyEdge::new(b.id, a.id),
            DependencyEdge::new(c.id, d.id),
            DependencyEdge::new(d.id, c.id),
        ];

        let result = DependencySequencer::default().sequence(&[a, b, c, d], &edges);
        assert!(result.has_circular_dependency);
        assert_eq!(result.circular_dependency_path.unwrap(), vec!["a", "b", "a"]);
        assert_eq!(result.sequenced_skills.len(), 4);
    }

    #[test]
    fn test_duplicate_ids_collapse() {
        let a = skill("a", Phase::Core, 1.0, 1);
        let result = DependencySequencer::default().sequence(&[a.clone(), a], &[]);
        assert_eq!(result.sequenced_skills.len(), 1);
    }

    #[test]
    fn test_phase_groups_in_canonical_order() {
        let adv = skill("adv", Phase::Advanced, 8.0, 0);
        let core1 = skill("core1", Phase::Core, 4.0, 1);
        let core2 = skill("core2", Phase::Core, 6.0, 2);
        let found = skill("found", Phase::Foundation, 2.0, 3);

        let result = DependencySequencer::default()
            .sequence(&[adv, core2, core1, found], &[]);
        let phases: Vec<Phase> = result.phase_groups.iter().map(|g| g.phase).collect();
        assert_eq!(phases, vec![Phase::Foundation, Phase::Core, Phase::Advanced]);

        let core = &result.phase_groups[1];
        let core_slugs: Vec<_> = core.skills.iter().map(|s| s.skill.slug.as_str()).collect();
        assert_eq!(core_slugs, vec!["core1", "core2"]);
        assert_eq!(core.total_hours, 10.0);
        assert_eq!(core.sequence_start, 2);
        assert_eq!(result.phase_groups[2].sequence_start, 4);
    }

    #[test]
    fn test_phase_boundary_violation_is_diagnostic_only() {
        let basic = skill("basic", Phase::Foundation, 1.0, 0);
        let deep = skill("deep", Phase::Advanced, 1.0, 0);
        let edges = vec![DependencyEdge::new(basic.id, deep.id)];
        let refs = [&basic, &deep];
        let ids = [basic.id, deep.id];

        let graph = SkillGraph::restricted(&ids, &edges);
        assert_eq!(verify_phase_boundaries(&refs, &graph), 1);

        let result = DependencySequencer::default().sequence(&[basic.clone(), deep.clone()], &edges);
        assert_eq!(slugs(&result), vec!["deep", "basic"]);
    }
}
