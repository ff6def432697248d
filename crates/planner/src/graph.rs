//! Index-addressed skill prerequisite graph.
//!
//! Nodes live in an arena (`Vec<SkillId>`) and edges are adjacency lists of
//! node indices. Every traversal uses an explicit stack, so malformed or very
//! deep graphs cannot overflow the call stack.

use skillpath_core::{DependencyEdge, SkillId};
use std::collections::{HashMap, HashSet};

/// Directed graph where an edge points from a skill to its prerequisite.
#[derive(Debug, Clone, Default)]
pub struct SkillGraph {
    ids: Vec<SkillId>,
    index: HashMap<SkillId, usize>,
    /// node -> prerequisite nodes, deduplicated, insertion order
    prerequisites: Vec<Vec<usize>>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    OnStack,
    Done,
}

impl SkillGraph {
    /// Graph over every skill mentioned by an edge.
    pub fn from_edges(edges: &[DependencyEdge]) -> Self {
        let mut graph = Self::default();
        for edge in edges {
            let from = graph.intern(edge.skill_id);
            let to = graph.intern(edge.depends_on_id);
            graph.link(from, to);
        }
        graph
    }

    /// Graph over exactly `ids`; edges leaving the set are dropped.
    pub fn restricted(ids: &[SkillId], edges: &[DependencyEdge]) -> Self {
        let mut graph = Self::default();
        for id in ids {
            graph.intern(*id);
        }
        for edge in edges {
            if let (Some(from), Some(to)) = (graph.node(edge.skill_id), graph.node(edge.depends_on_id)) {
                graph.link(from, to);
            }
        }
        graph
    }

    fn intern(&mut self, id: SkillId) -> usize {
        if let Some(&idx) = self.index.get(&id) {
            return idx;
        }
        let idx = self.ids.len();
        self.ids.push(id);
        self.index.insert(id, idx);
        self.prerequisites.push(Vec::new());
        idx
    }

    fn link(&mut self, from: usize, to: usize) {
        if !self.prerequisites[from].contains(&to) {
            self.prerequisites[from].push(to);
        }
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// True when the graph has no nodes.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Node index of a skill.
    pub fn node(&self, id: SkillId) -> Option<usize> {
        self.index.get(&id).copied()
    }

    /// Skill at a node index.
    pub fn id(&self, node: usize) -> SkillId {
        self.ids[node]
    }

    /// Direct prerequisites of a node.
    pub fn prerequisites(&self, node: usize) -> &[usize] {
        &self.prerequisites[node]
    }

    /// Inverse adjacency: node -> nodes that depend on it.
    pub fn dependents(&self) -> Vec<Vec<usize>> {
        let mut dependents = vec![Vec::new(); self.len()];
        for (node, prereqs) in self.prerequisites.iter().enumerate() {
            for &p in prereqs {
                dependents[p].push(node);
            }
        }
        dependents
    }

    /// Every skill `id` transitively depends on, excluding `id` itself
    /// unless it sits on a cycle.
    pub fn prerequisite_closure(&self, id: SkillId) -> HashSet<SkillId> {
        let mut closure = HashSet::new();
        let Some(start) = self.node(id) else {
            return closure;
        };

        let mut visited = vec![false; self.len()];
        let mut stack: Vec<usize> = self.prerequisites[start].clone();
        while let Some(node) = stack.pop() {
            if visited[node] {
                continue;
            }
            visited[node] = true;
            closure.insert(self.ids[node]);
            stack.extend(self.prerequisites[node].iter().copied().filter(|&p| !visited[p]));
        }
        closure
    }

    /// Known skills plus the union of their prerequisite closures.
    pub fn satisfied_by(&self, known: &HashSet<SkillId>) -> HashSet<SkillId> {
        let mut satisfied = known.clone();
        for id in known {
            satisfied.extend(self.prerequisite_closure(*id));
        }
        satisfied
    }

    /// First cycle found by a DFS over nodes in insertion order.
    ///
    /// Returns the nodes on the cycle, starting from the node that was
    /// revisited, in dependent -> prerequisite direction.
    pub fn find_cycle(&self) -> Option<Vec<usize>> {
        let mut marks = vec![Mark::Unvisited; self.len()];

        for start in 0..self.len() {
            if marks[start] != Mark::Unvisited {
                continue;
            }

            // (node, index of the next prerequisite to explore)
            let mut stack: Vec<(usize, usize)> = vec![(start, 0)];
            marks[start] = Mark::OnStack;

            while let Some(frame) = stack.last_mut() {
                let node = frame.0;
                if frame.1 < self.prerequisites[node].len() {
                    let next = self.prerequisites[node][frame.1];
                    frame.1 += 1;
                    match marks[next] {
                        Mark::Unvisited => {
                            marks[next] = Mark::OnStack;
                            stack.push((next, 0));
                        }
                        Mark::OnStack => {
                            if let Some(pos) = stack.iter().position(|(n, _)| *n == next) {
                                return Some(stack[pos..].iter().map(|(n, _)| *n).collect());
                            }
                        }
                        Mark::Done => {}
                    }
                } else {
                    marks[node] = Mark::Done;
                    stack.pop();
                }
            }
        }

        None
    }

    /// Drop every edge whose endpoints both belong to `members`.
    pub fn remove_edges_within(&mut self, members: &HashSet<usize>) -> usize {
        let mut removed = 0;
        for (node, prereqs) in self.prerequisites.iter_mut().enumerate() {
            if !members.contains(&node) {
                continue;
            }
            let before = prereqs.len();
            prereqs.retain(|p| !members.contains(p));
            removed += before - prereqs.len();
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(n: usize) -> Vec<SkillId> {
        (0..n).map(|_| SkillId::new()).collect()
    }

    #[test]
    fn test_closure_is_transitive() {
        let s = ids(4);
        // 0 -> 1 -> 2, 3 isolated
        let edges = vec![DependencyEdge::new(s[0], s[1]), DependencyEdge::new(s[1], s[2])];
        let graph = SkillGraph::from_edges(&edges);

        let closure = graph.prerequisite_closure(s[0]);
        assert_eq!(closure, [s[1], s[2]].into_iter().collect());
        assert!(graph.prerequisite_closure(s[3]).is_empty());
    }

    #[test]
    fn test_closure_terminates_on_cycle() {
        let s = ids(2);
        let edges = vec![DependencyEdge::new(s[0], s[1]), DependencyEdge::new(s[1], s[0])];
        let graph = SkillGraph::from_edges(&edges);

        let closure = graph.prerequisite_closure(s[0]);
        assert_eq!(closure, [s[0], s[1]].into_iter().collect());
    }

    #[test]
    fn test_restricted_drops_outside_edges() {
        let s = ids(3);
        let edges = vec![DependencyEdge::new(s[0], s[1]), DependencyEdge::new(s[0], s[2])];
        let graph = SkillGraph::restricted(&[s[0], s[1]], &edges);

        assert_eq!(graph.len(), 2);
        assert_eq!(graph.prerequisites(0), &[1]);
    }

    #[test]
    fn test_find_cycle_reports_path() {
        let s = ids(4);
        // 3 -> 0 -> 1 -> 2 -> 0
        let edges = vec![
            DependencyEdge::new(s[3], s[0]),
            DependencyEdge::new(s[0], s[1]),
            DependencyEdge::new(s[1], s[2]),
            DependencyEdge::new(s[2], s[0]),
        ];
        let graph = SkillGraph::restricted(&s, &edges);

        let cycle = graph.find_cycle().unwrap();
        let cycle_ids: Vec<_> = cycle.iter().map(|&n| graph.id(n)).collect();
        assert_eq!(cycle_ids, vec![s[0], s[1], s[2]]);
    }

    #[test]
    fn test_find_cycle_self_loop() {
        let s = ids(1);
        let graph = SkillGraph::restricted(&s, &[DependencyEdge::new(s[0], s[0])]);
        assert_eq!(graph.find_cycle(), Some(vec![0]));
    }

    #[test]
    fn test_acyclic_graph_has_no_cycle() {
        let s = ids(3);
        let edges = vec![
            DependencyEdge::new(s[0], s[1]),
            DependencyEdge::new(s[0], s[2]),
            DependencyEdge::new(s[1], s[2]),
        ];
        assert!(SkillGraph::restricted(&s, &edges).find_cycle().is_none());
    }

    #[test]
    fn test_remove_edges_within_keeps_boundary_edges() {
        let s = ids(4);
        // cycle 0 <-> 1, plus 2 -> 0 and 1 -> 3
        let edges = vec![
            DependencyEdge::new(s[0], s[1]),
            DependencyEdge::new(s[1], s[0]),
            DependencyEdge::new(s[2], s[0]),
            DependencyEdge::new(s[1], s[3]),
        ];
        let mut graph = SkillGraph::restricted(&s, &edges);

        let removed = graph.remove_edges_within(&[0, 1].into_iter().collect());
        assert_eq!(removed, 2);
        assert!(graph.prerequisites(0).is_empty());
        assert_eq!(graph.prerequisites(1), &[3]);
        assert_eq!(graph.prerequisites(2), &[0]);
    }
}
