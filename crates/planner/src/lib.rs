//! Curriculum planning.
//!
//! Gap analysis over the skill-prerequisite graph, priority-aware
//! topological sequencing, and roadmap assembly.

#![warn(missing_docs)]

pub mod graph;
pub mod sequencer;
pub mod gap;
pub mod strategy;
pub mod roadmap;
pub mod service;

pub use graph::SkillGraph;
pub use sequencer::{
    DependencySequencer, PhaseGroup, SequencedSkill, SequencingResult, priority_score,
};
pub use gap::{GapAnalyzer, GapAnalysis};
pub use strategy::{RequirementStrategy, AllNonOptional, FixedRequirements};
pub use roadmap::RoadmapBuilder;
pub use service::{RoadmapPlanner, BasicRoadmapPlanner, GeneratedRoadmap, PlannerError};
