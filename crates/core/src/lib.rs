//! SkillPath core data models.
//!
//! This crate defines the catalog, roadmap and progress structures shared by
//! the planner, the progress tracker and every storage backend.

#![warn(missing_docs)]

// Core identities
mod id;

// Skill catalog
mod skill;

// Roadmaps and learner progress
mod roadmap;
mod progress;

// Configuration
mod config;

// Re-exports
pub use id::*;

pub use skill::{Skill, Phase, DependencyEdge, Resource, UserSkillProfile};
pub use roadmap::{Roadmap, RoadmapModule};
pub use progress::{Progress, ProgressStatus};
pub use config::{SkillpathConfig, TimeConfig, SequencerConfig, CoreError};

/// Timestamp type
pub type Time = chrono::DateTime<chrono::Utc>;
