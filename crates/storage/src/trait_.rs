//! Storage trait abstraction.

use async_trait::async_trait;
use skillpath_core::{
    DependencyEdge, ModuleId, Progress, Resource, Roadmap, RoadmapId, RoadmapModule, Skill,
    SkillId, UserId, UserSkillProfile,
};
use std::collections::HashSet;

/// Error type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Item not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// A batch of roadmap writes applied as one unit.
///
/// Backends must either apply every record or none of them.
#[derive(Debug, Clone, Default)]
pub struct ChangeSet {
    /// Roadmaps to upsert
    pub roadmaps: Vec<Roadmap>,

    /// Modules to upsert
    pub modules: Vec<RoadmapModule>,

    /// Progress records to upsert
    pub progress: Vec<Progress>,
}

impl ChangeSet {
    /// True when there is nothing to write.
    pub fn is_empty(&self) -> bool {
        self.roadmaps.is_empty() && self.modules.is_empty() && self.progress.is_empty()
    }
}

/// Storage abstraction for SkillPath data.
///
/// Covers the skill repository, the user skill profile, the resource
/// repository and the roadmap/progress store. Implementations use interior
/// mutability so a single store can be shared behind an `Arc`.
#[async_trait]
pub trait Storage: Send + Sync {
    // === Skill catalog ===

    /// Save a skill (create or update).
    async fn save_skill(&self, skill: &Skill) -> Result<()>;

    /// List the whole catalog.
    async fn list_skills(&self) -> Result<Vec<Skill>>;

    /// Load the skills with the given ids. Unknown ids are skipped.
    async fn load_skills(&self, ids: &[SkillId]) -> Result<Vec<Skill>>;

    /// Save a prerequisite edge. Saving an existing edge replaces it.
    async fn save_dependency(&self, edge: &DependencyEdge) -> Result<()>;

    /// List prerequisite edges, optionally restricted to edges whose
    /// dependent skill is in `filter`.
    async fn list_dependencies(&self, filter: Option<&HashSet<SkillId>>) -> Result<Vec<DependencyEdge>>;

    // === Resources ===

    /// Save a resource.
    async fn save_resource(&self, resource: &Resource) -> Result<()>;

    /// List the resources of one skill.
    async fn list_resources(&self, skill_id: SkillId) -> Result<Vec<Resource>>;

    // === User profiles ===

    /// Save a user profile.
    async fn save_profile(&self, profile: &UserSkillProfile) -> Result<()>;

    /// Load a user profile.
    async fn load_profile(&self, user_id: &UserId) -> Result<Option<UserSkillProfile>>;

    // === Roadmaps and progress ===

    /// Load a roadmap by ID.
    async fn load_roadmap(&self, id: RoadmapId) -> Result<Option<Roadmap>>;

    /// List a roadmap's modules ordered by `sequence_order`.
    async fn list_modules(&self, roadmap_id: RoadmapId) -> Result<Vec<RoadmapModule>>;

    /// Load one module by ID.
    async fn load_module(&self, id: ModuleId) -> Result<Option<RoadmapModule>>;

    /// Load a user's progress on one module.
    async fn load_progress(&self, user_id: &UserId, module_id: ModuleId) -> Result<Option<Progress>>;

    /// List a user's progress records within a roadmap.
    async fn list_progress(&self, user_id: &UserId, roadmap_id: RoadmapId) -> Result<Vec<Progress>>;

    /// Atomically apply a batch of roadmap writes.
    async fn commit(&self, changes: ChangeSet, message: &str) -> Result<()>;
}
