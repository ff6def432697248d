//! Storage-backed planning service.

use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use skillpath_core::{
    Roadmap, RoadmapModule, SequencerConfig, Skill, SkillId, TimeConfig, UserId,
};
use skillpath_progress::{load_time_inputs, TimeCalculation, TimeEstimator};
use skillpath_storage::{ChangeSet, Storage, StorageError};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};

use crate::gap::{GapAnalysis, GapAnalyzer};
use crate::roadmap::RoadmapBuilder;
use crate::sequencer::DependencySequencer;
use crate::strategy::{AllNonOptional, RequirementStrategy};

/// Errors from the planning service.
#[derive(Debug, thiserror::Error)]
pub enum PlannerError {
    /// Storage failure
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Result type for planning operations.
pub type Result<T> = std::result::Result<T, PlannerError>;

/// A freshly generated and persisted roadmap.
#[derive(Debug, Clone, Serialize)]
pub struct GeneratedRoadmap {
    /// The roadmap
    pub roadmap: Roadmap,
    /// Its modules in sequence order
    pub modules: Vec<RoadmapModule>,
    /// The gap analysis it was built from
    pub analysis: GapAnalysis,
    /// Initial time estimate
    pub time: TimeCalculation,
}

/// Planning service.
#[async_trait]
pub trait RoadmapPlanner: Send + Sync {
    /// Gap analysis for a user and target role.
    async fn analyze_gap(&self, user_id: &UserId, target_role: &str) -> Result<GapAnalysis>;

    /// Analyze, sequence, estimate and persist a new roadmap.
    async fn generate_roadmap(&self, user_id: &UserId, target_role: &str) -> Result<GeneratedRoadmap>;
}

/// Basic planner implementation.
pub struct BasicRoadmapPlanner<S: Storage> {
    storage: Arc<S>,
    strategy: Box<dyn RequirementStrategy>,
    analyzer: GapAnalyzer,
    estimator: TimeEstimator,
}

impl<S: Storage> BasicRoadmapPlanner<S> {
    /// Create a planner with the default requirement strategy.
    pub fn new(storage: Arc<S>) -> Self {
        Self {
            storage,
            strategy: Box::new(AllNonOptional),
            analyzer: GapAnalyzer::default(),
            estimator: TimeEstimator::default(),
        }
    }

    /// Set the requirement strategy.
    pub fn with_strategy(mut self, strategy: Box<dyn RequirementStrategy>) -> Self {
        self.strategy = strategy;
        self
    }

    /// Set the sequencer configuration.
    pub fn with_sequencer_config(mut self, config: SequencerConfig) -> Self {
        self.analyzer = GapAnalyzer::new(DependencySequencer::new(config));
        self
    }

    /// Set the time estimation configuration.
    pub fn with_time_config(mut self, config: TimeConfig) -> Self {
        self.estimator = TimeEstimator::new(config);
        self
    }

    /// Resolve profile entries (ids or slugs) to catalog skill ids.
    async fn known_skill_ids(&self, user_id: &UserId, catalog: &[Skill]) -> Result<HashSet<SkillId>> {
        let Some(profile) = self.storage.load_profile(user_id).await? else {
            debug!("No skill profile for {}", user_id);
            return Ok(HashSet::new());
        };

        let mut known = HashSet::new();
        for entry in &profile.known_skills {
            let by_id = entry
                .parse::<SkillId>()
                .ok()
                .filter(|id| catalog.iter().any(|s| s.id == *id));
            match by_id.or_else(|| catalog.iter().find(|s| &s.slug == entry).map(|s| s.id)) {
                Some(id) => {
                    known.insert(id);
                }
                None => debug!("Ignoring unknown skill '{}' in profile of {}", entry, user_id),
            }
        }
        Ok(known)
    }
}

#[async_trait]
impl<S: Storage + 'static> RoadmapPlanner for BasicRoadmapPlanner<S> {
    async fn analyze_gap(&self, user_id: &UserId, target_role: &str) -> Result<GapAnalysis> {
        let catalog = self.storage.list_skills().await?;
        let required = self.strategy.required_skills(target_role, &catalog);
        let known = self.known_skill_ids(user_id, &catalog).await?;
        // Closures run over the whole graph: a known skill may reach a
        // required one through skills outside the requirement list.
        let dependencies = self.storage.list_dependencies(None).await?;

        Ok(self.analyzer.analyze(&required, &known, &dependencies))
    }

    async fn generate_roadmap(&self, user_id: &UserId, target_role: &str) -> Result<GeneratedRoadmap> {
        let analysis = self.analyze_gap(user_id, target_role).await?;
        let (mut roadmap, modules) =
            RoadmapBuilder::build(user_id.clone(), target_role, &analysis, Utc::now());

        let inputs = load_time_inputs(self.storage.as_ref(), &modules).await?;
        let time = self.estimator.calculate_roadmap_time(&inputs);
        roadmap.estimated_hours = time.total_estimated_hours;

        self.storage
            .commit(
                ChangeSet {
                    roadmaps: vec![roadmap.clone()],
                    modules: modules.clone(),
                    progress: Vec::new(),
                },
                &format!("Generate roadmap {} for {}", roadmap.id, user_id),
            )
            .await?;
        info!(
            "Generated roadmap {} with {} modules (~{}h)",
            roadmap.id,
            modules.len(),
            time.rounded_total_hours
        );

        Ok(GeneratedRoadmap {
            roadmap,
            modules,
            analysis,
            time,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::FixedRequirements;
    use skillpath_core::{DependencyEdge, Phase, Resource, UserSkillProfile};
    use skillpath_storage::MemoryStorage;

    struct Catalog {
        html: Skill,
        css: Skill,
        js: Skill,
        react: Skill,
    }

    async fn seed(storage: &MemoryStorage) -> Catalog {
        let catalog = Catalog {
            html: Skill::new("html", Phase::Foundation, 10.0).with_sequence_order(1),
            css: Skill::new("css", Phase::Foundation, 10.0).with_sequence_order(2),
            js: Skill::new("js", Phase::Core, 20.0).with_sequence_order(3),
            react: Skill::new("react", Phase::Advanced, 30.0).with_sequence_order(4),
        };
        for skill in [&catalog.html, &catalog.css, &catalog.js, &catalog.react] {
            storage.save_skill(skill).await.unwrap();
        }
        let optional = Skill::new("sass", Phase::Core, 5.0).optional();
        storage.save_skill(&optional).await.unwrap();

        for (skill, prereq) in [
            (&catalog.css, &catalog.html),
            (&catalog.js, &catalog.html),
            (&catalog.react, &catalog.js),
            (&catalog.react, &catalog.css),
        ] {
            storage
                .save_dependency(&DependencyEdge::new(skill.id, prereq.id))
                .await
                .unwrap();
        }
        catalog
    }

    async fn set_profile(storage: &MemoryStorage, user: &UserId, known: &[&str]) {
        storage
            .save_profile(&UserSkillProfile {
                user_id: user.clone(),
                known_skills: known.iter().map(|s| s.to_string()).collect(),
                updated_at: Utc::now(),
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_analyze_gap_without_profile() {
        let storage = Arc::new(MemoryStorage::new());
        seed(&storage).await;
        let planner = BasicRoadmapPlanner::new(storage.clone());

        let gap = planner.analyze_gap(&UserId::new("new"), "frontend").await.unwrap();
        let ordered: Vec<_> = gap.ordered_skills.iter().map(|s| s.skill.slug.as_str()).collect();
        assert_eq!(ordered, vec!["html", "css", "js", "react"]);
        assert_eq!(gap.total_hours, 70.0);
    }

    #[tokio::test]
    async fn test_profile_resolves_slugs_and_ids() {
        let storage = Arc::new(MemoryStorage::new());
        let catalog = seed(&storage).await;
        let user = UserId::new("alice");
        let js_id = catalog.js.id.to_string();
        set_profile(&storage, &user, &["css", js_id.as_str(), "cobol"]).await;
        let planner = BasicRoadmapPlanner::new(storage.clone());

        let gap = planner.analyze_gap(&user, "frontend").await.unwrap();
        let missing: Vec<_> = gap.missing_skills.iter().map(|s| s.slug.as_str()).collect();
        assert_eq!(missing, vec!["react"]);
    }

    #[tokio::test]
    async fn test_unknown_role_is_an_empty_gap() {
        let storage = Arc::new(MemoryStorage::new());
        seed(&storage).await;
        let planner = BasicRoadmapPlanner::new(storage.clone())
            .with_strategy(Box::new(FixedRequirements::new().with_role("frontend", &["react"])));

        let gap = planner.analyze_gap(&UserId::new("bob"), "astronaut").await.unwrap();
        assert!(gap.missing_skills.is_empty());
        assert_eq!(gap.total_hours, 0.0);
    }

    #[tokio::test]
    async fn test_generate_roadmap_persists_locked_modules() {
        let storage = Arc::new(MemoryStorage::new());
        let catalog = seed(&storage).await;
        storage
            .save_resource(&Resource::new(catalog.react.id, "course", Some(600)))
            .await
            .unwrap();
        let user = UserId::new("carol");
        set_profile(&storage, &user, &["html"]).await;
        let planner = BasicRoadmapPlanner::new(storage.clone());

        let generated = planner.generate_roadmap(&user, "frontend").await.unwrap();
        assert_eq!(generated.modules.len(), 3);

        let stored = storage.list_modules(generated.roadmap.id).await.unwrap();
        assert_eq!(stored, generated.modules);
        let unlocked: Vec<_> = stored.iter().filter(|m| !m.is_locked).collect();
        assert_eq!(unlocked.len(), 1);
        assert_eq!(unlocked[0].sequence_order, 1);
        assert_eq!(unlocked[0].skill_id, catalog.css.id);

        // css 10 + js 20 + react 10 (resource) = 40h, x1.5 practice, +10% buffer
        assert!((generated.time.total_estimated_hours - 66.0).abs() < 1e-9);
        let roadmap = storage.load_roadmap(generated.roadmap.id).await.unwrap().unwrap();
        assert_eq!(roadmap.estimated_hours, generated.time.total_estimated_hours);
        assert_eq!(roadmap.completed_hours, 0.0);
    }
}
