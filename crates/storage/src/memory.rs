//! In-memory storage backend.

use async_trait::async_trait;
use skillpath_core::{
    DependencyEdge, ModuleId, Progress, Resource, Roadmap, RoadmapId, RoadmapModule, Skill,
    SkillId, UserId, UserSkillProfile,
};
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;
use tracing::debug;

use super::{ChangeSet, Result, Storage};

#[derive(Default)]
struct Inner {
    skills: Vec<Skill>,
    dependencies: Vec<DependencyEdge>,
    resources: Vec<Resource>,
    profiles: HashMap<UserId, UserSkillProfile>,
    roadmaps: HashMap<RoadmapId, Roadmap>,
    modules: HashMap<ModuleId, RoadmapModule>,
    progress: HashMap<(UserId, ModuleId), Progress>,
}

/// Volatile storage, mainly for tests and embedding.
///
/// Catalog listings keep insertion order.
#[derive(Default)]
pub struct MemoryStorage {
    inner: RwLock<Inner>,
}

impl MemoryStorage {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn save_skill(&self, skill: &Skill) -> Result<()> {
        let mut inner = self.inner.write().await;
        match inner.skills.iter().position(|s| s.id == skill.id) {
            Some(pos) => inner.skills[pos] = skill.clone(),
            None => inner.skills.push(skill.clone()),
        }
        Ok(())
    }

    async fn list_skills(&self) -> Result<Vec<Skill>> {
        Ok(self.inner.read().await.skills.clone())
    }

    async fn load_skills(&self, ids: &[SkillId]) -> Result<Vec<Skill>> {
        let inner = self.inner.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| inner.skills.iter().find(|s| s.id == *id).cloned())
            .collect())
    }

    async fn save_dependency(&self, edge: &DependencyEdge) -> Result<()> {
        let mut inner = self.inner.write().await;
        match inner
            .dependencies
            .iter()
            .position(|e| e.skill_id == edge.skill_id && e.depends_on_id == edge.depends_on_id)
        {
            Some(pos) => inner.dependencies[pos] = *edge,
            None => inner.dependencies.push(*edge),
        }
        Ok(())
    }

    async fn list_dependencies(&self, filter: Option<&HashSet<SkillId>>) -> Result<Vec<DependencyEdge>> {
        let inner = self.inner.read().await;
        Ok(inner
            .dependencies
            .iter()
            .filter(|e| filter.map_or(true, |ids| ids.contains(&e.skill_id)))
            .copied()
            .collect())
    }

    async fn save_resource(&self, resource: &Resource) -> Result<()> {
        let mut inner = self.inner.write().await;
        match inner.resources.iter().position(|r| r.id == resource.id) {
            Some(pos) => inner.resources[pos] = resource.clone(),
            None => inner.resources.push(resource.clone()),
        }
        Ok(())
    }

    async fn list_resources(&self, skill_id: SkillId) -> Result<Vec<Resource>> {
        let inner = self.inner.read().await;
        Ok(inner
            .resources
            .iter()
            .filter(|r| r.skill_id == skill_id)
            .cloned()
            .collect())
    }

    async fn save_profile(&self, profile: &UserSkillProfile) -> Result<()> {
        self.inner
            .write()
            .await
            .profiles
            .insert(profile.user_id.clone(), profile.clone());
        Ok(())
    }

    async fn load_profile(&self, user_id: &UserId) -> Result<Option<UserSkillProfile>> {
        Ok(self.inner.read().await.profiles.get(user_id).cloned())
    }

    async fn load_roadmap(&self, id: RoadmapId) -> Result<Option<Roadmap>> {
        Ok(self.inner.read().await.roadmaps.get(&id).cloned())
    }

    async fn list_modules(&self, roadmap_id: RoadmapId) -> Result<Vec<RoadmapModule>> {
        let inner = self.inner.read().await;
        let mut modules: Vec<_> = inner
            .modules
            .values()
            .filter(|m| m.roadmap_id == roadmap_id)
            .cloned()
            .collect();
        modules.sort_by_key(|m| m.sequence_order);
        Ok(modules)
    }

    async fn load_module(&self, id: ModuleId) -> Result<Option<RoadmapModule>> {
        Ok(self.inner.read().await.modules.get(&id).cloned())
    }

    async fn load_progress(&self, user_id: &UserId, module_id: ModuleId) -> Result<Option<Progress>> {
        Ok(self
            .inner
            .read()
            .await
            .progress
            .get(&(user_id.clone(), module_id))
            .cloned())
    }

    async fn list_progress(&self, user_id: &UserId, roadmap_id: RoadmapId) -> Result<Vec<Progress>> {
        let inner = self.inner.read().await;
        Ok(inner
            .progress
            .values()
            .filter(|p| &p.user_id == user_id && p.roadmap_id == roadmap_id)
            .cloned()
            .collect())
    }

    async fn commit(&self, changes: ChangeSet, message: &str) -> Result<()> {
        // A single write guard makes the batch atomic for readers.
        let mut inner = self.inner.write().await;
        for roadmap in changes.roadmaps {
            inner.roadmaps.insert(roadmap.id, roadmap);
        }
        for module in changes.modules {
            inner.modules.insert(module.id, module);
        }
        for progress in changes.progress {
            inner
                .progress
                .insert((progress.user_id.clone(), progress.module_id), progress);
        }
        debug!("Committed: {}", message);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use skillpath_core::{Phase, ProgressStatus};

    fn module(roadmap_id: RoadmapId, skill_id: SkillId, order: u32) -> RoadmapModule {
        RoadmapModule {
            id: ModuleId::new(),
            roadmap_id,
            skill_id,
            phase: Phase::Core,
            sequence_order: order,
            is_locked: order != 1,
            is_skipped: false,
        }
    }

    #[tokio::test]
    async fn test_load_skills_skips_unknown_ids() {
        let storage = MemoryStorage::new();
        let html = Skill::new("html", Phase::Foundation, 10.0);
        storage.save_skill(&html).await.unwrap();

        let loaded = storage.load_skills(&[SkillId::new(), html.id]).await.unwrap();
        assert_eq!(loaded, vec![html]);
    }

    #[tokio::test]
    async fn test_dependency_filter_matches_dependent_side() {
        let storage = MemoryStorage::new();
        let (a, b, c) = (SkillId::new(), SkillId::new(), SkillId::new());
        storage.save_dependency(&DependencyEdge::new(a, b)).await.unwrap();
        storage.save_dependency(&DependencyEdge::new(b, c)).await.unwrap();
        storage.save_dependency(&DependencyEdge::new(a, b)).await.unwrap();

        assert_eq!(storage.list_dependencies(None).await.unwrap().len(), 2);

        let filter: HashSet<_> = [a].into_iter().collect();
        let edges = storage.list_dependencies(Some(&filter)).await.unwrap();
        assert_eq!(edges, vec![DependencyEdge::new(a, b)]);
    }

    #[tokio::test]
    async fn test_commit_and_list_modules_in_order() {
        let storage = MemoryStorage::new();
        let roadmap_id = RoadmapId::new();
        let changes = ChangeSet {
            modules: vec![
                module(roadmap_id, SkillId::new(), 2),
                module(roadmap_id, SkillId::new(), 1),
                module(RoadmapId::new(), SkillId::new(), 1),
            ],
            ..Default::default()
        };
        storage.commit(changes, "Add modules").await.unwrap();

        let modules = storage.list_modules(roadmap_id).await.unwrap();
        let orders: Vec<_> = modules.iter().map(|m| m.sequence_order).collect();
        assert_eq!(orders, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_progress_is_keyed_by_user_and_module() {
        let storage = MemoryStorage::new();
        let roadmap_id = RoadmapId::new();
        let module_id = ModuleId::new();
        let alice = UserId::new("alice");

        let mut progress = Progress::not_started(alice.clone(), roadmap_id, module_id, Utc::now());
        progress.status = ProgressStatus::InProgress;
        storage
            .commit(ChangeSet { progress: vec![progress], ..Default::default() }, "Progress")
            .await
            .unwrap();

        let loaded = storage.load_progress(&alice, module_id).await.unwrap().unwrap();
        assert_eq!(loaded.status, ProgressStatus::InProgress);
        assert!(storage.load_progress(&UserId::new("bob"), module_id).await.unwrap().is_none());
        assert_eq!(storage.list_progress(&alice, roadmap_id).await.unwrap().len(), 1);
    }
}
