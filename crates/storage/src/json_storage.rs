//! JSON file storage implementation.
//!
//! Stores data as JSON files under a root directory (`.skillpath` by default)
//! and keeps small per-object meta markers (version + updated_at). Catalog
//! edges and user profiles live in one file each; every other entity gets its
//! own file.

use async_trait::async_trait;
use serde::Serialize;
use skillpath_core::{
    DependencyEdge, ModuleId, Progress, Resource, ResourceId, Roadmap, RoadmapId, RoadmapModule,
    Skill, SkillId, UserId, UserSkillProfile,
};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::{ChangeSet, Result, Storage};

/// File-based JSON storage backend.
pub struct JsonStorage {
    root: PathBuf,
    /// Serializes writers; readers never observe a half-written file thanks
    /// to write-then-rename.
    write_lock: Mutex<()>,
}

impl JsonStorage {
    /// Create storage, creating the subdirectories it needs.
    pub async fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();

        for dir in ["skills", "resources", "roadmaps", "modules", "progress"] {
            fs::create_dir_all(root.join(dir)).await?;
            fs::create_dir_all(root.join("meta").join(dir)).await?;
        }

        Ok(Self {
            root,
            write_lock: Mutex::new(()),
        })
    }

    fn skill_path(&self, id: SkillId) -> PathBuf {
        self.root.join("skills").join(format!("{}.json", id))
    }
    fn resource_path(&self, id: ResourceId) -> PathBuf {
        self.root.join("resources").join(format!("{}.json", id))
    }
    fn roadmap_path(&self, id: RoadmapId) -> PathBuf {
        self.root.join("roadmaps").join(format!("{}.json", id))
    }
    fn module_path(&self, id: ModuleId) -> PathBuf {
        self.root.join("modules").join(format!("{}.json", id))
    }
    fn progress_path(&self, progress: &Progress) -> PathBuf {
        self.root.join("progress").join(format!("{}.json", progress.id))
    }
    fn dependencies_path(&self) -> PathBuf {
        self.root.join("dependencies.json")
    }
    fn profiles_path(&self) -> PathBuf {
        self.root.join("profiles.json")
    }

    fn meta_path(&self, kind: &str, id: &str) -> PathBuf {
        self.root.join("meta").join(kind).join(format!("{}.meta.json", id))
    }

    /// Read and increment per-object version, return new version.
    async fn bump_version(&self, kind: &str, id: &str) -> Result<u64> {
        let path = self.meta_path(kind, id);
        let version = match read_json::<serde_json::Value>(&path).await {
            Ok(Some(meta)) => meta.get("version").and_then(|v| v.as_u64()).unwrap_or(0),
            _ => 0,
        } + 1;
        let meta = serde_json::json!({"version": version, "updated_at": chrono::Utc::now()});
        write_atomic(&path, serde_json::to_string_pretty(&meta)?.as_bytes()).await?;
        Ok(version)
    }

    async fn save_entity<T: Serialize>(&self, kind: &str, id: &str, path: &Path, value: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(value)?;
        write_atomic(path, json.as_bytes()).await?;
        self.bump_version(kind, id).await?;
        Ok(())
    }

    async fn all_progress(&self) -> Result<Vec<Progress>> {
        list_dir(&self.root.join("progress")).await
    }
}

#[async_trait]
impl Storage for JsonStorage {
    async fn save_skill(&self, skill: &Skill) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.save_entity("skills", &skill.id.to_string(), &self.skill_path(skill.id), skill)
            .await
    }

    async fn list_skills(&self) -> Result<Vec<Skill>> {
        let mut skills: Vec<Skill> = list_dir(&self.root.join("skills")).await?;
        // Directory order is unspecified; keep listings reproducible.
        skills.sort_by(|a, b| {
            a.sequence_order
                .cmp(&b.sequence_order)
                .then_with(|| a.slug.cmp(&b.slug))
        });
        Ok(skills)
    }

    async fn load_skills(&self, ids: &[SkillId]) -> Result<Vec<Skill>> {
        let mut skills = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(skill) = read_json(&self.skill_path(*id)).await? {
                skills.push(skill);
            }
        }
        Ok(skills)
    }

    async fn save_dependency(&self, edge: &DependencyEdge) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let path = self.dependencies_path();
        let mut edges: Vec<DependencyEdge> = read_json(&path).await?.unwrap_or_default();
        match edges
            .iter_mut()
            .find(|e| e.skill_id == edge.skill_id && e.depends_on_id == edge.depends_on_id)
        {
            Some(existing) => *existing = *edge,
            None => edges.push(*edge),
        }
        write_atomic(&path, serde_json::to_string_pretty(&edges)?.as_bytes()).await?;
        Ok(())
    }

    async fn list_dependencies(&self, filter: Option<&HashSet<SkillId>>) -> Result<Vec<DependencyEdge>> {
        let edges: Vec<DependencyEdge> = read_json(&self.dependencies_path()).await?.unwrap_or_default();
        Ok(edges
            .into_iter()
            .filter(|e| filter.map_or(true, |ids| ids.contains(&e.skill_id)))
            .collect())
    }

    async fn save_resource(&self, resource: &Resource) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.save_entity(
            "resources",
            &resource.id.to_string(),
            &self.resource_path(resource.id),
            resource,
        )
        .await
    }

    async fn list_resources(&self, skill_id: SkillId) -> Result<Vec<Resource>> {
        let all: Vec<Resource> = list_dir(&self.root.join("resources")).await?;
        let mut resources: Vec<_> = all.into_iter().filter(|r| r.skill_id == skill_id).collect();
        resources.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(resources)
    }

    async fn save_profile(&self, profile: &UserSkillProfile) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let path = self.profiles_path();
        let mut profiles: HashMap<String, UserSkillProfile> =
            read_json(&path).await?.unwrap_or_default();
        profiles.insert(profile.user_id.to_string(), profile.clone());
        write_atomic(&path, serde_json::to_string_pretty(&profiles)?.as_bytes()).await?;
        Ok(())
    }

    async fn load_profile(&self, user_id: &UserId) -> Result<Option<UserSkillProfile>> {
        let profiles: HashMap<String, UserSkillProfile> =
            read_json(&self.profiles_path()).await?.unwrap_or_default();
        Ok(profiles.get(user_id.as_str()).cloned())
    }

    async fn load_roadmap(&self, id: RoadmapId) -> Result<Option<Roadmap>> {
        read_json(&self.roadmap_path(id)).await
    }

    async fn list_modules(&self, roadmap_id: RoadmapId) -> Result<Vec<RoadmapModule>> {
        let all: Vec<RoadmapModule> = list_dir(&self.root.join("modules")).await?;
        let mut modules: Vec<_> = all.into_iter().filter(|m| m.roadmap_id == roadmap_id).collect();
        modules.sort_by_key(|m| m.sequence_order);
        Ok(modules)
    }

    async fn load_module(&self, id: ModuleId) -> Result<Option<RoadmapModule>> {
        read_json(&self.module_path(id)).await
    }

    async fn load_progress(&self, user_id: &UserId, module_id: ModuleId) -> Result<Option<Progress>> {
        Ok(self
            .all_progress()
            .await?
            .into_iter()
            .find(|p| &p.user_id == user_id && p.module_id == module_id))
    }

    async fn list_progress(&self, user_id: &UserId, roadmap_id: RoadmapId) -> Result<Vec<Progress>> {
        Ok(self
            .all_progress()
            .await?
            .into_iter()
            .filter(|p| &p.user_id == user_id && p.roadmap_id == roadmap_id)
            .collect())
    }

    async fn commit(&self, changes: ChangeSet, message: &str) -> Result<()> {
        if changes.is_empty() {
            return Ok(());
        }
        let _guard = self.write_lock.lock().await;

        // Serialize everything up front so an encoding failure writes nothing.
        let mut writes: Vec<(&'static str, String, PathBuf, String)> = Vec::new();
        for roadmap in &changes.roadmaps {
            writes.push((
                "roadmaps",
                roadmap.id.to_string(),
                self.roadmap_path(roadmap.id),
                serde_json::to_string_pretty(roadmap)?,
            ));
        }
        for module in &changes.modules {
            writes.push((
                "modules",
                module.id.to_string(),
                self.module_path(module.id),
                serde_json::to_string_pretty(module)?,
            ));
        }
        for progress in &changes.progress {
            writes.push((
                "progress",
                progress.id.to_string(),
                self.progress_path(progress),
                serde_json::to_string_pretty(progress)?,
            ));
        }

        // Stage every record before renaming any of them into place, so a
        // failed write leaves the previous state untouched.
        let mut staged = Vec::with_capacity(writes.len());
        for (_, _, path, json) in &writes {
            let tmp = path.with_extension("json.tmp");
            if let Err(e) = fs::write(&tmp, json.as_bytes()).await {
                warn!("Commit '{}' aborted while staging {}: {}", message, path.display(), e);
                discard_staged(&staged).await;
                let _ = fs::remove_file(&tmp).await;
                return Err(e.into());
            }
            staged.push(tmp);
        }

        for (tmp, (_, _, path, _)) in staged.iter().zip(&writes) {
            fs::rename(tmp, path).await?;
        }
        for (kind, id, _, _) in &writes {
            self.bump_version(kind, id).await?;
        }

        debug!("Committed: {}", message);
        Ok(())
    }
}

async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, bytes).await?;
    fs::rename(&tmp, path).await?;
    Ok(())
}

async fn discard_staged(staged: &[PathBuf]) {
    for tmp in staged {
        if let Err(e) = fs::remove_file(tmp).await {
            warn!("Failed to remove staged file {}: {}", tmp.display(), e);
        }
    }
}

async fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    match fs::read_to_string(path).await {
        Ok(json) => {
            let value = serde_json::from_str(&json)?;
            Ok(Some(value))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

async fn list_dir<T: serde::de::DeserializeOwned>(dir: &Path) -> Result<Vec<T>> {
    let mut items = Vec::new();
    let mut rd = fs::read_dir(dir).await?;
    while let Some(entry) = rd.next_entry().await? {
        if entry.path().extension().and_then(|s| s.to_str()) != Some("json") {
            continue;
        }
        match read_json(&entry.path()).await {
            Ok(Some(item)) => items.push(item),
            Ok(None) => {}
            Err(e) => warn!("Skipping unreadable file {}: {}", entry.path().display(), e),
        }
    }
    Ok(items)
}
