//! Catalog import file: skills, edges and resources keyed by slug.

use anyhow::{anyhow, Result};
use serde::Deserialize;
use skillpath_core::{DependencyEdge, Phase, Resource, ResourceId, Skill, SkillId};
use skillpath_storage::Storage;
use std::collections::HashMap;
use tracing::info;

#[derive(Debug, Deserialize)]
pub struct CatalogFile {
    pub skills: Vec<SkillEntry>,
    #[serde(default)]
    pub dependencies: Vec<DependencyEntry>,
    #[serde(default)]
    pub resources: Vec<ResourceEntry>,
}

#[derive(Debug, Deserialize)]
pub struct SkillEntry {
    pub slug: String,
    #[serde(default)]
    pub name: Option<String>,
    pub phase: Phase,
    pub estimated_hours: f64,
    #[serde(default)]
    pub is_optional: bool,
    #[serde(default)]
    pub sequence_order: i32,
}

#[derive(Debug, Deserialize)]
pub struct DependencyEntry {
    pub skill: String,
    pub depends_on: String,
    #[serde(default = "default_hard")]
    pub is_hard: bool,
}

fn default_hard() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct ResourceEntry {
    pub skill: String,
    pub title: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub duration_minutes: Option<u32>,
    #[serde(default)]
    pub quality: f32,
}

/// Counts of imported records.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub skills: usize,
    pub dependencies: usize,
    pub resources: usize,
}

fn resource_key(url: Option<&str>, title: &str) -> String {
    match url {
        Some(url) if !url.trim().is_empty() => url.trim().to_string(),
        _ => title.trim().to_string(),
    }
}

/// Import a catalog. Existing skills keep their id by slug, existing
/// resources by url or title.
pub async fn import<S: Storage + ?Sized>(storage: &S, file: CatalogFile) -> Result<ImportSummary> {
    let mut ids: HashMap<String, SkillId> = storage
        .list_skills()
        .await?
        .into_iter()
        .map(|s| (s.slug, s.id))
        .collect();
    let mut summary = ImportSummary::default();

    for entry in file.skills {
        let id = *ids.entry(entry.slug.clone()).or_insert_with(SkillId::new);
        let skill = Skill {
            id,
            name: entry.name.unwrap_or_else(|| entry.slug.clone()),
            slug: entry.slug,
            phase: entry.phase,
            estimated_hours: entry.estimated_hours,
            is_optional: entry.is_optional,
            sequence_order: entry.sequence_order,
        };
        storage.save_skill(&skill).await?;
        summary.skills += 1;
    }

    let lookup = |slug: &str| {
        ids.get(slug)
            .copied()
            .ok_or_else(|| anyhow!("unknown skill slug '{}'", slug))
    };

    for entry in file.dependencies {
        let edge = DependencyEdge {
            skill_id: lookup(&entry.skill)?,
            depends_on_id: lookup(&entry.depends_on)?,
            is_hard: entry.is_hard,
        };
        storage.save_dependency(&edge).await?;
        summary.dependencies += 1;
    }

    // Resources match existing ones by url, or by title when there is none.
    let mut known_resources: HashMap<(SkillId, String), ResourceId> = HashMap::new();
    for skill_id in ids.values() {
        for existing in storage.list_resources(*skill_id).await? {
            let key = resource_key(existing.url.as_deref(), &existing.title);
            known_resources.insert((*skill_id, key), existing.id);
        }
    }

    for entry in file.resources {
        let skill_id = lookup(&entry.skill)?;
        let key = resource_key(entry.url.as_deref(), &entry.title);
        let id = *known_resources
            .entry((skill_id, key))
            .or_insert_with(ResourceId::new);
        let resource = Resource {
            id,
            skill_id,
            title: entry.title,
            url: entry.url,
            duration_minutes: entry.duration_minutes,
            quality: entry.quality,
        };
        storage.save_resource(&resource).await?;
        summary.resources += 1;
    }

    info!(
        "Imported {} skills, {} dependencies, {} resources",
        summary.skills, summary.dependencies, summary.resources
    );
    Ok(summary)
}
