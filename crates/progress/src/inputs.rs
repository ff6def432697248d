//! Gathers estimator input for stored roadmap modules.

use skillpath_core::{RoadmapModule, SkillId};
use skillpath_storage::Storage;
use std::collections::HashMap;
use tracing::warn;

use crate::estimator::ModuleTimeInput;

/// Load skills and resources for `modules`, keeping module order.
///
/// Modules whose skill is missing from the catalog are left out with a
/// warning.
pub async fn load_time_inputs<S: Storage + ?Sized>(
    storage: &S,
    modules: &[RoadmapModule],
) -> skillpath_storage::Result<Vec<ModuleTimeInput>> {
    let skill_ids: Vec<SkillId> = modules.iter().map(|m| m.skill_id).collect();
    let skills: HashMap<SkillId, _> = storage
        .load_skills(&skill_ids)
        .await?
        .into_iter()
        .map(|s| (s.id, s))
        .collect();

    let mut inputs = Vec::with_capacity(modules.len());
    for module in modules {
        let Some(skill) = skills.get(&module.skill_id) else {
            warn!(
                "Module {} references unknown skill {}",
                module.id, module.skill_id
            );
            continue;
        };
        inputs.push(ModuleTimeInput {
            module_id: module.id,
            skill: skill.clone(),
            resources: storage.list_resources(module.skill_id).await?,
            is_skipped: module.is_skipped,
        });
    }
    Ok(inputs)
}
