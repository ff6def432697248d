//! Role -> required skills mapping.

use skillpath_core::Skill;
use std::collections::HashMap;

/// Decides which catalog skills a target role requires.
///
/// An unknown role maps to an empty list, which the gap analyzer treats as
/// the degenerate empty gap.
pub trait RequirementStrategy: Send + Sync {
    /// Required skills for `target_role`, in catalog order.
    fn required_skills(&self, target_role: &str, catalog: &[Skill]) -> Vec<Skill>;
}

/// Every non-optional catalog skill is required, whatever the role.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllNonOptional;

impl RequirementStrategy for AllNonOptional {
    fn required_skills(&self, target_role: &str, catalog: &[Skill]) -> Vec<Skill> {
        if target_role.trim().is_empty() {
            return Vec::new();
        }
        catalog.iter().filter(|s| !s.is_optional).cloned().collect()
    }
}

/// Explicit role table: role name -> skill slugs.
#[derive(Debug, Clone, Default)]
pub struct FixedRequirements {
    roles: HashMap<String, Vec<String>>,
}

impl FixedRequirements {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the slugs a role requires. Role names are case-insensitive.
    pub fn with_role(mut self, role: &str, slugs: &[&str]) -> Self {
        self.roles.insert(
            role.to_lowercase(),
            slugs.iter().map(|s| s.to_string()).collect(),
        );
        self
    }
}

impl RequirementStrategy for FixedRequirements {
    fn required_skills(&self, target_role: &str, catalog: &[Skill]) -> Vec<Skill> {
        let Some(slugs) = self.roles.get(&target_role.to_lowercase()) else {
            return Vec::new();
        };
        catalog
            .iter()
            .filter(|s| slugs.iter().any(|slug| slug == &s.slug))
            .cloned()
            .collect()
    }
}
