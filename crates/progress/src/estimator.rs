//! Learning time estimation.

use serde::Serialize;
use skillpath_core::{ModuleId, Resource, Skill, SkillId, TimeConfig};

/// Time figures for one module, in hours.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ModuleTime {
    /// Time spent on resources
    pub resource_time_hours: f64,
    /// Hands-on practice time
    pub practice_time_hours: f64,
    /// Resource plus practice time
    pub total_time_hours: f64,
}

/// Estimate one skill's time.
///
/// Resource time is the sum of positive resource durations. When no resource
/// has a positive duration the skill's own estimate is used instead; the two
/// sources are never mixed.
pub fn calculate_module_time(skill: &Skill, resources: &[Resource], practice_ratio: Option<f64>) -> ModuleTime {
    let practice_ratio = practice_ratio.unwrap_or(TimeConfig::default().practice_time_ratio);

    let minutes: u64 = resources
        .iter()
        .filter_map(|r| r.duration_minutes)
        .filter(|&m| m > 0)
        .map(u64::from)
        .sum();
    let resource_time_hours = if minutes > 0 {
        minutes as f64 / 60.0
    } else {
        skill.estimated_hours
    };

    let practice_time_hours = resource_time_hours * practice_ratio;
    ModuleTime {
        resource_time_hours,
        practice_time_hours,
        total_time_hours: resource_time_hours + practice_time_hours,
    }
}

/// One roadmap module as seen by the estimator.
#[derive(Debug, Clone)]
pub struct ModuleTimeInput {
    /// Module
    pub module_id: ModuleId,
    /// Skill taught
    pub skill: Skill,
    /// The skill's resources (may be empty)
    pub resources: Vec<Resource>,
    /// Skipped modules are reported but not aggregated
    pub is_skipped: bool,
}

/// Per-module line of a [`TimeCalculation`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModuleBreakdown {
    /// Module
    pub module_id: ModuleId,
    /// Skill taught
    pub skill_id: SkillId,
    /// Skill slug
    pub slug: String,
    /// Time figures
    #[serde(flatten)]
    pub time: ModuleTime,
    /// Whether the module is skipped
    pub is_skipped: bool,
}

/// Roadmap-level time estimate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeCalculation {
    /// Sum of resource time over non-skipped modules
    pub total_resource_time_hours: f64,
    /// Sum of practice time over non-skipped modules
    pub total_practice_time_hours: f64,
    /// Sum of module time over non-skipped modules
    pub total_module_time_hours: f64,
    /// Safety buffer
    pub buffer_hours: f64,
    /// Module time plus buffer
    pub total_estimated_hours: f64,
    /// Total rounded half-up to whole hours
    pub rounded_total_hours: u64,
    /// Every module, skipped or not
    pub module_breakdown: Vec<ModuleBreakdown>,
}

/// Roadmap time estimator. Pure: the same input always yields the same
/// output.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeEstimator {
    config: TimeConfig,
}

impl TimeEstimator {
    /// Create an estimator.
    pub fn new(config: TimeConfig) -> Self {
        Self { config }
    }

    /// Estimate a whole roadmap.
    pub fn calculate_roadmap_time(&self, modules: &[ModuleTimeInput]) -> TimeCalculation {
        let mut total_resource = 0.0;
        let mut total_practice = 0.0;
        let mut total_module = 0.0;
        let mut module_breakdown = Vec::with_capacity(modules.len());

        for module in modules {
            let time = calculate_module_time(
                &module.skill,
                &module.resources,
                Some(self.config.practice_time_ratio),
            );
            if !module.is_skipped {
                total_resource += time.resource_time_hours;
                total_practice += time.practice_time_hours;
                total_module += time.total_time_hours;
            }
            module_breakdown.push(ModuleBreakdown {
                module_id: module.module_id,
                skill_id: module.skill.id,
                slug: module.skill.slug.clone(),
                time,
                is_skipped: module.is_skipped,
            });
        }

        let buffer_hours = total_module * self.config.buffer_percentage;
        let total_estimated_hours = total_module + buffer_hours;

        TimeCalculation {
            total_resource_time_hours: total_resource,
            total_practice_time_hours: total_practice,
            total_module_time_hours: total_module,
            buffer_hours,
            total_estimated_hours,
            rounded_total_hours: round_half_up(total_estimated_hours),
            module_breakdown,
        }
    }
}

fn round_half_up(hours: f64) -> u64 {
    if hours <= 0.0 {
        return 0;
    }
    (hours + 0.5).floor() as u64
}
