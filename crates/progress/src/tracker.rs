//! Progress tracking service: status updates, module unlocking and skip
//! toggling against a [`Storage`] backend.

use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use skillpath_core::{
    ModuleId, Progress, ProgressStatus, Roadmap, RoadmapId, RoadmapModule, SkillId, TimeConfig,
    UserId,
};
use skillpath_storage::{ChangeSet, Storage, StorageError};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::estimator::{TimeCalculation, TimeEstimator};
use crate::inputs::load_time_inputs;
use crate::transition::apply_transition;

/// Errors from the progress service. Any error means nothing was written.
#[derive(Debug, thiserror::Error)]
pub enum ProgressError {
    /// Roadmap does not exist
    #[error("Roadmap not found: {0}")]
    RoadmapNotFound(RoadmapId),

    /// Module does not exist
    #[error("Module not found: {0}")]
    ModuleNotFound(ModuleId),

    /// Module exists but belongs to another roadmap
    #[error("Module {module_id} does not belong to roadmap {roadmap_id}")]
    ModuleNotInRoadmap {
        /// Module
        module_id: ModuleId,
        /// Roadmap named in the request
        roadmap_id: RoadmapId,
    },

    /// Requesting user does not own the roadmap
    #[error("Roadmap {roadmap_id} does not belong to user {user_id}")]
    NotRoadmapOwner {
        /// Requesting user
        user_id: UserId,
        /// Roadmap named in the request
        roadmap_id: RoadmapId,
    },

    /// Storage failure
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Result type for progress operations.
pub type Result<T> = std::result::Result<T, ProgressError>;

/// A learner's status change on one module.
#[derive(Debug, Clone)]
pub struct ProgressUpdate {
    /// Learner
    pub user_id: UserId,
    /// Roadmap
    pub roadmap_id: RoadmapId,
    /// Module
    pub module_id: ModuleId,
    /// Target status
    pub status: ProgressStatus,
    /// Replaces the recorded time spent when given
    pub time_spent_minutes: Option<u32>,
    /// Replaces the notes when given
    pub notes: Option<String>,
}

/// Outcome of a progress update.
#[derive(Debug, Clone, Serialize)]
pub struct ProgressOutcome {
    /// The stored record
    pub progress: Progress,
    /// Modules unlocked by this update (at most one)
    pub unlocked_modules: Vec<RoadmapModule>,
    /// The roadmap's recomputed completed hours
    pub completed_hours: f64,
}

/// Progress tracking service.
#[async_trait]
pub trait ProgressTracker: Send + Sync {
    /// Apply a status change, unlock the next module on completion and
    /// refresh the roadmap's completed hours.
    async fn update_module_progress(&self, update: ProgressUpdate) -> Result<ProgressOutcome>;

    /// Mark a module skipped (or not) and re-estimate the roadmap.
    async fn set_module_skipped(
        &self,
        roadmap_id: RoadmapId,
        module_id: ModuleId,
        skipped: bool,
    ) -> Result<TimeCalculation>;

    /// Estimate a stored roadmap.
    async fn estimate_roadmap(&self, roadmap_id: RoadmapId) -> Result<TimeCalculation>;
}

/// Basic progress tracker implementation.
///
/// Read-modify-write sequences are serialized per roadmap, so duplicate
/// concurrent completions unlock at most one module.
pub struct BasicProgressTracker<S: Storage> {
    storage: Arc<S>,
    estimator: TimeEstimator,
    locks: Mutex<HashMap<RoadmapId, Arc<Mutex<()>>>>,
}

impl<S: Storage> BasicProgressTracker<S> {
    /// Create a new progress tracker.
    pub fn new(storage: Arc<S>) -> Self {
        Self {
            storage,
            estimator: TimeEstimator::default(),
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Set the time estimation config.
    pub fn with_time_config(mut self, config: TimeConfig) -> Self {
        self.estimator = TimeEstimator::new(config);
        self
    }

    async fn roadmap_lock(&self, roadmap_id: RoadmapId) -> Arc<Mutex<()>> {
        self.locks.lock().await.entry(roadmap_id).or_default().clone()
    }

    /// Drop the roadmap's lock entry once no other caller holds it.
    async fn release_lock(&self, roadmap_id: RoadmapId, lock: Arc<Mutex<()>>) {
        let mut locks = self.locks.lock().await;
        drop(lock);
        if locks
            .get(&roadmap_id)
            .map_or(false, |l| Arc::strong_count(l) == 1)
        {
            locks.remove(&roadmap_id);
        }
    }


    async fn load_roadmap(&self, roadmap_id: RoadmapId) -> Result<(Roadmap, Vec<RoadmapModule>)> {
        let roadmap = self
            .storage
            .load_roadmap(roadmap_id)
            .await?
            .ok_or(ProgressError::RoadmapNotFound(roadmap_id))?;
        let modules = self.storage.list_modules(roadmap_id).await?;
        Ok((roadmap, modules))
    }

    async fn module_position(
        &self,
        modules: &[RoadmapModule],
        roadmap_id: RoadmapId,
        module_id: ModuleId,
    ) -> Result<usize> {
        if let Some(pos) = modules.iter().position(|m| m.id == module_id) {
            return Ok(pos);
        }
        match self.storage.load_module(module_id).await? {
            Some(_) => Err(ProgressError::ModuleNotInRoadmap {
                module_id,
                roadmap_id,
            }),
            None => Err(ProgressError::ModuleNotFound(module_id)),
        }
    }

    /// Raw sum of skill hours over modules the user has completed.
    async fn completed_hours(
        &self,
        modules: &[RoadmapModule],
        record: &Progress,
    ) -> Result<f64> {
        let mut completed: HashSet<ModuleId> = self
            .storage
            .list_progress(&record.user_id, record.roadmap_id)
            .await?
            .into_iter()
            .filter(|p| p.status == ProgressStatus::Completed)
            .map(|p| p.module_id)
            .collect();
        // The pending record supersedes its stored version.
        if record.status == ProgressStatus::Completed {
            completed.insert(record.module_id);
        } else {
            completed.remove(&record.module_id);
        }

        let skill_ids: Vec<SkillId> = modules
            .iter()
            .filter(|m| completed.contains(&m.id))
            .map(|m| m.skill_id)
            .collect();
        Ok(self
            .storage
            .load_skills(&skill_ids)
            .await?
            .iter()
            .map(|s| s.estimated_hours)
            .sum())
    }

    /// Body of a progress update; the caller holds the roadmap lock.
    async fn apply_update(&self, update: ProgressUpdate) -> Result<ProgressOutcome> {
        let (mut roadmap, mut modules) = self.load_roadmap(update.roadmap_id).await?;
        if roadmap.user_id != update.user_id {
            return Err(ProgressError::NotRoadmapOwner {
                user_id: update.user_id,
                roadmap_id: update.roadmap_id,
            });
        }
        let pos = self
            .module_position(&modules, update.roadmap_id, update.module_id)
            .await?;

        let now = Utc::now();
        let mut record = self
            .storage
            .load_progress(&update.user_id, update.module_id)
            .await?
            .unwrap_or_else(|| {
                Progress::not_started(update.user_id.clone(), update.roadmap_id, update.module_id, now)
            });

        let transition = apply_transition(&mut record, update.status, now);
        if let Some(minutes) = update.time_spent_minutes {
            record.time_spent_minutes = minutes;
        }
        if let Some(notes) = update.notes {
            record.notes = Some(notes);
        }
        record.updated_at = now;
        debug!(
            "Module {} for {}: {:?} -> {}",
            update.module_id, update.user_id, transition, record.status
        );

        let mut unlocked_modules = Vec::new();
        if transition.is_completion() {
            let next_order = modules[pos].sequence_order + 1;
            if let Some(next) = modules
                .iter_mut()
                .find(|m| m.sequence_order == next_order && m.is_locked)
            {
                next.is_locked = false;
                info!("Unlocked module {} (#{})", next.id, next.sequence_order);
                unlocked_modules.push(next.clone());
            }
        }

        let completed_hours = self.completed_hours(&modules, &record).await?;
        roadmap.completed_hours = completed_hours;
        roadmap.updated_at = now;

        self.storage
            .commit(
                ChangeSet {
                    roadmaps: vec![roadmap],
                    modules: unlocked_modules.clone(),
                    progress: vec![record.clone()],
                },
                &format!("Progress {} -> {}", update.module_id, record.status),
            )
            .await?;

        Ok(ProgressOutcome {
            progress: record,
            unlocked_modules,
            completed_hours,
        })
    }

    /// Body of a skip toggle; the caller holds the roadmap lock.
    async fn apply_skip(
        &self,
        roadmap_id: RoadmapId,
        module_id: ModuleId,
        skipped: bool,
    ) -> Result<TimeCalculation> {
        let (mut roadmap, mut modules) = self.load_roadmap(roadmap_id).await?;
        let pos = self.module_position(&modules, roadmap_id, module_id).await?;
        modules[pos].is_skipped = skipped;

        let inputs = load_time_inputs(self.storage.as_ref(), &modules).await?;
        let calculation = self.estimator.calculate_roadmap_time(&inputs);
        roadmap.estimated_hours = calculation.total_estimated_hours;
        roadmap.updated_at = Utc::now();

        self.storage
            .commit(
                ChangeSet {
                    roadmaps: vec![roadmap],
                    modules: vec![modules[pos].clone()],
                    progress: Vec::new(),
                },
                &format!("Module {} skipped={}", module_id, skipped),
            )
            .await?;

        Ok(calculation)
    }
}

#[async_trait]
impl<S: Storage + 'static> ProgressTracker for BasicProgressTracker<S> {
    async fn update_module_progress(&self, update: ProgressUpdate) -> Result<ProgressOutcome> {
        let roadmap_id = update.roadmap_id;
        let lock = self.roadmap_lock(roadmap_id).await;
        let result = {
            let _guard = lock.lock().await;
            self.apply_update(update).await
        };
        self.release_lock(roadmap_id, lock).await;
        result
    }

    async fn set_module_skipped(
        &self,
        roadmap_id: RoadmapId,
        module_id: ModuleId,
        skipped: bool,
    ) -> Result<TimeCalculation> {
        let lock = self.roadmap_lock(roadmap_id).await;
        let result = {
            let _guard = lock.lock().await;
            self.apply_skip(roadmap_id, module_id, skipped).await
        };
        self.release_lock(roadmap_id, lock).await;
        result
    }

    async fn estimate_roadmap(&self, roadmap_id: RoadmapId) -> Result<TimeCalculation> {
        let (_, modules) = self.load_roadmap(roadmap_id).await?;
        let inputs = load_time_inputs(self.storage.as_ref(), &modules).await?;
        Ok(self.estimator.calculate_roadmap_time(&inputs))
    }
}
