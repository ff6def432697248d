//! Shared configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed configuration file
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Time estimation knobs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeConfig {
    /// Practice time as a fraction of resource time
    pub practice_time_ratio: f64,

    /// Safety buffer as a fraction of total module time
    pub buffer_percentage: f64,
}

impl Default for TimeConfig {
    fn default() -> Self {
        Self {
            practice_time_ratio: 0.5,
            buffer_percentage: 0.1,
        }
    }
}

/// Sequencer knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SequencerConfig {
    /// Runs slower than this are logged
    pub performance_budget_ms: u64,
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self {
            performance_budget_ms: 100,
        }
    }
}

/// Top-level configuration file (`skillpath.json`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkillpathConfig {
    /// Root directory of the JSON store
    pub storage_path: PathBuf,

    /// Time estimation
    pub time: TimeConfig,

    /// Sequencing
    pub sequencer: SequencerConfig,
}

impl Default for SkillpathConfig {
    fn default() -> Self {
        Self {
            storage_path: PathBuf::from(".skillpath"),
            time: TimeConfig::default(),
            sequencer: SequencerConfig::default(),
        }
    }
}

impl SkillpathConfig {
    /// Load configuration from a JSON file. A missing file yields defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CoreError> {
        match std::fs::read_to_string(path.as_ref()) {
            Ok(s) => Ok(serde_json::from_str(&s)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }
}
