//! Progress Tracking
//!
//! Learning-time estimation, the per-module progress state machine, and
//! module unlocking.

#![warn(missing_docs)]

pub mod estimator;
pub mod transition;
pub mod inputs;
pub mod tracker;

pub use estimator::{
    TimeEstimator, TimeCalculation, ModuleTime, ModuleTimeInput, ModuleBreakdown,
    calculate_module_time,
};
pub use transition::{apply_transition, Transition};
pub use inputs::load_time_inputs;
pub use tracker::{
    ProgressTracker, BasicProgressTracker, ProgressUpdate, ProgressOutcome, ProgressError,
};
