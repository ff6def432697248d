//! Storage abstraction and implementations for SkillPath.
//!
//! The planner and progress services only talk to the [`Storage`] trait.
//! Two backends are provided: an in-memory store and a JSON file store.

#![warn(missing_docs)]

pub mod trait_;
pub mod memory;
pub mod json_storage;

pub use trait_::{Storage, StorageError, Result, ChangeSet};
pub use memory::MemoryStorage;
pub use json_storage::JsonStorage;
