//! Unique identifiers for SkillPath entities.

use serde::{Deserialize, Serialize};
use ulid::Ulid;

macro_rules! ulid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(Ulid);

        impl $name {
            /// Generate a new identifier
            pub fn new() -> Self {
                Self(Ulid::new())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                self.0.fmt(f)
            }
        }

        impl std::str::FromStr for $name {
            type Err = ulid::DecodeError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(s.parse()?))
            }
        }
    };
}

ulid_id!(
    /// Unique identifier for a catalog Skill
    SkillId
);

ulid_id!(
    /// Unique identifier for a learning Resource
    ResourceId
);

ulid_id!(
    /// Unique identifier for a Roadmap
    RoadmapId
);

ulid_id!(
    /// Unique identifier for a RoadmapModule
    ModuleId
);

ulid_id!(
    /// Unique identifier for a Progress record
    ProgressId
);

/// Identifier of a learner.
///
/// Users are owned by the external authentication layer, so this is an opaque
/// string rather than a generated ULID.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UserId(String);

impl UserId {
    /// Wrap an external user identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw identifier
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skill_id_round_trips_through_display() {
        let id = SkillId::new();
        let parsed: SkillId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_invalid_ulid_is_rejected() {
        assert!("html-basics".parse::<SkillId>().is_err());
    }

    #[test]
    fn test_user_id_display() {
        let user = UserId::new("user-42");
        assert_eq!(user.to_string(), "user-42");
        assert_eq!(user.as_str(), "user-42");
    }
}
