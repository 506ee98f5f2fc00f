use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of a grow surface or a source instance.
///
/// Planner-generated entities get sequential ids (`source-007`) so identical
/// inputs reproduce identical layouts. Entities added interactively get a
/// random UUID.
#[derive(Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UID(String);

impl From<&str> for UID {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for UID {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl Default for UID {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl UID {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Sequential id, e.g. `UID::indexed("surface", 3)` -> `surface-003`.
    pub fn indexed(prefix: &str, index: usize) -> Self {
        Self(format!("{prefix}-{index:03}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indexed_is_deterministic() {
        assert_eq!(UID::indexed("source", 7).as_str(), "source-007");
        assert_eq!(UID::indexed("source", 7), UID::indexed("source", 7));
    }

    #[test]
    fn test_random_ids_differ() {
        assert_ne!(UID::new(), UID::new());
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let json = serde_json::to_string(&UID::from("surface-001")).unwrap();
        assert_eq!(json, "\"surface-001\"");
    }
}
