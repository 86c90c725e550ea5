use serde::{Deserialize, Serialize};
use std::fmt;
use ulid::Ulid;

use crate::CoreError;

/// Stable identifier of a tracked commit.
///
/// Revision ids change on every amend, so a key is minted once (from the
/// first short revision id, or a fresh ULID for clones) and never changes.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommitKey(String);

impl CommitKey {
    pub fn new() -> Self {
        Self(Ulid::new().to_string().to_lowercase())
    }

    pub fn parse(s: &str) -> Result<Self, CoreError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(CoreError::InvalidKey("empty".into()));
        }
        if !s.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
            return Err(CoreError::InvalidKey(s.to_string()));
        }
        Ok(Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for CommitKey {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CommitKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for CommitKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CommitKey({})", self.0)
    }
}

impl std::str::FromStr for CommitKey {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
