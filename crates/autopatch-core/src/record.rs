use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::key::CommitKey;
use crate::CoreError;

/// Where a tracked commit is parked between invocations.
///
/// The non-terminal variants name the workflow step that `continue`
/// re-enters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    #[default]
    Store,
    SetTag,
    ReCommit,
    Finish,
    Applied,
}

impl Status {
    pub fn is_terminal(self) -> bool {
        matches!(self, Status::Finish | Status::Applied)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Store => "store",
            Status::SetTag => "set_tag",
            Status::ReCommit => "re_commit",
            Status::Finish => "finish",
            Status::Applied => "applied",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "store" => Ok(Status::Store),
            "set_tag" => Ok(Status::SetTag),
            "re_commit" => Ok(Status::ReCommit),
            "finish" => Ok(Status::Finish),
            "applied" => Ok(Status::Applied),
            _ => Err(CoreError::UnknownStatus(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRecord {
    pub key: CommitKey,
    pub title: String,
    pub created_at_ms: u64,
    pub updated_at_ms: u64,
    /// Artifact file name inside the workspace patch directory; empty until
    /// the commit is first formatted.
    #[serde(default)]
    pub patch: String,
    pub version: u32,
    #[serde(default)]
    pub parent: String,
    /// Zero means standalone.
    #[serde(default)]
    pub group: u32,
    #[serde(default)]
    pub order: u32,
    #[serde(default)]
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    /// Cover-letter body; only kept on the first member of a group.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover: Option<String>,
}

impl CommitRecord {
    pub fn new(title: &str, key: CommitKey, group: u32, order: u32) -> Self {
        let now = now_ms();
        Self {
            key,
            title: title.to_string(),
            created_at_ms: now,
            updated_at_ms: now,
            patch: String::new(),
            version: 1,
            parent: String::new(),
            group,
            order,
            status: Status::default(),
            tag: None,
            cover: None,
        }
    }

    pub fn is_grouped(&self) -> bool {
        self.group != 0
    }

    pub fn touch(&mut self) {
        self.updated_at_ms = now_ms();
    }
}

pub fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
