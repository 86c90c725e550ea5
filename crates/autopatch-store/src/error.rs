use std::path::PathBuf;
use thiserror::Error;

use autopatch_core::CommitKey;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not an autopatch workspace: {0} (run `autopatch init`)")]
    NotAWorkspace(PathBuf),
    #[error("commit not found: {0}")]
    NotFound(CommitKey),
    #[error("duplicate commit key: {0}")]
    DuplicateKey(CommitKey),
    #[error("group {group} already has a commit at order {order}")]
    OrderCollision { group: u32, order: u32 },
    #[error("commit {0} has no patch artifact yet")]
    NoArtifact(CommitKey),
    #[error("lock contention on {0}")]
    LockContention(PathBuf),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("core error: {0}")]
    Core(#[from] autopatch_core::CoreError),
    #[error("config error: {0}")]
    Config(String),
    #[error("export error: {0}")]
    Export(#[from] serde_json::Error),
}
