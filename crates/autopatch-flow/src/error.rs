use thiserror::Error;

use autopatch_core::{CommitKey, Status};

use crate::prompt::PromptError;
use crate::state::State;

#[derive(Debug, Error)]
pub enum FlowError {
    #[error("store error: {0}")]
    Store(#[from] autopatch_store::StoreError),
    #[error("{0}")]
    Git(#[from] autopatch_git::GitError),
    #[error("core error: {0}")]
    Core(#[from] autopatch_core::CoreError),
    #[error("prompt error: {0}")]
    Prompt(#[from] PromptError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("state {0} needs an active commit")]
    NoActiveCommit(State),
    #[error("state {state} expects {expected} input")]
    UnexpectedPayload { state: State, expected: &'static str },
    #[error("no unfinished commit titled {0:?}")]
    NothingToContinue(String),
    #[error("{count} unfinished commits are titled {title:?}; resolve the duplicates first")]
    AmbiguousContinue { title: String, count: usize },
    #[error("commit {key} is {status} and cannot be continued")]
    NotResumable { key: CommitKey, status: Status },
    #[error("cover letter template has no blurb markers: {0}")]
    CoverTemplate(String),
}
