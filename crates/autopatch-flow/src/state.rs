use std::fmt;
use std::path::PathBuf;

use autopatch_core::{CommitKey, Status};

use crate::FlowError;

/// Every step of the workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum State {
    ConfirmCommit,
    SelectTemplate,
    DoCommit,
    Store,
    SetTag,
    ReviewPatch,
    CheckPatch,
    SelectSend,
    SelectMt,
    SendTest,
    SendEmail,
    ReCommit,
    Restore,
    NewVersion,
    Clone,
    MakeCover,
    SendGroup,
    Finish,
}

impl State {
    pub fn name(self) -> &'static str {
        match self {
            State::ConfirmCommit => "confirm_commit",
            State::SelectTemplate => "select_template",
            State::DoCommit => "do_commit",
            State::Store => "store",
            State::SetTag => "set_tag",
            State::ReviewPatch => "review_patch",
            State::CheckPatch => "check_patch",
            State::SelectSend => "select_send",
            State::SelectMt => "select_mt",
            State::SendTest => "send_test",
            State::SendEmail => "send_email",
            State::ReCommit => "re_commit",
            State::Restore => "restore",
            State::NewVersion => "new_version",
            State::Clone => "clone",
            State::MakeCover => "make_cover",
            State::SendGroup => "send_group",
            State::Finish => "finish",
        }
    }

    /// Entry state for a persisted status; terminal statuses have none.
    pub fn resume_from(status: Status) -> Option<State> {
        match status {
            Status::Store => Some(State::Store),
            Status::SetTag => Some(State::SetTag),
            Status::ReCommit => Some(State::ReCommit),
            Status::Finish | Status::Applied => None,
        }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Input handed from one state to the next.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Payload {
    #[default]
    None,
    Template(PathBuf),
    Key(CommitKey),
    Group(u32),
    Patches(Vec<PathBuf>),
    Mail {
        patches: Vec<PathBuf>,
        to: Vec<String>,
        cc: Vec<String>,
    },
}

impl Payload {
    pub(crate) fn into_patches(self, state: State) -> Result<Vec<PathBuf>, FlowError> {
        match self {
            Payload::Patches(p) => Ok(p),
            _ => Err(FlowError::UnexpectedPayload {
                state,
                expected: "patch list",
            }),
        }
    }

    pub(crate) fn into_group(self, state: State) -> Result<u32, FlowError> {
        match self {
            Payload::Group(g) => Ok(g),
            _ => Err(FlowError::UnexpectedPayload {
                state,
                expected: "group id",
            }),
        }
    }
}

/// What a state handler decided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    Next(State, Payload),
    /// Stop the machine; a status is written to the active record.
    Pause(Option<Status>),
}

impl Transition {
    pub fn to(state: State) -> Self {
        Transition::Next(state, Payload::None)
    }

    pub fn with(state: State, payload: Payload) -> Self {
        Transition::Next(state, payload)
    }

    pub fn pause(status: Status) -> Self {
        Transition::Pause(Some(status))
    }

    /// Stop without touching the active record's status.
    pub fn stop() -> Self {
        Transition::Pause(None)
    }
}

/// Where a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outcome {
    /// The state whose handler stopped the machine.
    pub state: State,
    pub status: Option<Status>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    pub name: String,
    pub path: PathBuf,
}

/// Command-line switches the machine reads but never changes.
#[derive(Debug, Clone, Default)]
pub struct FlowOptions {
    /// Group a new commit joins.
    pub group: Option<u32>,
    /// Restore only the commit message, not the change itself.
    pub no_content: bool,
    /// Send a grouped commit on its own instead of as part of its series.
    pub isolate: bool,
    pub templates: Vec<Template>,
}
