//! Human interaction the workflow blocks on.
//!
//! Every method blocks until the user answers. A cancelled prompt comes back
//! as `None`, `false` or [`Reply::Cancel`] and the workflow treats it as a
//! pause, never as an error.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PromptError {
    #[error("prompt program not available: {0}")]
    Unavailable(String),
    #[error("unexpected prompt result: {0}")]
    Unexpected(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Button pressed on a scroll box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    Ok,
    /// The optional extra button, e.g. "ignore".
    Extra,
    Cancel,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    pub tag: String,
    pub label: String,
    pub selected: bool,
}

impl Choice {
    pub fn new(tag: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            label: label.into(),
            selected: false,
        }
    }

    pub fn selected(mut self, selected: bool) -> Self {
        self.selected = selected;
        self
    }
}

pub trait Prompt {
    /// Pick one tag.
    fn menu(&self, text: &str, choices: &[Choice]) -> Result<Option<String>, PromptError>;
    /// Pick any number of tags.
    fn checklist(&self, text: &str, choices: &[Choice]) -> Result<Option<Vec<String>>, PromptError>;
    fn input(&self, text: &str, initial: &str) -> Result<Option<String>, PromptError>;
    fn yesno(&self, text: &str) -> Result<bool, PromptError>;
    /// Long text with OK, an optional extra button and cancel.
    fn scrollbox(&self, text: &str, extra: Option<&str>) -> Result<Reply, PromptError>;
    /// Blocking acknowledgement box.
    fn message(&self, text: &str) -> Result<(), PromptError>;
    /// Non-blocking status line for the user.
    fn notice(&self, text: &str);
}
