//! Scripted gateways for driving the machine without git, a terminal or a
//! mail server.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use autopatch_core::CommitKey;
use autopatch_git::{CheckReport, Editor, GitError, Mail, Mailer, Maintainer, Vcs};
use autopatch_store::Workspace;
use tempfile::TempDir;

use crate::machine::{Gateways, Machine};
use crate::prompt::{Choice, Prompt, PromptError, Reply};
use crate::state::{FlowOptions, Outcome, Payload, State};
use crate::FlowError;

pub const AUTHOR_NAME: &str = "Dev";
pub const AUTHOR_EMAIL: &str = "dev@example.com";

const COVER_TEMPLATE: &str = "From 0000000000000000000000000000000000000000 Mon Sep 17 00:00:00 2001\n\
From: Dev <dev@example.com>\n\
Subject: [PATCH 0/{count}] *** SUBJECT HERE ***\n\
\n\
*** BLURB HERE ***\n\
\n\
Dev (2):\n\
\n\
-- \n\
2.43.0\n";

fn slug(title: &str) -> String {
    let mut out = String::new();
    for ch in title.chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch.to_ascii_lowercase());
        } else if !out.ends_with('-') {
            out.push('-');
        }
    }
    out.trim_matches('-').to_string()
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// [`Vcs`] that records mutating calls and fabricates artifacts.
pub struct ScriptedVcs {
    calls: RefCell<Vec<String>>,
    title: RefCell<String>,
    message: RefCell<Option<String>>,
    commits: Cell<u32>,
    commit_ok: Cell<bool>,
    amend_ok: Cell<bool>,
    apply_ok: Cell<bool>,
    failing: RefCell<Vec<String>>,
    checked: RefCell<Vec<String>>,
    maintainers: RefCell<Vec<Maintainer>>,
    amended: RefCell<Vec<Option<String>>>,
    applied: RefCell<Vec<String>>,
    empty_commits: RefCell<Vec<String>>,
    upstream: RefCell<Vec<String>>,
    queries: RefCell<Vec<(String, String)>>,
}

impl Default for ScriptedVcs {
    fn default() -> Self {
        Self {
            calls: RefCell::default(),
            title: RefCell::new("initial commit".into()),
            message: RefCell::default(),
            commits: Cell::new(0),
            commit_ok: Cell::new(true),
            amend_ok: Cell::new(true),
            apply_ok: Cell::new(true),
            failing: RefCell::default(),
            checked: RefCell::default(),
            maintainers: RefCell::default(),
            amended: RefCell::default(),
            applied: RefCell::default(),
            empty_commits: RefCell::default(),
            upstream: RefCell::default(),
            queries: RefCell::default(),
        }
    }
}

impl ScriptedVcs {
    fn log(&self, call: &str) {
        self.calls.borrow_mut().push(call.to_string());
    }

    /// Title the next successful commit gets.
    pub fn set_next_commit(&self, title: &str) {
        *self.title.borrow_mut() = title.to_string();
        *self.message.borrow_mut() = None;
    }

    pub fn set_last_message(&self, message: String) {
        *self.message.borrow_mut() = Some(message);
    }

    pub fn set_commit_ok(&self, ok: bool) {
        self.commit_ok.set(ok);
    }

    pub fn set_amend_ok(&self, ok: bool) {
        self.amend_ok.set(ok);
    }

    pub fn set_apply_ok(&self, ok: bool) {
        self.apply_ok.set(ok);
    }

    /// Make the lint check fail for artifacts with this file name.
    pub fn fail_check(&self, name: &str) {
        self.failing.borrow_mut().push(name.to_string());
    }

    pub fn clear_failures(&self) {
        self.failing.borrow_mut().clear();
    }

    pub fn set_maintainers(&self, maintainers: Vec<Maintainer>) {
        *self.maintainers.borrow_mut() = maintainers;
    }

    pub fn set_upstream_subjects(&self, subjects: Vec<String>) {
        *self.upstream.borrow_mut() = subjects;
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.borrow_mut().clear();
        self.applied.borrow_mut().clear();
    }

    /// File names passed to the lint check.
    pub fn checked(&self) -> Vec<String> {
        self.checked.borrow().clone()
    }

    /// Message file contents of each amend, `None` for a plain amend.
    pub fn amended_messages(&self) -> Vec<Option<String>> {
        self.amended.borrow().clone()
    }

    /// File names applied, in order.
    pub fn applied(&self) -> Vec<String> {
        self.applied.borrow().clone()
    }

    pub fn empty_commits(&self) -> Vec<String> {
        self.empty_commits.borrow().clone()
    }

    pub fn subject_queries(&self) -> Vec<(String, String)> {
        self.queries.borrow().clone()
    }

    fn artifact_text(&self) -> String {
        let title = self.title.borrow();
        format!(
            "From c{:06} Mon Sep 17 00:00:00 2001\n\
From: {AUTHOR_NAME} <{AUTHOR_EMAIL}>\n\
Subject: [PATCH] {title}\n\
\n\
Body of {title}.\n\
\n\
Signed-off-by: {AUTHOR_NAME} <{AUTHOR_EMAIL}>\n\
---\n \
file.c | 1 +\n \
1 file changed, 1 insertion(+)\n",
            self.commits.get()
        )
    }
}

impl Vcs for ScriptedVcs {
    fn status_summary(&self) -> Result<String, GitError> {
        Ok(" M file.c".into())
    }

    fn stage_all(&self) -> Result<(), GitError> {
        self.log("stage_all");
        Ok(())
    }

    fn reset_staged(&self) -> Result<(), GitError> {
        self.log("reset_staged");
        Ok(())
    }

    fn commit_with_template(&self, _template: &Path) -> Result<bool, GitError> {
        self.log("commit_with_template");
        if self.commit_ok.get() {
            self.commits.set(self.commits.get() + 1);
        }
        Ok(self.commit_ok.get())
    }

    fn sign_off_last(&self) -> Result<(), GitError> {
        self.log("sign_off_last");
        Ok(())
    }

    fn amend(&self, message: Option<&Path>) -> Result<bool, GitError> {
        self.log("amend");
        let content = message.map(std::fs::read_to_string).transpose()?;
        self.amended.borrow_mut().push(content);
        Ok(self.amend_ok.get())
    }

    fn format_last(&self, out_dir: &Path) -> Result<PathBuf, GitError> {
        self.log("format_last");
        std::fs::create_dir_all(out_dir)?;
        let path = out_dir.join(format!("0001-{}.patch", slug(&self.title.borrow())));
        std::fs::write(&path, self.artifact_text())?;
        Ok(path)
    }

    fn format_series_cover(&self, count: usize, out_dir: &Path) -> Result<PathBuf, GitError> {
        self.log("format_series_cover");
        std::fs::create_dir_all(out_dir)?;
        let path = out_dir.join("0000-cover-letter.patch");
        std::fs::write(&path, COVER_TEMPLATE.replace("{count}", &count.to_string()))?;
        Ok(path)
    }

    fn apply(&self, patch: &Path) -> Result<bool, GitError> {
        self.log("apply");
        self.applied.borrow_mut().push(file_name(patch));
        Ok(self.apply_ok.get())
    }

    fn abort_apply(&self) -> Result<(), GitError> {
        self.log("abort_apply");
        Ok(())
    }

    fn commit_empty(&self, message: &Path) -> Result<bool, GitError> {
        self.log("commit_empty");
        self.empty_commits
            .borrow_mut()
            .push(std::fs::read_to_string(message)?);
        Ok(true)
    }

    fn check_patch(&self, patch: &Path) -> Result<CheckReport, GitError> {
        let name = file_name(patch);
        let passed = !self.failing.borrow().contains(&name);
        self.checked.borrow_mut().push(name);
        Ok(CheckReport {
            passed,
            output: if passed {
                "total: 0 errors, 0 warnings".into()
            } else {
                "ERROR: trailing whitespace".into()
            },
        })
    }

    fn maintainers(&self, _patches: &[PathBuf]) -> Result<Vec<Maintainer>, GitError> {
        Ok(self.maintainers.borrow().clone())
    }

    fn last_title(&self) -> Result<String, GitError> {
        Ok(self.title.borrow().clone())
    }

    fn last_message(&self) -> Result<String, GitError> {
        if let Some(message) = self.message.borrow().clone() {
            return Ok(message);
        }
        Ok(format!(
            "{}\n\nSigned-off-by: {AUTHOR_NAME} <{AUTHOR_EMAIL}>\n",
            self.title.borrow()
        ))
    }

    fn last_short_id(&self) -> Result<String, GitError> {
        Ok(format!("c{:06}", self.commits.get()))
    }

    fn author_email(&self) -> Result<String, GitError> {
        Ok(AUTHOR_EMAIL.into())
    }

    fn sender(&self) -> Result<String, GitError> {
        Ok(format!("{AUTHOR_NAME} <{AUTHOR_EMAIL}>"))
    }

    fn subjects_since(&self, author: &str, since: &str) -> Result<Vec<String>, GitError> {
        self.queries
            .borrow_mut()
            .push((author.to_string(), since.to_string()));
        Ok(self.upstream.borrow().clone())
    }
}

/// One queued answer for [`ScriptedPrompt`].
#[derive(Debug, Clone)]
pub enum Answer {
    Menu(Option<String>),
    Checklist(Option<Vec<String>>),
    Input(Option<String>),
    YesNo(bool),
    Scroll(Reply),
}

/// [`Prompt`] answering from a queue. An empty queue answers like a user
/// pressing cancel.
#[derive(Default)]
pub struct ScriptedPrompt {
    answers: RefCell<VecDeque<Answer>>,
    notices: RefCell<Vec<String>>,
    messages: RefCell<Vec<String>>,
    last_choices: RefCell<Vec<Choice>>,
}

impl ScriptedPrompt {
    pub fn push(&self, answer: Answer) {
        self.answers.borrow_mut().push_back(answer);
    }

    pub fn remaining(&self) -> usize {
        self.answers.borrow().len()
    }

    pub fn notices(&self) -> Vec<String> {
        self.notices.borrow().clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.borrow().clone()
    }

    /// Choices offered by the most recent menu or checklist.
    pub fn last_choices(&self) -> Vec<Choice> {
        self.last_choices.borrow().clone()
    }

    fn next(&self, kind: &str) -> Option<Answer> {
        let answer = self.answers.borrow_mut().pop_front();
        if answer.is_none() {
            tracing::debug!(kind, "no scripted answer, cancelling");
        }
        answer
    }
}

fn mismatch(expected: &str, got: Answer) -> PromptError {
    PromptError::Unexpected(format!("expected {expected} answer, got {got:?}"))
}

impl Prompt for ScriptedPrompt {
    fn menu(&self, _text: &str, choices: &[Choice]) -> Result<Option<String>, PromptError> {
        *self.last_choices.borrow_mut() = choices.to_vec();
        match self.next("menu") {
            None => Ok(None),
            Some(Answer::Menu(tag)) => Ok(tag),
            Some(other) => Err(mismatch("menu", other)),
        }
    }

    fn checklist(&self, _text: &str, choices: &[Choice]) -> Result<Option<Vec<String>>, PromptError> {
        *self.last_choices.borrow_mut() = choices.to_vec();
        match self.next("checklist") {
            None => Ok(None),
            Some(Answer::Checklist(tags)) => Ok(tags),
            Some(other) => Err(mismatch("checklist", other)),
        }
    }

    fn input(&self, _text: &str, _initial: &str) -> Result<Option<String>, PromptError> {
        match self.next("input") {
            None => Ok(None),
            Some(Answer::Input(text)) => Ok(text),
            Some(other) => Err(mismatch("input", other)),
        }
    }

    fn yesno(&self, _text: &str) -> Result<bool, PromptError> {
        match self.next("yesno") {
            None => Ok(false),
            Some(Answer::YesNo(yes)) => Ok(yes),
            Some(other) => Err(mismatch("yesno", other)),
        }
    }

    fn scrollbox(&self, _text: &str, _extra: Option<&str>) -> Result<Reply, PromptError> {
        match self.next("scrollbox") {
            None => Ok(Reply::Cancel),
            Some(Answer::Scroll(reply)) => Ok(reply),
            Some(other) => Err(mismatch("scrollbox", other)),
        }
    }

    fn message(&self, text: &str) -> Result<(), PromptError> {
        self.messages.borrow_mut().push(text.to_string());
        Ok(())
    }

    fn notice(&self, text: &str) {
        self.notices.borrow_mut().push(text.to_string());
    }
}

/// [`Editor`] that writes canned text on edit and remembers what it was
/// asked to show.
pub struct RecordingEditor {
    content: RefCell<Option<String>>,
    ok: Cell<bool>,
    edits: Cell<usize>,
    viewed: RefCell<Vec<PathBuf>>,
}

impl Default for RecordingEditor {
    fn default() -> Self {
        Self {
            content: RefCell::default(),
            ok: Cell::new(true),
            edits: Cell::new(0),
            viewed: RefCell::default(),
        }
    }
}

impl RecordingEditor {
    /// Text every later edit leaves in the file.
    pub fn set_content(&self, content: &str) {
        *self.content.borrow_mut() = Some(content.to_string());
    }

    pub fn set_ok(&self, ok: bool) {
        self.ok.set(ok);
    }

    pub fn edited(&self) -> usize {
        self.edits.get()
    }

    pub fn viewed(&self) -> Vec<PathBuf> {
        self.viewed.borrow().clone()
    }
}

impl Editor for RecordingEditor {
    fn edit(&self, path: &Path) -> Result<bool, GitError> {
        self.edits.set(self.edits.get() + 1);
        if let Some(content) = self.content.borrow().as_deref() {
            std::fs::write(path, content)?;
        }
        Ok(self.ok.get())
    }

    fn view(&self, path: &Path) -> Result<(), GitError> {
        self.viewed.borrow_mut().push(path.to_path_buf());
        Ok(())
    }
}

pub struct RecordingMailer {
    ok: Cell<bool>,
    sent: RefCell<Vec<Mail>>,
}

impl Default for RecordingMailer {
    fn default() -> Self {
        Self {
            ok: Cell::new(true),
            sent: RefCell::default(),
        }
    }
}

impl RecordingMailer {
    pub fn set_ok(&self, ok: bool) {
        self.ok.set(ok);
    }

    pub fn sent(&self) -> Vec<Mail> {
        self.sent.borrow().clone()
    }
}

impl Mailer for RecordingMailer {
    fn send(&self, mail: &Mail) -> Result<bool, GitError> {
        self.sent.borrow_mut().push(mail.clone());
        Ok(self.ok.get())
    }
}

/// A fresh workspace in a temporary directory plus scripted gateways.
pub struct Harness {
    pub workspace: Workspace,
    pub vcs: ScriptedVcs,
    pub prompt: ScriptedPrompt,
    pub editor: RecordingEditor,
    pub mailer: RecordingMailer,
    pub options: FlowOptions,
    dir: TempDir,
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}

impl Harness {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let workspace = Workspace::init(dir.path()).expect("init workspace");
        Self {
            workspace,
            vcs: ScriptedVcs::default(),
            prompt: ScriptedPrompt::default(),
            editor: RecordingEditor::default(),
            mailer: RecordingMailer::default(),
            options: FlowOptions::default(),
            dir,
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn patch_dir(&self) -> PathBuf {
        self.workspace.registry().patch_dir().to_path_buf()
    }

    pub fn machine(&mut self) -> Machine<'_> {
        let gw = Gateways {
            vcs: &self.vcs,
            prompt: &self.prompt,
            editor: &self.editor,
            mailer: &self.mailer,
        };
        Machine::new(&mut self.workspace, gw, self.options.clone())
    }

    pub fn machine_for(&mut self, key: &CommitKey) -> Machine<'_> {
        let mut machine = self.machine();
        machine.set_active(Some(key.clone()));
        machine
    }

    pub fn run(&mut self, entry: State, payload: Payload) -> Result<Outcome, FlowError> {
        self.machine().run(entry, payload)
    }

    /// Commit `title` and store its artifact without any prompting. The
    /// record is left at status `store`.
    pub fn stored_commit(&mut self, title: &str, group: u32, order: u32) -> CommitKey {
        self.vcs.set_next_commit(title);
        self.vcs
            .commit_with_template(Path::new("template"))
            .expect("scripted commit");
        let key = CommitKey::new();
        self.workspace
            .registry_mut()
            .add(title, key.clone(), group, order)
            .expect("add record");
        self.machine_for(&key)
            .step(State::Store, Payload::None)
            .expect("store artifact");
        self.workspace.flush().expect("flush");
        key
    }
}
