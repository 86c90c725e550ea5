//! The resumable commit workflow.
//!
//! A run starts at an entry [`State`] and feeds each handler's
//! [`Transition`] into the next handler until one pauses. On pause the
//! requested status is written to the active record and the workspace is
//! flushed; the record's status is all `continue` needs to pick up again.
//!
//! Every side effect that cannot be repeated safely (staging, amending,
//! formatting, sending) is the last thing its handler does before choosing
//! the next state.

use std::io::Write;
use std::path::PathBuf;

use autopatch_core::subject::{is_valid_tag, Decoration};
use autopatch_core::{CommitKey, CommitRecord, Status};
use autopatch_git::{Editor, Mailer, Vcs};
use autopatch_store::artifact::{decorate_artifact, strip_decoration};
use autopatch_store::Workspace;

use crate::prompt::{Choice, Prompt, Reply};
use crate::state::{FlowOptions, Outcome, Payload, State, Transition};
use crate::FlowError;

/// External collaborators, all blocking.
#[derive(Clone, Copy)]
pub struct Gateways<'g> {
    pub vcs: &'g dyn Vcs,
    pub prompt: &'g dyn Prompt,
    pub editor: &'g dyn Editor,
    pub mailer: &'g dyn Mailer,
}

type Handler<'w> = fn(&mut Machine<'w>, Payload) -> Result<Transition, FlowError>;

pub struct Machine<'w> {
    pub(crate) workspace: &'w mut Workspace,
    pub(crate) gw: Gateways<'w>,
    pub(crate) options: FlowOptions,
    pub(crate) active: Option<CommitKey>,
    /// Group being sent as a series, if any.
    pub(crate) group: Option<u32>,
}

impl<'w> Machine<'w> {
    pub fn new(workspace: &'w mut Workspace, gw: Gateways<'w>, options: FlowOptions) -> Self {
        Self {
            workspace,
            gw,
            options,
            active: None,
            group: None,
        }
    }

    pub fn set_active(&mut self, key: Option<CommitKey>) {
        self.active = key;
    }

    pub fn active_key(&self) -> Option<&CommitKey> {
        self.active.as_ref()
    }

    pub fn workspace(&self) -> &Workspace {
        self.workspace
    }

    fn handler(state: State) -> Handler<'w> {
        match state {
            State::ConfirmCommit => Self::confirm_commit,
            State::SelectTemplate => Self::select_template,
            State::DoCommit => Self::do_commit,
            State::Store => Self::store,
            State::SetTag => Self::set_tag,
            State::ReviewPatch => Self::review_patch,
            State::CheckPatch => Self::check_patch,
            State::SelectSend => Self::select_send,
            State::SelectMt => Self::select_mt,
            State::SendTest => Self::send_test,
            State::SendEmail => Self::send_email,
            State::ReCommit => Self::re_commit,
            State::Restore => Self::restore,
            State::NewVersion => Self::new_version,
            State::Clone => Self::clone_commit,
            State::MakeCover => Self::make_cover,
            State::SendGroup => Self::send_group,
            State::Finish => Self::finish,
        }
    }

    /// Run one handler without following the transition.
    pub fn step(&mut self, state: State, payload: Payload) -> Result<Transition, FlowError> {
        tracing::debug!(%state, active = ?self.active, "entering state");
        Self::handler(state)(self, payload)
    }

    /// Drive the machine from `entry` until a handler pauses.
    pub fn run(&mut self, entry: State, payload: Payload) -> Result<Outcome, FlowError> {
        let mut state = entry;
        let mut payload = payload;
        loop {
            match self.step(state, payload)? {
                Transition::Next(next, next_payload) => {
                    self.workspace.flush()?;
                    state = next;
                    payload = next_payload;
                }
                Transition::Pause(status) => {
                    self.pause(status)?;
                    return Ok(Outcome { state, status });
                }
            }
        }
    }

    /// Re-enter the workflow for the unfinished record titled `title`, at
    /// the state its status names.
    pub fn resume(&mut self, title: &str) -> Result<Outcome, FlowError> {
        let key = {
            let found = self.workspace.registry().find_unterminated_by_title(title);
            match found.as_slice() {
                [] => return Err(FlowError::NothingToContinue(title.to_string())),
                [one] => one.key.clone(),
                many => {
                    return Err(FlowError::AmbiguousContinue {
                        title: title.to_string(),
                        count: many.len(),
                    })
                }
            }
        };
        self.resume_key(&key)
    }

    /// Re-enter the workflow for one record at its persisted status.
    pub fn resume_key(&mut self, key: &CommitKey) -> Result<Outcome, FlowError> {
        let record = self
            .workspace
            .registry()
            .find_by_key(key)
            .ok_or_else(|| autopatch_store::StoreError::NotFound(key.clone()))?;
        let entry = State::resume_from(record.status).ok_or_else(|| FlowError::NotResumable {
            key: key.clone(),
            status: record.status,
        })?;
        tracing::info!(key = %key, %entry, "resuming");
        self.active = Some(key.clone());
        self.run(entry, Payload::None)
    }

    fn pause(&mut self, status: Option<Status>) -> Result<(), FlowError> {
        if let (Some(status), Some(key)) = (status, self.active.clone()) {
            if let Some(record) = self.workspace.registry_mut().find_by_key_mut(&key) {
                record.status = status;
                tracing::info!(key = %key, %status, "paused");
            }
        }
        self.workspace.flush()?;
        Ok(())
    }

    pub(crate) fn active_record(&self, state: State) -> Result<&CommitRecord, FlowError> {
        self.active
            .as_ref()
            .and_then(|k| self.workspace.registry().find_by_key(k))
            .ok_or(FlowError::NoActiveCommit(state))
    }

    pub(crate) fn active_record_mut(&mut self, state: State) -> Result<&mut CommitRecord, FlowError> {
        let key = self.active.clone().ok_or(FlowError::NoActiveCommit(state))?;
        self.workspace
            .registry_mut()
            .find_by_key_mut(&key)
            .ok_or(FlowError::NoActiveCommit(state))
    }

    pub(crate) fn artifact_of(&self, record: &CommitRecord) -> Result<PathBuf, FlowError> {
        self.workspace
            .registry()
            .artifact_path(record)
            .ok_or_else(|| autopatch_store::StoreError::NoArtifact(record.key.clone()).into())
    }

    /// Rewrite a record's artifact subject for a send of `count` patches.
    pub(crate) fn decorate(&self, record: &CommitRecord, count: usize) -> Result<bool, FlowError> {
        let path = self.artifact_of(record)?;
        let decoration = Decoration {
            version: record.version,
            tag: record.tag.as_deref(),
            order: record.order,
            count,
        };
        Ok(decorate_artifact(&path, &decoration)?)
    }

    fn confirm_commit(&mut self, _: Payload) -> Result<Transition, FlowError> {
        let changes = self.gw.vcs.status_summary()?;
        let text = format!("Commit the following changes?\n\n{changes}");
        if self.gw.prompt.scrollbox(&text, Some("cancel"))? != Reply::Ok {
            return Ok(Transition::stop());
        }
        Ok(Transition::to(State::SelectTemplate))
    }

    fn select_template(&mut self, _: Payload) -> Result<Transition, FlowError> {
        if self.options.templates.is_empty() {
            self.gw
                .prompt
                .notice("no commit templates configured; add some under [templates] in the config");
            return Ok(Transition::stop());
        }
        let choices: Vec<Choice> = self
            .options
            .templates
            .iter()
            .map(|t| Choice::new(&t.name, t.path.display().to_string()))
            .collect();
        let Some(name) = self.gw.prompt.menu("Select a commit message template", &choices)? else {
            return Ok(Transition::stop());
        };
        let template = self
            .options
            .templates
            .iter()
            .find(|t| t.name == name)
            .map(|t| t.path.clone())
            .ok_or_else(|| crate::PromptError::Unexpected(format!("unknown template {name}")))?;
        Ok(Transition::with(State::DoCommit, Payload::Template(template)))
    }

    fn do_commit(&mut self, payload: Payload) -> Result<Transition, FlowError> {
        let Payload::Template(template) = payload else {
            return Err(FlowError::UnexpectedPayload {
                state: State::DoCommit,
                expected: "template path",
            });
        };

        let group = self.options.group.unwrap_or(0);
        let mut order = 0;
        if group != 0 {
            order = self.workspace.registry().max_order(group);
            if order == 0 {
                let question = format!("Group {group} has no commits yet. Start a new patch series?");
                if !self.gw.prompt.yesno(&question)? {
                    return Ok(Transition::stop());
                }
            }
            order += 1;
        }

        let vcs = self.gw.vcs;
        vcs.stage_all()?;
        if !vcs.commit_with_template(&template)? {
            self.gw.prompt.notice("nothing was committed");
            vcs.reset_staged()?;
            return Ok(Transition::stop());
        }
        vcs.sign_off_last()?;

        let title = vcs.last_title()?;
        let mut key = CommitKey::parse(&vcs.last_short_id()?)?;
        if self.workspace.registry().find_by_key(&key).is_some() {
            key = CommitKey::new();
        }
        self.workspace
            .registry_mut()
            .add(&title, key.clone(), group, order)?;
        self.active = Some(key);
        Ok(Transition::to(State::Store))
    }

    fn store(&mut self, _: Payload) -> Result<Transition, FlowError> {
        let record = self.active_record(State::Store)?.clone();
        let patch_dir = self.workspace.registry().patch_dir().to_path_buf();
        std::fs::create_dir_all(&patch_dir)?;

        if let Some(old) = self.workspace.registry().artifact_path(&record) {
            if old.exists() {
                std::fs::remove_file(&old)?;
            }
        }

        // Format into a scratch directory so another record's artifact with
        // the same generated name is never overwritten.
        let scratch = tempfile::tempdir_in(&patch_dir)?;
        let produced = self.gw.vcs.format_last(scratch.path())?;
        let generated = produced
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| FlowError::Io(std::io::Error::other("format produced no file")))?;

        let taken = self
            .workspace
            .registry()
            .list()
            .iter()
            .any(|c| c.key != record.key && c.patch == generated);
        let name = if taken {
            autopatch_core::artifact::clone_name(&generated, record.key.as_str())?
        } else {
            generated
        };
        std::fs::rename(&produced, patch_dir.join(&name))?;

        let title = self.gw.vcs.last_title()?;
        let record = self.active_record_mut(State::Store)?;
        record.patch = name;
        record.title = title;
        record.touch();
        tracing::info!(key = %record.key, patch = %record.patch, "stored artifact");
        Ok(Transition::to(State::SetTag))
    }

    fn set_tag(&mut self, _: Payload) -> Result<Transition, FlowError> {
        let record = self.active_record(State::SetTag)?.clone();
        let path = self.artifact_of(&record)?;
        let current = record.tag.clone().unwrap_or_default();

        let Some(tag) = self
            .gw
            .prompt
            .input("Subject tag, such as net-next or bpf-next", &current)?
        else {
            return Ok(Transition::pause(Status::SetTag));
        };
        let tag = tag.trim().to_string();
        if !is_valid_tag(&tag) {
            self.gw
                .prompt
                .notice(&format!("tag {tag:?} cannot contain brackets or line breaks"));
            return Ok(Transition::to(State::SetTag));
        }

        let count = if record.is_grouped() && !self.options.isolate {
            self.workspace.registry().find_group(record.group).len()
        } else {
            1
        };

        let record = self.active_record_mut(State::SetTag)?;
        record.tag = if tag.is_empty() { None } else { Some(tag) };
        let record = record.clone();
        if !self.decorate(&record, count)? {
            // An earlier series decoration must not leak into a lone send.
            if self.options.isolate && strip_decoration(&path)? {
                tracing::info!(key = %record.key, "dropped series prefix for isolated send");
            } else {
                tracing::debug!(key = %record.key, "subject left as plain [PATCH]");
            }
        }
        Ok(Transition::with(State::ReviewPatch, Payload::Patches(vec![path])))
    }

    fn review_patch(&mut self, payload: Payload) -> Result<Transition, FlowError> {
        let patches = payload.into_patches(State::ReviewPatch)?;
        if self.gw.prompt.yesno("Review the patch in an editor?")? {
            for p in &patches {
                self.gw.editor.view(p)?;
            }
        }
        Ok(Transition::with(State::CheckPatch, Payload::Patches(patches)))
    }

    fn check_patch(&mut self, payload: Payload) -> Result<Transition, FlowError> {
        let patches = payload.into_patches(State::CheckPatch)?;
        let mut failed = false;
        for p in &patches {
            let report = self.gw.vcs.check_patch(p)?;
            if report.passed {
                continue;
            }
            failed = true;
            let text = format!(
                "checkpatch found problems in {}:\n\n{}",
                p.display(),
                report.output
            );
            if self.gw.prompt.scrollbox(&text, Some("ignore"))? != Reply::Extra {
                return Ok(Transition::pause(Status::ReCommit));
            }
        }
        if !failed {
            self.gw.prompt.message("checkpatch passed")?;
        }

        // A series member checked on its own is parked for the group send.
        if self.group.is_none() && !self.options.isolate {
            if let Ok(record) = self.active_record(State::CheckPatch) {
                if record.is_grouped() {
                    self.gw.prompt.notice(&format!(
                        "commit belongs to group {}; send the series with `autopatch send -g {}`",
                        record.group, record.group
                    ));
                    return Ok(Transition::pause(Status::ReCommit));
                }
            }
        }

        Ok(Transition::with(State::SelectSend, Payload::Patches(patches)))
    }

    fn re_commit(&mut self, _: Payload) -> Result<Transition, FlowError> {
        let version = self.active_record(State::ReCommit)?.version;
        let vcs = self.gw.vcs;
        vcs.stage_all()?;

        let amended = if version != 1 {
            let marker = format!("This is v{version} of:");
            let message = vcs.last_message()?;
            let message = if message.starts_with(&marker) {
                message
            } else {
                format!("{marker}\n{message}")
            };
            let mut buffer = tempfile::NamedTempFile::new()?;
            buffer.write_all(message.as_bytes())?;
            buffer.flush()?;
            vcs.amend(Some(buffer.path()))?
        } else {
            vcs.amend(None)?
        };

        if !amended {
            self.gw.prompt.notice("amend failed; fix the tree and continue again");
            return Ok(Transition::stop());
        }

        let title = vcs.last_title()?;
        let record = self.active_record_mut(State::ReCommit)?;
        record.title = title;
        record.touch();
        Ok(Transition::to(State::Store))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Answer, Harness};
    use crate::Template;

    fn templates() -> Vec<Template> {
        vec![Template {
            name: "net".into(),
            path: PathBuf::from("/tmp/net.tmpl"),
        }]
    }

    #[test]
    fn cancelled_confirmation_stops_without_record() {
        let mut h = Harness::new();
        h.prompt.push(Answer::Scroll(Reply::Cancel));
        let outcome = h.run(State::ConfirmCommit, Payload::None).unwrap();
        assert_eq!(outcome.state, State::ConfirmCommit);
        assert_eq!(outcome.status, None);
        assert!(h.workspace.registry().is_empty());
    }

    #[test]
    fn no_templates_stops_at_selection() {
        let mut h = Harness::new();
        h.prompt.push(Answer::Scroll(Reply::Ok));
        let outcome = h.run(State::ConfirmCommit, Payload::None).unwrap();
        assert_eq!(outcome.state, State::SelectTemplate);
        assert!(h.prompt.notices().iter().any(|n| n.contains("no commit templates")));
    }

    #[test]
    fn commit_creates_record_and_pauses_when_tag_cancelled() {
        let mut h = Harness::new();
        h.options.templates = templates();
        h.vcs.set_next_commit("net: fix leak");
        h.prompt.push(Answer::Scroll(Reply::Ok));
        h.prompt.push(Answer::Menu(Some("net".into())));
        h.prompt.push(Answer::Input(None));

        let outcome = h.run(State::ConfirmCommit, Payload::None).unwrap();
        assert_eq!(outcome.state, State::SetTag);
        assert_eq!(outcome.status, Some(Status::SetTag));

        let record = &h.workspace.registry().list()[0];
        assert_eq!(record.title, "net: fix leak");
        assert_eq!(record.status, Status::SetTag);
        assert_eq!(record.patch, "0001-net-fix-leak.patch");
        assert!(h.patch_dir().join(&record.patch).exists());
        assert_eq!(h.vcs.calls()[..3], ["stage_all", "commit_with_template", "sign_off_last"]);
    }

    #[test]
    fn rejected_commit_resets_index() {
        let mut h = Harness::new();
        h.vcs.set_commit_ok(false);
        let t = h
            .machine()
            .step(State::DoCommit, Payload::Template("/tmp/t".into()))
            .unwrap();
        assert_eq!(t, Transition::stop());
        assert!(h.vcs.calls().contains(&"reset_staged".to_string()));
        assert!(h.workspace.registry().is_empty());
    }

    #[test]
    fn first_commit_of_group_asks_to_start_series() {
        let mut h = Harness::new();
        h.options.group = Some(5);
        h.prompt.push(Answer::YesNo(false));
        let t = h
            .machine()
            .step(State::DoCommit, Payload::Template("/tmp/t".into()))
            .unwrap();
        assert_eq!(t, Transition::stop());
        assert!(h.vcs.calls().is_empty());

        h.prompt.push(Answer::YesNo(true));
        h.vcs.set_next_commit("a: one");
        let t = h
            .machine()
            .step(State::DoCommit, Payload::Template("/tmp/t".into()))
            .unwrap();
        assert_eq!(t, Transition::to(State::Store));

        h.vcs.set_next_commit("a: two");
        h.machine()
            .step(State::DoCommit, Payload::Template("/tmp/t".into()))
            .unwrap();
        let orders: Vec<u32> = h.workspace.registry().find_group(5).iter().map(|c| c.order).collect();
        assert_eq!(orders, [1, 2]);
    }

    #[test]
    fn set_tag_decorates_artifact() {
        let mut h = Harness::new();
        let key = h.stored_commit("net: fix leak", 0, 0);
        h.workspace.registry_mut().find_by_key_mut(&key).unwrap().version = 2;
        h.prompt.push(Answer::Input(Some("net-next".into())));

        let t = h.machine_for(&key).step(State::SetTag, Payload::None).unwrap();
        let record = h.workspace.registry().find_by_key(&key).unwrap().clone();
        let path = h.patch_dir().join(&record.patch);
        assert_eq!(t, Transition::with(State::ReviewPatch, Payload::Patches(vec![path.clone()])));
        assert_eq!(record.tag.as_deref(), Some("net-next"));
        let text = std::fs::read_to_string(path).unwrap();
        assert!(text.contains("Subject: [PATCH v2 net-next] net: fix leak"));
    }

    #[test]
    fn grouped_set_tag_counts_members() {
        let mut h = Harness::new();
        let first = h.stored_commit("a: one", 9, 1);
        h.stored_commit("a: two", 9, 2);
        h.prompt.push(Answer::Input(Some(String::new())));

        h.machine_for(&first).step(State::SetTag, Payload::None).unwrap();
        let record = h.workspace.registry().find_by_key(&first).unwrap();
        assert_eq!(record.tag, None);
        let text = std::fs::read_to_string(h.patch_dir().join(&record.patch)).unwrap();
        assert!(text.contains("Subject: [PATCH 1/2] a: one"));
    }

    #[test]
    fn review_opens_each_patch_when_asked() {
        let mut h = Harness::new();
        let patches = vec![PathBuf::from("/p/1.patch"), PathBuf::from("/p/2.patch")];
        h.prompt.push(Answer::YesNo(true));
        let t = h
            .machine()
            .step(State::ReviewPatch, Payload::Patches(patches.clone()))
            .unwrap();
        assert_eq!(t, Transition::with(State::CheckPatch, Payload::Patches(patches.clone())));
        assert_eq!(h.editor.viewed(), patches);

        h.prompt.push(Answer::YesNo(false));
        h.machine()
            .step(State::ReviewPatch, Payload::Patches(patches.clone()))
            .unwrap();
        assert_eq!(h.editor.viewed().len(), 2);
    }

    #[test]
    fn lint_failure_pauses_unless_ignored() {
        let mut h = Harness::new();
        let patches = vec![PathBuf::from("/p/bad.patch"), PathBuf::from("/p/ok.patch")];
        h.vcs.fail_check("bad.patch");

        h.prompt.push(Answer::Scroll(Reply::Ok));
        let t = h
            .machine()
            .step(State::CheckPatch, Payload::Patches(patches.clone()))
            .unwrap();
        assert_eq!(t, Transition::pause(Status::ReCommit));
        assert_eq!(h.vcs.checked(), ["bad.patch"]);

        h.prompt.push(Answer::Scroll(Reply::Extra));
        let t = h
            .machine()
            .step(State::CheckPatch, Payload::Patches(patches.clone()))
            .unwrap();
        assert_eq!(t, Transition::with(State::SelectSend, Payload::Patches(patches)));
        assert!(h.prompt.messages().is_empty());
    }

    #[test]
    fn grouped_commit_is_parked_after_lint() {
        let mut h = Harness::new();
        let key = h.stored_commit("a: one", 4, 1);
        let t = h
            .machine_for(&key)
            .step(State::CheckPatch, Payload::Patches(vec![PathBuf::from("/p/1.patch")]))
            .unwrap();
        assert_eq!(t, Transition::pause(Status::ReCommit));
        assert_eq!(h.prompt.messages(), ["checkpatch passed"]);
    }

    #[test]
    fn isolated_grouped_commit_is_sent_alone() {
        let mut h = Harness::new();
        let key = h.stored_commit("a: one", 4, 1);
        h.stored_commit("a: two", 4, 2);
        h.options.isolate = true;
        h.prompt.push(Answer::Input(Some("net".into())));
        h.prompt.push(Answer::YesNo(false));

        let outcome = h.machine_for(&key).run(State::SetTag, Payload::None).unwrap();
        assert_eq!(outcome.state, State::SelectSend);
        let record = h.workspace.registry().find_by_key(&key).unwrap();
        let text = std::fs::read_to_string(h.patch_dir().join(&record.patch)).unwrap();
        assert!(text.contains("Subject: [PATCH net] a: one"));
    }

    #[test]
    fn isolated_send_without_tag_drops_series_counter() {
        let mut h = Harness::new();
        let key = h.stored_commit("a: one", 4, 1);
        h.stored_commit("a: two", 4, 2);
        let subject = |h: &Harness| {
            let record = h.workspace.registry().find_by_key(&key).unwrap();
            let text = std::fs::read_to_string(h.patch_dir().join(&record.patch)).unwrap();
            text.lines()
                .find(|l| l.starts_with("Subject:"))
                .unwrap()
                .to_string()
        };

        h.prompt.push(Answer::Input(Some(String::new())));
        h.machine_for(&key).step(State::SetTag, Payload::None).unwrap();
        assert_eq!(subject(&h), "Subject: [PATCH 1/2] a: one");

        h.options.isolate = true;
        h.prompt.push(Answer::Input(Some(String::new())));
        h.machine_for(&key).step(State::SetTag, Payload::None).unwrap();
        assert_eq!(subject(&h), "Subject: [PATCH] a: one");
    }

    #[test]
    fn bracketed_tag_is_asked_again() {
        let mut h = Harness::new();
        let key = h.stored_commit("net: fix leak", 0, 0);
        h.prompt.push(Answer::Input(Some("net]".into())));
        h.prompt.push(Answer::Input(Some("net".into())));
        h.prompt.push(Answer::YesNo(false));

        let t = h.machine_for(&key).step(State::SetTag, Payload::None).unwrap();
        assert_eq!(t, Transition::to(State::SetTag));
        assert!(h.prompt.notices()[0].contains("net]"));
        assert!(h.workspace.registry().find_by_key(&key).unwrap().tag.is_none());

        let outcome = h.machine_for(&key).run(State::SetTag, Payload::None).unwrap();
        assert_eq!(outcome.state, State::SelectSend);
        let record = h.workspace.registry().find_by_key(&key).unwrap();
        let text = std::fs::read_to_string(h.patch_dir().join(&record.patch)).unwrap();
        assert!(text.contains("Subject: [PATCH net] net: fix leak"));
    }

    #[test]
    fn re_commit_prepends_version_line_once() {
        let mut h = Harness::new();
        let key = h.stored_commit("net: fix leak", 0, 0);
        h.workspace.registry_mut().find_by_key_mut(&key).unwrap().version = 2;

        let t = h.machine_for(&key).step(State::ReCommit, Payload::None).unwrap();
        assert_eq!(t, Transition::to(State::Store));
        let amended = h.vcs.amended_messages();
        assert!(amended[0].as_deref().unwrap().starts_with("This is v2 of:\nnet: fix leak"));

        h.vcs.set_last_message(amended[0].clone().unwrap());
        h.machine_for(&key).step(State::ReCommit, Payload::None).unwrap();
        let again = h.vcs.amended_messages()[1].clone().unwrap();
        assert_eq!(again.matches("This is v2 of:").count(), 1);
    }

    #[test]
    fn failed_amend_leaves_status_alone() {
        let mut h = Harness::new();
        let key = h.stored_commit("net: fix leak", 0, 0);
        h.workspace.registry_mut().find_by_key_mut(&key).unwrap().status = Status::ReCommit;
        h.vcs.set_amend_ok(false);

        let outcome = h.machine_for(&key).run(State::ReCommit, Payload::None).unwrap();
        assert_eq!(outcome, Outcome { state: State::ReCommit, status: None });
        assert_eq!(
            h.workspace.registry().find_by_key(&key).unwrap().status,
            Status::ReCommit
        );
        assert_eq!(h.vcs.amended_messages(), [None]);
    }

    #[test]
    fn store_keeps_artifacts_of_other_records() {
        let mut h = Harness::new();
        let a = h.stored_commit("net: fix leak", 0, 0);
        let b = h.stored_commit("net: fix leak", 0, 0);
        let pa = h.workspace.registry().find_by_key(&a).unwrap().patch.clone();
        let pb = h.workspace.registry().find_by_key(&b).unwrap().patch.clone();
        assert_ne!(pa, pb);
        assert!(h.patch_dir().join(&pa).exists());
        assert!(h.patch_dir().join(&pb).exists());
    }

    #[test]
    fn resume_matches_direct_entry() {
        let mut h = Harness::new();
        let key = h.stored_commit("net: fix leak", 0, 0);
        h.workspace.registry_mut().find_by_key_mut(&key).unwrap().status = Status::SetTag;

        h.prompt.push(Answer::Input(Some("net".into())));
        let direct = h.machine_for(&key).step(State::SetTag, Payload::None).unwrap();

        h.prompt.push(Answer::Input(Some("net".into())));
        h.prompt.push(Answer::YesNo(false));
        h.prompt.push(Answer::Scroll(Reply::Cancel));
        h.vcs.fail_check("0001-net-fix-leak.patch");
        let outcome = h.machine().resume("net: fix leak").unwrap();

        let Transition::Next(next, _) = direct else { panic!("expected a transition") };
        assert_eq!(next, State::ReviewPatch);
        assert_eq!(outcome.state, State::CheckPatch);
        assert_eq!(outcome.status, Some(Status::ReCommit));
        assert_eq!(h.vcs.checked(), ["0001-net-fix-leak.patch"]);
    }

    #[test]
    fn resume_rejects_ambiguous_and_finished() {
        let mut h = Harness::new();
        let a = h.stored_commit("dup", 0, 0);
        h.stored_commit("dup", 0, 0);
        assert!(matches!(
            h.machine().resume("dup"),
            Err(FlowError::AmbiguousContinue { count: 2, .. })
        ));
        assert!(matches!(
            h.machine().resume("missing"),
            Err(FlowError::NothingToContinue(_))
        ));

        h.workspace.registry_mut().find_by_key_mut(&a).unwrap().status = Status::Finish;
        assert!(matches!(
            h.machine().resume_key(&a),
            Err(FlowError::NotResumable { .. })
        ));
    }
}
