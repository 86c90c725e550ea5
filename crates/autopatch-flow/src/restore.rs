//! Rebuilding a working tree from stored artifacts.

use std::io::Write;

use autopatch_core::{CommitKey, CommitRecord, Status};
use autopatch_store::artifact::read_commit_message;

use crate::machine::Machine;
use crate::state::{Payload, State, Transition};
use crate::FlowError;

impl Machine<'_> {
    pub(crate) fn restore(&mut self, _: Payload) -> Result<Transition, FlowError> {
        let record = self.active_record(State::Restore)?.clone();
        if self.restore_record(&record)? {
            Ok(Transition::pause(Status::ReCommit))
        } else {
            self.gw.prompt.notice("restore failed; the working tree was left as before");
            Ok(Transition::stop())
        }
    }

    /// Apply earlier series members, then the record itself or, with
    /// `no_content`, an empty commit carrying its message.
    fn restore_record(&self, record: &CommitRecord) -> Result<bool, FlowError> {
        let mut items: Vec<CommitRecord> = if record.is_grouped() {
            self.workspace
                .registry()
                .find_group(record.group)
                .into_iter()
                .filter(|c| c.order < record.order)
                .cloned()
                .collect()
        } else {
            Vec::new()
        };
        if !self.options.no_content {
            items.push(record.clone());
        }

        for item in &items {
            let path = self.artifact_of(item)?;
            if !self.gw.vcs.apply(&path)? {
                tracing::warn!(key = %item.key, patch = %path.display(), "apply failed");
                self.gw.vcs.abort_apply()?;
                return Ok(false);
            }
        }

        if !self.options.no_content {
            return Ok(true);
        }

        let path = self.artifact_of(record)?;
        let Some(message) = read_commit_message(&path)? else {
            tracing::warn!(patch = %path.display(), "no commit message in artifact");
            return Ok(false);
        };
        let mut buffer = tempfile::NamedTempFile::new()?;
        buffer.write_all(message.as_bytes())?;
        buffer.flush()?;
        Ok(self.gw.vcs.commit_empty(buffer.path())?)
    }

    pub(crate) fn new_version(&mut self, payload: Payload) -> Result<Transition, FlowError> {
        let key = match payload {
            Payload::Key(key) => key,
            _ => {
                return Err(FlowError::UnexpectedPayload {
                    state: State::NewVersion,
                    expected: "commit key",
                })
            }
        };
        let Some(record) = self.workspace.registry_mut().find_by_key_mut(&key) else {
            self.gw.prompt.notice(&format!("no commit with key {key}"));
            return Ok(Transition::stop());
        };
        record.version += 1;
        record.touch();
        tracing::info!(key = %key, version = record.version, "new version");
        self.active = Some(key);
        Ok(Transition::to(State::Restore))
    }

    pub(crate) fn clone_commit(&mut self, payload: Payload) -> Result<Transition, FlowError> {
        if let Payload::Key(key) = payload {
            if self.workspace.registry().find_by_key(&key).is_none() {
                self.gw.prompt.notice(&format!("no commit with key {key}"));
                return Ok(Transition::stop());
            }
            self.active = Some(key);
        }
        let source = self.active_record(State::Clone)?.key.clone();
        let clone = self
            .workspace
            .registry_mut()
            .clone_record(&source, CommitKey::new())?;
        self.active = Some(clone.key.clone());
        Ok(Transition::to(State::Restore))
    }
}
