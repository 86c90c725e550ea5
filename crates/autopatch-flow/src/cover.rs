//! Patch series: cover letter authoring and group sends.
//!
//! A group is sent as one series. The cover letter text lives on the
//! group's first record; its artifact is `<first artifact stem>_cover.patch`
//! and is regenerated from `git format-patch --cover-letter` whenever the
//! text is edited.

use std::io::Write;
use std::path::PathBuf;

use autopatch_core::artifact::{cover_name, substitute_cover_body};
use autopatch_core::CommitRecord;

use crate::machine::Machine;
use crate::state::{Payload, State, Transition};
use crate::FlowError;

impl Machine<'_> {
    /// Members of `group` ordered for sending, or `None` (after telling the
    /// user) when there are too few to form a series.
    fn series_members(&self, group: u32) -> Option<Vec<CommitRecord>> {
        let members: Vec<CommitRecord> = self
            .workspace
            .registry()
            .find_group(group)
            .into_iter()
            .cloned()
            .collect();
        if members.len() < 2 {
            self.gw
                .prompt
                .notice(&format!("group {group} needs at least two commits to send as a series"));
            return None;
        }
        Some(members)
    }

    /// Pseudo-record standing for the cover letter in subject decoration.
    fn cover_record(first: &CommitRecord) -> Result<CommitRecord, FlowError> {
        let mut cover = first.clone();
        cover.patch = cover_name(&first.patch)?;
        cover.order = 0;
        Ok(cover)
    }

    /// Decorate every artifact of the series and hand them to review,
    /// cover letter first.
    fn review_series(&self, members: &[CommitRecord]) -> Result<Transition, FlowError> {
        let cover = Self::cover_record(&members[0])?;
        let count = members.len();
        let mut patches: Vec<PathBuf> = Vec::with_capacity(count + 1);
        for record in std::iter::once(&cover).chain(members) {
            self.decorate(record, count)?;
            patches.push(self.artifact_of(record)?);
        }
        Ok(Transition::with(State::ReviewPatch, Payload::Patches(patches)))
    }

    pub(crate) fn send_group(&mut self, payload: Payload) -> Result<Transition, FlowError> {
        let group = payload.into_group(State::SendGroup)?;
        let Some(members) = self.series_members(group) else {
            return Ok(Transition::stop());
        };
        self.group = Some(group);

        let first = &members[0];
        let cover_exists = first.cover.is_some()
            && self
                .workspace
                .registry()
                .patch_path(&cover_name(&first.patch)?)
                .exists();
        if !cover_exists {
            return Ok(Transition::with(State::MakeCover, Payload::Group(group)));
        }
        self.review_series(&members)
    }

    pub(crate) fn make_cover(&mut self, payload: Payload) -> Result<Transition, FlowError> {
        let group = payload.into_group(State::MakeCover)?;
        let Some(members) = self.series_members(group) else {
            return Ok(Transition::stop());
        };
        self.group = Some(group);
        let first = &members[0];

        let mut buffer = tempfile::NamedTempFile::new()?;
        if let Some(cover) = &first.cover {
            buffer.write_all(cover.as_bytes())?;
            buffer.flush()?;
        }
        if !self.gw.editor.edit(buffer.path())? {
            self.gw.prompt.notice("editor exited with an error; series not sent");
            return Ok(Transition::stop());
        }
        let text = std::fs::read_to_string(buffer.path())?;
        if text.trim().is_empty() {
            self.gw.prompt.notice("empty cover letter; series not sent");
            return Ok(Transition::stop());
        }

        if let Some(record) = self.workspace.registry_mut().find_by_key_mut(&first.key) {
            record.cover = Some(text.clone());
            record.touch();
        }
        self.workspace.flush()?;

        let patch_dir = self.workspace.registry().patch_dir().to_path_buf();
        let scratch = tempfile::tempdir_in(&patch_dir)?;
        let generated = self.gw.vcs.format_series_cover(members.len(), scratch.path())?;
        let template = std::fs::read_to_string(&generated)?;
        let letter = substitute_cover_body(&template, &text)
            .ok_or_else(|| FlowError::CoverTemplate(generated.display().to_string()))?;

        let target = self.workspace.registry().patch_path(&cover_name(&first.patch)?);
        std::fs::write(&target, letter)?;
        tracing::info!(group, cover = %target.display(), "cover letter written");

        let mut members = members;
        if let Some(first) = members.first_mut() {
            first.cover = Some(text);
        }
        self.review_series(&members)
    }
}
