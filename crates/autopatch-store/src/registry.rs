use std::collections::HashSet;
use std::path::{Path, PathBuf};

use autopatch_core::artifact::clone_name;
use autopatch_core::{now_ms, CommitKey, CommitRecord, Status};

use crate::StoreError;

/// Ordered collection of tracked commits plus the directory holding their
/// patch artifacts.
///
/// Mutations only touch memory and artifact files; callers persist with
/// [`crate::Workspace::flush`].
#[derive(Debug, Clone)]
pub struct CommitRegistry {
    commits: Vec<CommitRecord>,
    patch_dir: PathBuf,
}

impl CommitRegistry {
    pub fn new(commits: Vec<CommitRecord>, patch_dir: PathBuf) -> Self {
        Self { commits, patch_dir }
    }

    /// All records in insertion order.
    pub fn list(&self) -> &[CommitRecord] {
        &self.commits
    }

    pub fn is_empty(&self) -> bool {
        self.commits.is_empty()
    }

    pub fn patch_dir(&self) -> &Path {
        &self.patch_dir
    }

    pub fn patch_path(&self, name: &str) -> PathBuf {
        self.patch_dir.join(name)
    }

    /// Artifact path of a record, if it has been formatted.
    pub fn artifact_path(&self, record: &CommitRecord) -> Option<PathBuf> {
        if record.patch.is_empty() {
            None
        } else {
            Some(self.patch_path(&record.patch))
        }
    }

    pub fn add(
        &mut self,
        title: &str,
        key: CommitKey,
        group: u32,
        order: u32,
    ) -> Result<&mut CommitRecord, StoreError> {
        if self.find_by_key(&key).is_some() {
            return Err(StoreError::DuplicateKey(key));
        }
        if group != 0 && self.commits.iter().any(|c| c.group == group && c.order == order) {
            return Err(StoreError::OrderCollision { group, order });
        }
        tracing::info!(key = %key, group, order, "adding commit");
        self.commits.push(CommitRecord::new(title, key, group, order));
        let last = self.commits.len() - 1;
        Ok(&mut self.commits[last])
    }

    pub fn find_by_key(&self, key: &CommitKey) -> Option<&CommitRecord> {
        self.commits.iter().find(|c| &c.key == key)
    }

    pub fn find_by_key_mut(&mut self, key: &CommitKey) -> Option<&mut CommitRecord> {
        self.commits.iter_mut().find(|c| &c.key == key)
    }

    /// Records with this title that can still be continued. More than one
    /// match is an ambiguity the caller has to report.
    pub fn find_unterminated_by_title(&self, title: &str) -> Vec<&CommitRecord> {
        self.commits
            .iter()
            .filter(|c| c.title == title && !c.status.is_terminal())
            .collect()
    }

    /// Members of a group sorted by `order`.
    pub fn find_group(&self, group: u32) -> Vec<&CommitRecord> {
        let mut members: Vec<&CommitRecord> =
            self.commits.iter().filter(|c| c.group == group).collect();
        members.sort_by_key(|c| c.order);
        members
    }

    pub fn max_order(&self, group: u32) -> u32 {
        self.commits
            .iter()
            .filter(|c| c.group == group)
            .map(|c| c.order)
            .max()
            .unwrap_or(0)
    }

    /// Remove a record together with its artifact.
    ///
    /// A missing key is not an error. If the artifact cannot be removed the
    /// record is kept and the error returned; an artifact that is already
    /// gone is only logged.
    pub fn delete(&mut self, key: &CommitKey) -> Result<Option<CommitRecord>, StoreError> {
        let Some(pos) = self.commits.iter().position(|c| &c.key == key) else {
            return Ok(None);
        };
        if let Some(path) = self.artifact_path(&self.commits[pos]) {
            match std::fs::remove_file(&path) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    tracing::warn!(path = %path.display(), "artifact already missing");
                }
                Err(e) => return Err(e.into()),
            }
        }
        tracing::info!(key = %key, "deleted commit");
        Ok(Some(self.commits.remove(pos)))
    }

    /// Copy a record under `new_key` with its own artifact file.
    pub fn clone_record(
        &mut self,
        key: &CommitKey,
        new_key: CommitKey,
    ) -> Result<&mut CommitRecord, StoreError> {
        if self.find_by_key(&new_key).is_some() {
            return Err(StoreError::DuplicateKey(new_key));
        }
        let source = self
            .find_by_key(key)
            .ok_or_else(|| StoreError::NotFound(key.clone()))?;
        if source.patch.is_empty() {
            return Err(StoreError::NoArtifact(key.clone()));
        }

        let patch = clone_name(&source.patch, new_key.as_str())?;
        std::fs::copy(self.patch_path(&source.patch), self.patch_path(&patch))?;

        let now = now_ms();
        let mut clone = source.clone();
        clone.key = new_key;
        clone.version = 1;
        clone.created_at_ms = now;
        clone.updated_at_ms = now;
        clone.patch = patch;

        tracing::info!(from = %key, to = %clone.key, "cloned commit");
        self.commits.push(clone);
        let last = self.commits.len() - 1;
        Ok(&mut self.commits[last])
    }

    pub fn finish_group(&mut self, group: u32) -> usize {
        let mut count = 0;
        for c in self.commits.iter_mut().filter(|c| c.group == group) {
            c.status = Status::Finish;
            count += 1;
        }
        count
    }

    /// Drop every record. Artifacts stay on disk.
    pub fn clear(&mut self) {
        self.commits.clear();
    }

    /// Mark records whose title appears in `subjects` as applied upstream.
    /// Returns the titles that changed.
    pub fn mark_applied(&mut self, subjects: &[String]) -> Vec<String> {
        let subjects: HashSet<&str> = subjects.iter().map(String::as_str).collect();
        let mut updated = Vec::new();
        for c in self.commits.iter_mut() {
            if c.status != Status::Applied && subjects.contains(c.title.as_str()) {
                c.status = Status::Applied;
                updated.push(c.title.clone());
            }
        }
        updated
    }

    /// Take in a record from another workspace. Keys already present are
    /// refused. A group order or artifact name that is already taken is
    /// moved aside: the order to the end of the group, the artifact to a
    /// key-suffixed name. Returns the artifact name the record ended up with.
    pub(crate) fn push_imported(
        &mut self,
        mut record: CommitRecord,
    ) -> Result<Option<String>, StoreError> {
        if self.find_by_key(&record.key).is_some() {
            return Ok(None);
        }
        let group = record.group;
        if group != 0
            && self
                .commits
                .iter()
                .any(|c| c.group == group && c.order == record.order)
        {
            let order = self.max_order(group) + 1;
            tracing::warn!(
                key = %record.key,
                group,
                from = record.order,
                to = order,
                "renumbering imported commit"
            );
            record.order = order;
        }
        if !record.patch.is_empty() && self.commits.iter().any(|c| c.patch == record.patch) {
            record.patch = clone_name(&record.patch, record.key.as_str())?;
        }
        let patch = record.patch.clone();
        self.commits.push(record);
        Ok(Some(patch))
    }
}
