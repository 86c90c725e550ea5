pub mod artifact;
pub mod error;
pub mod exchange;
pub mod layout;
pub mod lockfile;
pub mod registry;

pub use error::StoreError;
pub use layout::WorkspaceLayout;
pub use registry::CommitRegistry;

use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};

use autopatch_core::CommitRecord;

use crate::lockfile::WorkspaceLock;

#[derive(Debug, Default, Deserialize)]
struct WorkspaceFile {
    #[serde(default)]
    test_email: Option<String>,
    #[serde(default)]
    commits: Vec<CommitRecord>,
}

#[derive(Serialize)]
struct WorkspaceFileRef<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    test_email: Option<&'a str>,
    commits: &'a [CommitRecord],
}

/// Per-repository workflow state: the commit registry and the remembered
/// test address, loaded once and flushed explicitly.
pub struct Workspace {
    layout: WorkspaceLayout,
    registry: CommitRegistry,
    test_email: Option<String>,
}

impl Workspace {
    /// Create the workspace directories, keeping any existing state.
    pub fn init(root: &Path) -> Result<Self, StoreError> {
        let layout = WorkspaceLayout::new(root);
        layout.create_dirs()?;
        if layout.state_file().exists() {
            return Self::open(root);
        }
        let ws = Self {
            registry: CommitRegistry::new(Vec::new(), layout.patches_dir()),
            layout,
            test_email: None,
        };
        ws.flush()?;
        Ok(ws)
    }

    pub fn open(root: &Path) -> Result<Self, StoreError> {
        let layout = WorkspaceLayout::new(root);
        if !layout.is_initialized() {
            return Err(StoreError::NotAWorkspace(root.to_path_buf()));
        }
        let content = std::fs::read_to_string(layout.state_file())?;
        let file = toml::from_str::<WorkspaceFile>(&content)
            .map_err(|e| StoreError::Config(e.to_string()))?;
        tracing::debug!(commits = file.commits.len(), "loaded workspace");
        Ok(Self {
            registry: CommitRegistry::new(file.commits, layout.patches_dir()),
            layout,
            test_email: file.test_email,
        })
    }

    pub fn root(&self) -> &Path {
        self.layout.root()
    }

    pub fn layout(&self) -> &WorkspaceLayout {
        &self.layout
    }

    pub fn registry(&self) -> &CommitRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut CommitRegistry {
        &mut self.registry
    }

    pub fn test_email(&self) -> Option<&str> {
        self.test_email.as_deref()
    }

    pub fn set_test_email(&mut self, email: &str) {
        self.test_email = Some(email.to_string());
    }

    /// Write the whole workspace state to disk.
    ///
    /// The new content goes to a temporary file in the same directory that
    /// then replaces `workspace.toml`, so readers never see a partial file.
    pub fn flush(&self) -> Result<(), StoreError> {
        let target = self.layout.state_file();
        let _lock = WorkspaceLock::acquire(&target)?;

        let content = toml::to_string_pretty(&WorkspaceFileRef {
            test_email: self.test_email.as_deref(),
            commits: self.registry.list(),
        })
        .map_err(|e| StoreError::Config(e.to_string()))?;

        let mut tmp = tempfile::NamedTempFile::new_in(self.layout.workspace_dir())?;
        tmp.write_all(content.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&target).map_err(|e| StoreError::Io(e.error))?;
        tracing::trace!(path = %target.display(), "flushed workspace");
        Ok(())
    }
}
