use std::path::{Path, PathBuf};

use crate::StoreError;

pub const WORKSPACE_DIR: &str = ".autopatch";
pub const STATE_FILE: &str = "workspace.toml";

#[derive(Debug, Clone)]
pub struct WorkspaceLayout {
    root: PathBuf,
}

impl WorkspaceLayout {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn workspace_dir(&self) -> PathBuf {
        self.root.join(WORKSPACE_DIR)
    }

    pub fn state_file(&self) -> PathBuf {
        self.workspace_dir().join(STATE_FILE)
    }

    /// Whether `root` holds an initialized workspace. A bare `.autopatch`
    /// directory is not enough; the per-user config lives under the same
    /// name in the home directory.
    pub fn is_initialized(&self) -> bool {
        self.state_file().is_file()
    }

    pub fn patches_dir(&self) -> PathBuf {
        self.workspace_dir().join("patches")
    }

    pub fn create_dirs(&self) -> Result<(), StoreError> {
        std::fs::create_dir_all(self.patches_dir())?;
        Ok(())
    }
}
