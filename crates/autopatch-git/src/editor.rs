use std::path::Path;

use crate::command::{split_command, CommandRunner};
use crate::GitError;

/// Opens files for a human and blocks until the editor exits.
pub trait Editor {
    /// Open for editing; `false` if the editor exited unsuccessfully.
    fn edit(&self, path: &Path) -> Result<bool, GitError>;
    /// Open read-only for review.
    fn view(&self, path: &Path) -> Result<(), GitError>;
}

pub struct LaunchEditor {
    runner: CommandRunner,
    editor: String,
    viewer: String,
}

impl LaunchEditor {
    pub fn new(workdir: &Path, editor: String, viewer: String) -> Self {
        Self {
            runner: CommandRunner::new(workdir),
            editor,
            viewer,
        }
    }

    /// Configured commands first, then `$EDITOR`, then `vim`.
    pub fn from_env(workdir: &Path, editor: Option<String>, viewer: Option<String>) -> Self {
        let editor = editor
            .or_else(|| std::env::var("EDITOR").ok())
            .filter(|e| !e.trim().is_empty())
            .unwrap_or_else(|| "vim".to_string());
        let viewer = viewer.unwrap_or_else(|| "vim -R".to_string());
        Self::new(workdir, editor, viewer)
    }

    fn launch(&self, line: &str, path: &Path) -> Result<bool, GitError> {
        let (program, mut args) =
            split_command(line).ok_or_else(|| GitError::CommandNotFound(line.to_string()))?;
        let file = path.to_string_lossy();
        args.push(&file);
        self.runner.run_interactive_wait(program, &args)
    }
}

impl Editor for LaunchEditor {
    fn edit(&self, path: &Path) -> Result<bool, GitError> {
        self.launch(&self.editor, path)
    }

    fn view(&self, path: &Path) -> Result<(), GitError> {
        if !self.launch(&self.viewer, path)? {
            tracing::warn!(path = %path.display(), "viewer exited with failure");
        }
        Ok(())
    }
}
