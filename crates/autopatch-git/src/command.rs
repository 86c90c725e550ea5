//! Blocking process execution.
//!
//! Every external tool the workflow touches (git, the kernel lint and
//! maintainer scripts, editors, send-email) goes through [`CommandRunner`].

use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};

use crate::GitError;

#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub status_code: i32,
    /// stdout followed by stderr.
    pub output: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.status_code == 0
    }
}

#[derive(Debug, Clone)]
pub struct CommandRunner {
    workdir: PathBuf,
}

impl CommandRunner {
    pub fn new(workdir: &Path) -> Self {
        Self {
            workdir: workdir.to_path_buf(),
        }
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    fn command(&self, program: &str, args: &[&str]) -> Command {
        let mut cmd = Command::new(program);
        cmd.args(args).current_dir(&self.workdir);
        cmd
    }

    fn map_spawn_error(program: &str, e: std::io::Error) -> GitError {
        if e.kind() == std::io::ErrorKind::NotFound {
            GitError::CommandNotFound(program.to_string())
        } else {
            GitError::Io(e)
        }
    }

    /// Run to completion and return the exit status with combined output.
    pub fn run(&self, program: &str, args: &[&str]) -> Result<CommandOutput, GitError> {
        tracing::debug!(program, ?args, "run");
        let output = self
            .command(program, args)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| Self::map_spawn_error(program, e))?;

        let mut text = String::from_utf8_lossy(&output.stdout).to_string();
        text.push_str(&String::from_utf8_lossy(&output.stderr));
        Ok(CommandOutput {
            status_code: output.status.code().unwrap_or(-1),
            output: text,
        })
    }

    /// Run to completion and return trimmed stdout; a nonzero exit is an
    /// error.
    pub fn run_capture(&self, program: &str, args: &[&str]) -> Result<String, GitError> {
        tracing::debug!(program, ?args, "run_capture");
        let output = self
            .command(program, args)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| Self::map_spawn_error(program, e))?;

        if !output.status.success() {
            return Err(GitError::CommandFailed {
                command: format!("{program} {}", args.join(" ")),
                status: output.status.code().unwrap_or(-1),
                output: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    /// Spawn attached to the terminal; the caller waits on the child.
    pub fn run_interactive(&self, program: &str, args: &[&str]) -> Result<Child, GitError> {
        tracing::debug!(program, ?args, "run_interactive");
        self.command(program, args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| Self::map_spawn_error(program, e))
    }

    /// Spawn attached to the terminal and report whether it exited cleanly.
    pub fn run_interactive_wait(&self, program: &str, args: &[&str]) -> Result<bool, GitError> {
        let mut child = self.run_interactive(program, args)?;
        Ok(child.wait()?.success())
    }
}

/// Split a configured command line such as `perl scripts/checkpatch.pl
/// --strict` into program and leading arguments.
pub fn split_command(line: &str) -> Option<(&str, Vec<&str>)> {
    let mut parts = line.split_whitespace();
    let program = parts.next()?;
    Some((program, parts.collect()))
}
