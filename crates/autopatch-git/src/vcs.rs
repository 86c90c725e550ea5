use std::path::{Path, PathBuf};

use crate::command::{split_command, CommandRunner};
use crate::maintainer::{parse_maintainers, Maintainer};
use crate::GitError;

/// Result of linting one artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckReport {
    pub passed: bool,
    pub output: String,
}

/// Version-control operations the workflow needs.
///
/// Methods returning `bool` report a command that ran but failed (a
/// rejected commit, a patch that does not apply); `Err` is reserved for not
/// being able to run the command at all.
pub trait Vcs {
    /// Short working-tree status for the commit confirmation screen.
    fn status_summary(&self) -> Result<String, GitError>;
    fn stage_all(&self) -> Result<(), GitError>;
    fn reset_staged(&self) -> Result<(), GitError>;
    /// Interactive commit seeded from a message template.
    fn commit_with_template(&self, template: &Path) -> Result<bool, GitError>;
    /// Add a Signed-off-by to the last commit without opening an editor.
    fn sign_off_last(&self) -> Result<(), GitError>;
    /// Interactive amend of the last commit. With `message`, the file seeds
    /// the editor and a sign-off is added.
    fn amend(&self, message: Option<&Path>) -> Result<bool, GitError>;
    /// Format the last commit into `out_dir`, returning the artifact path.
    fn format_last(&self, out_dir: &Path) -> Result<PathBuf, GitError>;
    /// Format the last `count` commits with a cover letter into `out_dir`,
    /// returning the cover letter path.
    fn format_series_cover(&self, count: usize, out_dir: &Path) -> Result<PathBuf, GitError>;
    fn apply(&self, patch: &Path) -> Result<bool, GitError>;
    fn abort_apply(&self) -> Result<(), GitError>;
    fn commit_empty(&self, message: &Path) -> Result<bool, GitError>;
    fn check_patch(&self, patch: &Path) -> Result<CheckReport, GitError>;
    fn maintainers(&self, patches: &[PathBuf]) -> Result<Vec<Maintainer>, GitError>;
    fn last_title(&self) -> Result<String, GitError>;
    fn last_message(&self) -> Result<String, GitError>;
    fn last_short_id(&self) -> Result<String, GitError>;
    fn author_email(&self) -> Result<String, GitError>;
    /// `Name <email>` used as the mail sender.
    fn sender(&self) -> Result<String, GitError>;
    /// Subjects of commits by `author` newer than `since` (a git date
    /// expression such as `120.days.ago`).
    fn subjects_since(&self, author: &str, since: &str) -> Result<Vec<String>, GitError>;
}

/// Paths of the kernel helper scripts, relative to the repository root.
#[derive(Debug, Clone)]
pub struct Scripts {
    pub checkpatch: String,
    pub get_maintainer: String,
}

impl Default for Scripts {
    fn default() -> Self {
        Self {
            checkpatch: "./scripts/checkpatch.pl".into(),
            get_maintainer: "./scripts/get_maintainer.pl".into(),
        }
    }
}

/// [`Vcs`] backed by the `git` command line.
pub struct GitCli {
    runner: CommandRunner,
    scripts: Scripts,
}

impl GitCli {
    pub fn new(workdir: &Path, scripts: Scripts) -> Self {
        Self {
            runner: CommandRunner::new(workdir),
            scripts,
        }
    }

    pub fn runner(&self) -> &CommandRunner {
        &self.runner
    }

    fn git(&self, args: &[&str]) -> Result<String, GitError> {
        self.runner.run_capture("git", args)
    }

    fn git_ok(&self, args: &[&str]) -> Result<bool, GitError> {
        Ok(self.runner.run("git", args)?.success())
    }

    fn script(&self, line: &str, extra: &[&str]) -> Result<crate::CommandOutput, GitError> {
        let (program, mut args) =
            split_command(line).ok_or_else(|| GitError::CommandNotFound(line.to_string()))?;
        args.extend_from_slice(extra);
        self.runner.run(program, &args)
    }
}

fn path_str(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

impl Vcs for GitCli {
    fn status_summary(&self) -> Result<String, GitError> {
        self.git(&["status", "--short"])
    }

    fn stage_all(&self) -> Result<(), GitError> {
        self.git(&["add", "./"]).map(|_| ())
    }

    fn reset_staged(&self) -> Result<(), GitError> {
        self.git(&["reset", "HEAD"]).map(|_| ())
    }

    fn commit_with_template(&self, template: &Path) -> Result<bool, GitError> {
        let template = path_str(template);
        self.runner
            .run_interactive_wait("git", &["commit", "-t", &template])
    }

    fn sign_off_last(&self) -> Result<(), GitError> {
        self.git(&["commit", "-s", "--amend", "--no-edit"]).map(|_| ())
    }

    fn amend(&self, message: Option<&Path>) -> Result<bool, GitError> {
        match message {
            Some(file) => {
                let file = path_str(file);
                self.runner.run_interactive_wait(
                    "git",
                    &["commit", "--amend", "-s", "--edit", "-F", &file],
                )
            }
            None => self.runner.run_interactive_wait("git", &["commit", "--amend"]),
        }
    }

    fn format_last(&self, out_dir: &Path) -> Result<PathBuf, GitError> {
        let dir = path_str(out_dir);
        let out = self.git(&["format-patch", "-1", "-o", &dir])?;
        let line = out.lines().last().unwrap_or("").trim();
        if line.is_empty() {
            return Err(GitError::UnexpectedOutput {
                command: "git format-patch -1".into(),
                output: out,
            });
        }
        Ok(self.runner.workdir().join(line))
    }

    fn format_series_cover(&self, count: usize, out_dir: &Path) -> Result<PathBuf, GitError> {
        let dir = path_str(out_dir);
        let range = format!("-{count}");
        self.git(&["format-patch", "--cover-letter", "-s", &range, "-o", &dir])?;
        let cover = out_dir.join("0000-cover-letter.patch");
        if !cover.exists() {
            return Err(GitError::UnexpectedOutput {
                command: "git format-patch --cover-letter".into(),
                output: format!("{} not written", cover.display()),
            });
        }
        Ok(cover)
    }

    fn apply(&self, patch: &Path) -> Result<bool, GitError> {
        self.git_ok(&["am", &path_str(patch)])
    }

    fn abort_apply(&self) -> Result<(), GitError> {
        self.runner.run("git", &["am", "--abort"]).map(|_| ())
    }

    fn commit_empty(&self, message: &Path) -> Result<bool, GitError> {
        self.git_ok(&["commit", "--allow-empty", "-F", &path_str(message)])
    }

    fn check_patch(&self, patch: &Path) -> Result<CheckReport, GitError> {
        let out = self.script(&self.scripts.checkpatch, &[&path_str(patch)])?;
        Ok(CheckReport {
            passed: out.success(),
            output: out.output,
        })
    }

    fn maintainers(&self, patches: &[PathBuf]) -> Result<Vec<Maintainer>, GitError> {
        let paths: Vec<String> = patches.iter().map(|p| path_str(p)).collect();
        let args: Vec<&str> = paths.iter().map(String::as_str).collect();
        let out = self.script(&self.scripts.get_maintainer, &args)?;
        if !out.success() {
            tracing::warn!(status = out.status_code, "get_maintainer failed");
            return Ok(Vec::new());
        }
        Ok(parse_maintainers(&out.output))
    }

    fn last_title(&self) -> Result<String, GitError> {
        self.git(&["log", "-1", "--format=%s"])
    }

    fn last_message(&self) -> Result<String, GitError> {
        self.git(&["log", "-1", "--format=%B"])
    }

    fn last_short_id(&self) -> Result<String, GitError> {
        self.git(&["log", "-1", "--format=%h"])
    }

    fn author_email(&self) -> Result<String, GitError> {
        self.git(&["config", "user.email"])
    }

    fn sender(&self) -> Result<String, GitError> {
        let name = self.git(&["config", "user.name"])?;
        let email = self.author_email()?;
        Ok(format!("{name} <{email}>"))
    }

    fn subjects_since(&self, author: &str, since: &str) -> Result<Vec<String>, GitError> {
        let author = format!("--author={author}");
        let since = format!("--since={since}");
        let out = self.git(&["log", "--format=%s", &author, &since])?;
        Ok(out.lines().map(str::to_string).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use autopatch_core::artifact::commit_message;

    fn git_available() -> bool {
        std::process::Command::new("git")
            .arg("--version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    fn init_repo(dir: &Path) -> GitCli {
        let cli = GitCli::new(dir, Scripts::default());
        cli.git(&["init", "-q"]).unwrap();
        cli.git(&["config", "user.name", "Dev"]).unwrap();
        cli.git(&["config", "user.email", "dev@example.com"]).unwrap();
        cli.git(&["config", "commit.gpgsign", "false"]).unwrap();
        cli
    }

    #[test]
    fn formats_and_reads_back_last_commit() {
        if !git_available() {
            return;
        }
        let tmp = tempfile::tempdir().unwrap();
        let cli = init_repo(tmp.path());
        std::fs::write(tmp.path().join("a.txt"), "one\n").unwrap();
        cli.stage_all().unwrap();
        cli.git(&["commit", "-q", "-m", "a: add file", "-m", "Longer body."])
            .unwrap();
        cli.sign_off_last().unwrap();

        assert_eq!(cli.last_title().unwrap(), "a: add file");
        assert_eq!(cli.sender().unwrap(), "Dev <dev@example.com>");
        assert!(cli.last_message().unwrap().contains("Signed-off-by: Dev"));

        let out = tmp.path().join("out");
        let patch = cli.format_last(&out).unwrap();
        assert!(patch.exists());
        let text = std::fs::read_to_string(&patch).unwrap();
        let message = commit_message(&text).unwrap();
        assert!(message.starts_with("a: add file\n\nLonger body."));

        let subjects = cli.subjects_since("dev@example.com", "1.day.ago").unwrap();
        assert_eq!(subjects, ["a: add file"]);
    }

    #[test]
    fn failed_apply_is_reported_not_raised() {
        if !git_available() {
            return;
        }
        let tmp = tempfile::tempdir().unwrap();
        let cli = init_repo(tmp.path());
        std::fs::write(tmp.path().join("a.txt"), "one\n").unwrap();
        cli.stage_all().unwrap();
        cli.git(&["commit", "-q", "-m", "init"]).unwrap();

        let bogus = tmp.path().join("bogus.patch");
        std::fs::write(&bogus, "not a patch\n").unwrap();
        assert!(!cli.apply(&bogus).unwrap());
        cli.abort_apply().unwrap();
    }
}
