use std::path::{Path, PathBuf};

use crate::command::CommandRunner;
use crate::GitError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mail {
    pub from: String,
    pub to: Vec<String>,
    pub cc: Vec<String>,
    pub patches: Vec<PathBuf>,
}

impl Mail {
    fn args(&self) -> Vec<String> {
        let mut args = vec!["send-email".to_string(), "--from".to_string(), self.from.clone()];
        for to in &self.to {
            args.push("--to".into());
            args.push(to.clone());
        }
        for cc in &self.cc {
            args.push("--cc".into());
            args.push(cc.clone());
        }
        args.extend(self.patches.iter().map(|p| p.to_string_lossy().to_string()));
        args
    }
}

pub trait Mailer {
    /// Deliver the artifacts; `false` when the sender exits unsuccessfully.
    fn send(&self, mail: &Mail) -> Result<bool, GitError>;
}

/// [`Mailer`] running `git send-email` attached to the terminal, so its
/// confirmation prompts reach the user.
pub struct SendEmail {
    runner: CommandRunner,
}

impl SendEmail {
    pub fn new(workdir: &Path) -> Self {
        Self {
            runner: CommandRunner::new(workdir),
        }
    }
}

impl Mailer for SendEmail {
    fn send(&self, mail: &Mail) -> Result<bool, GitError> {
        let args = mail.args();
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        tracing::info!(to = ?mail.to, cc = ?mail.cc, patches = mail.patches.len(), "sending");
        self.runner.run_interactive_wait("git", &args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_flag_per_recipient() {
        let mail = Mail {
            from: "Dev <dev@example.com>".into(),
            to: vec!["a@x.org".into(), "b@x.org".into()],
            cc: vec!["list@x.org".into()],
            patches: vec![PathBuf::from("p/0001.patch")],
        };
        assert_eq!(
            mail.args(),
            [
                "send-email",
                "--from",
                "Dev <dev@example.com>",
                "--to",
                "a@x.org",
                "--to",
                "b@x.org",
                "--cc",
                "list@x.org",
                "p/0001.patch"
            ]
        );
    }
}
