pub mod command;
pub mod editor;
pub mod error;
pub mod mail;
pub mod maintainer;
pub mod vcs;

pub use command::{CommandOutput, CommandRunner};
pub use editor::{Editor, LaunchEditor};
pub use error::GitError;
pub use mail::{Mail, Mailer, SendEmail};
pub use maintainer::Maintainer;
pub use vcs::{CheckReport, GitCli, Scripts, Vcs};
