pub mod commit;
pub mod init;
pub mod log;
pub mod send;

use clap::Subcommand;

use autopatch_core::{CommitKey, Status};
use autopatch_flow::Outcome;
use autopatch_store::Workspace;

#[derive(Subcommand)]
pub enum Commands {
    /// Create the workspace and a starter user config
    Init(init::InitArgs),
    /// Commit the working tree and walk it through review and send
    Commit(commit::CommitArgs),
    /// Send a stored commit or a patch series
    Send(send::SendArgs),
    /// Show and maintain the commit registry
    Log(log::LogArgs),
}

impl Commands {
    pub fn run(self) -> anyhow::Result<()> {
        match self {
            Commands::Init(args) => init::run(args),
            Commands::Commit(args) => commit::run(args),
            Commands::Send(args) => send::run(args),
            Commands::Log(args) => log::run(args),
        }
    }
}

/// Parse a key and make sure the workspace knows it.
pub(crate) fn existing_key(workspace: &Workspace, key: &str) -> anyhow::Result<CommitKey> {
    let key = CommitKey::parse(key)?;
    if workspace.registry().find_by_key(&key).is_none() {
        anyhow::bail!("no commit with key {key}");
    }
    Ok(key)
}

/// Tell the user where a workflow run ended.
pub(crate) fn report(outcome: &Outcome) {
    match outcome.status {
        Some(Status::Finish) => println!("Finished."),
        Some(status) if !status.is_terminal() => {
            println!("Paused at {status}. Run `autopatch commit -c` to continue.");
        }
        _ => tracing::debug!(state = %outcome.state, "stopped"),
    }
}
