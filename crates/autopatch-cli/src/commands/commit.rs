use clap::Args;

use autopatch_flow::{Payload, State};
use autopatch_git::Vcs;

use crate::commands::report;
use crate::session::Session;

#[derive(Args)]
pub struct CommitArgs {
    /// Continue the unfinished workflow of the last commit
    #[arg(short = 'c', long = "continue")]
    resume: bool,
    /// Add the commit to a patch series
    #[arg(short, long, conflicts_with = "resume")]
    group: Option<u32>,
}

pub fn run(args: CommitArgs) -> anyhow::Result<()> {
    let mut session = Session::open()?;

    if args.resume {
        let title = session.vcs.last_title()?;
        let options = session.options();
        let outcome = session.machine(options).resume(&title)?;
        report(&outcome);
        return Ok(());
    }

    let mut options = session.options();
    options.group = args.group;
    let outcome = session
        .machine(options)
        .run(State::ConfirmCommit, Payload::None)?;
    report(&outcome);
    Ok(())
}
