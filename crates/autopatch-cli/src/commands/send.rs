use clap::Args;

use autopatch_flow::{Payload, State};

use crate::commands::{existing_key, report};
use crate::session::Session;

#[derive(Args)]
#[group(required = true, multiple = false)]
pub struct SendArgs {
    /// Send one stored commit on its own
    #[arg(short, long)]
    key: Option<String>,
    /// Send a group as a series with a cover letter
    #[arg(short, long)]
    group: Option<u32>,
}

pub fn run(args: SendArgs) -> anyhow::Result<()> {
    let mut session = Session::open()?;
    let mut options = session.options();

    let outcome = match (args.key, args.group) {
        (Some(key), _) => {
            let key = existing_key(&session.workspace, &key)?;
            options.isolate = true;
            let mut machine = session.machine(options);
            machine.set_active(Some(key));
            machine.run(State::SetTag, Payload::None)?
        }
        (None, Some(group)) => session
            .machine(options)
            .run(State::SendGroup, Payload::Group(group))?,
        (None, None) => anyhow::bail!("nothing to send; pass --key or --group"),
    };
    report(&outcome);
    Ok(())
}
