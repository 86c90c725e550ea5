use clap::Args;

use autopatch_core::{CommitRecord, Status};
use autopatch_flow::maintenance::update_applied;
use autopatch_flow::{Payload, State};
use autopatch_store::exchange::{export_commits, import_commits, EXPORT_FILE};

use crate::commands::{existing_key, report};
use crate::output::{commit_table, format_timestamp, kv};
use crate::session::Session;

#[derive(Args)]
pub struct LogArgs {
    /// Only records of this group; also narrows --export
    #[arg(short, long)]
    group: Option<u32>,
    /// Show one record; also narrows --export
    #[arg(short, long)]
    key: Option<String>,
    /// Output as JSON
    #[arg(long)]
    json: bool,
    /// Write records to autopatch-export.json
    #[arg(short = 'o', long)]
    export: bool,
    /// Merge records from autopatch-export.json
    #[arg(short, long)]
    import: bool,
    /// Drop every record
    #[arg(short, long)]
    clear: bool,
    /// Delete a record and its artifact
    #[arg(short, long, value_name = "KEY")]
    delete: Option<String>,
    /// Mark records merged upstream as applied
    #[arg(short, long)]
    update: bool,
    /// Reopen a record for re-commit
    #[arg(long, value_name = "KEY")]
    open: Option<String>,
    /// Rename a record
    #[arg(long, num_args = 2, value_names = ["KEY", "TITLE"])]
    title: Option<Vec<String>>,
    /// Rebuild a record's commit on the current branch
    #[arg(short, long, value_name = "KEY")]
    restore: Option<String>,
    /// With --restore or --clone, only recreate the commit message
    #[arg(long)]
    no_content: bool,
    /// Copy a record under a new key and restore the copy
    #[arg(long, value_name = "KEY")]
    clone: Option<String>,
    /// Start a new version of a record and restore it
    #[arg(short = 'n', long = "new", value_name = "KEY")]
    new_version: Option<String>,
}

pub fn run(args: LogArgs) -> anyhow::Result<()> {
    let mut session = Session::open()?;

    if let Some(key) = &args.restore {
        let key = existing_key(&session.workspace, key)?;
        let mut options = session.options();
        options.no_content = args.no_content;
        let mut machine = session.machine(options);
        machine.set_active(Some(key));
        report(&machine.run(State::Restore, Payload::None)?);
        return Ok(());
    }
    if let Some(key) = &args.clone {
        let key = existing_key(&session.workspace, key)?;
        let mut options = session.options();
        options.no_content = args.no_content;
        let mut machine = session.machine(options);
        let outcome = machine.run(State::Clone, Payload::Key(key))?;
        if let Some(clone) = machine.active_key() {
            println!("Cloned as {clone}");
        }
        report(&outcome);
        return Ok(());
    }
    if let Some(key) = &args.new_version {
        let key = existing_key(&session.workspace, key)?;
        let options = session.options();
        report(&session.machine(options).run(State::NewVersion, Payload::Key(key))?);
        return Ok(());
    }

    let workspace = &mut session.workspace;

    if args.clear {
        let count = workspace.registry().list().len();
        workspace.registry_mut().clear();
        workspace.flush()?;
        println!("Cleared {count} records");
        return Ok(());
    }
    if let Some(key) = &args.delete {
        let key = existing_key(workspace, key)?;
        workspace.registry_mut().delete(&key)?;
        workspace.flush()?;
        println!("Deleted {key}");
        return Ok(());
    }
    if let Some(key) = &args.open {
        let key = existing_key(workspace, key)?;
        if let Some(record) = workspace.registry_mut().find_by_key_mut(&key) {
            record.status = Status::ReCommit;
            record.touch();
        }
        workspace.flush()?;
        println!("Reopened {key} at {}", Status::ReCommit);
        return Ok(());
    }
    if let Some(pair) = &args.title {
        let [key, title] = pair.as_slice() else {
            anyhow::bail!("--title takes a key and a title");
        };
        let key = existing_key(workspace, key)?;
        if let Some(record) = workspace.registry_mut().find_by_key_mut(&key) {
            record.title = title.clone();
            record.touch();
        }
        workspace.flush()?;
        println!("Renamed {key}");
        return Ok(());
    }
    if args.update {
        let updated = update_applied(workspace, &session.vcs)?;
        println!("Update finished, following commits updated:");
        if updated.is_empty() {
            println!("None");
        }
        for title in updated {
            println!("{title}");
        }
        return Ok(());
    }

    let export_path = std::env::current_dir()?.join(EXPORT_FILE);
    if args.import {
        let count = import_commits(workspace.registry_mut(), &export_path)?;
        workspace.flush()?;
        println!("Imported {count} records from {}", export_path.display());
        return Ok(());
    }

    let selected: Vec<&CommitRecord> = match (&args.key, args.group) {
        (Some(key), _) => {
            let key = existing_key(workspace, key)?;
            workspace.registry().find_by_key(&key).into_iter().collect()
        }
        (None, Some(group)) => workspace.registry().find_group(group),
        (None, None) => workspace.registry().list().iter().collect(),
    };

    if args.export {
        let count = export_commits(workspace.registry(), &selected, &export_path)?;
        println!("Exported {count} records to {}", export_path.display());
        return Ok(());
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&selected)?);
    } else if let (Some(_), [record]) = (&args.key, selected.as_slice()) {
        print_record(record);
    } else {
        print!("{}", commit_table(&selected));
    }
    Ok(())
}

fn print_record(record: &CommitRecord) {
    println!("{}", kv("key", record.key.as_str()));
    println!("{}", kv("title", &record.title));
    println!("{}", kv("status", record.status.as_str()));
    println!("{}", kv("version", &format!("v{}", record.version)));
    println!("{}", kv("group", &format!("{} (order {})", record.group, record.order)));
    if let Some(tag) = &record.tag {
        println!("{}", kv("tag", tag));
    }
    println!("{}", kv("patch", &record.patch));
    println!("{}", kv("created", &format_timestamp(record.created_at_ms)));
    println!("{}", kv("updated", &format_timestamp(record.updated_at_ms)));
    if let Some(cover) = &record.cover {
        println!();
        for line in cover.lines() {
            println!("    {line}");
        }
    }
}
