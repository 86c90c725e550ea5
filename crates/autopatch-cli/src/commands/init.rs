use clap::Args;

use autopatch_store::Workspace;

use crate::config::{ensure_user_config, init_root, user_config_dir};

#[derive(Args)]
pub struct InitArgs {}

pub fn run(_args: InitArgs) -> anyhow::Result<()> {
    let root = init_root()?;
    let workspace = Workspace::init(&root)?;
    println!(
        "Initialized autopatch workspace in {}",
        workspace.layout().workspace_dir().display()
    );

    let config_dir = user_config_dir()?;
    if ensure_user_config(&config_dir)? {
        println!(
            "Wrote starter config to {}",
            config_dir.join("config.toml").display()
        );
    }
    Ok(())
}
