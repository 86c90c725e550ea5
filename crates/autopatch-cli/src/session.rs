use std::path::PathBuf;

use autopatch_flow::{FlowOptions, Gateways, Machine};
use autopatch_git::{GitCli, LaunchEditor, SendEmail};
use autopatch_store::Workspace;

use crate::config::{find_repo_root, load_user_config, user_config_dir, UserConfig};
use crate::dialog::DialogPrompt;

/// An opened workspace with the real gateways wired up.
pub struct Session {
    pub workspace: Workspace,
    pub config: UserConfig,
    config_dir: PathBuf,
    pub vcs: GitCli,
    prompt: DialogPrompt,
    editor: LaunchEditor,
    mailer: SendEmail,
}

impl Session {
    pub fn open() -> anyhow::Result<Self> {
        let root = find_repo_root()?;
        let config = load_user_config()?;
        let config_dir = user_config_dir()?;
        let mut workspace = Workspace::open(&root)?;
        if workspace.test_email().is_none() {
            if let Some(email) = &config.test_email {
                workspace.set_test_email(email);
            }
        }
        tracing::debug!(root = %root.display(), "opened workspace");

        Ok(Self {
            vcs: GitCli::new(&root, config.scripts()),
            editor: LaunchEditor::from_env(&root, config.editor.clone(), config.viewer.clone()),
            mailer: SendEmail::new(&root),
            prompt: DialogPrompt::default(),
            workspace,
            config,
            config_dir,
        })
    }

    /// Options every workflow run starts from.
    pub fn options(&self) -> FlowOptions {
        FlowOptions {
            templates: self.config.resolved_templates(&self.config_dir),
            ..FlowOptions::default()
        }
    }

    pub fn machine(&mut self, options: FlowOptions) -> Machine<'_> {
        let gw = Gateways {
            vcs: &self.vcs,
            prompt: &self.prompt,
            editor: &self.editor,
            mailer: &self.mailer,
        };
        Machine::new(&mut self.workspace, gw, options)
    }
}
