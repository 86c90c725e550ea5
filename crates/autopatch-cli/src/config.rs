use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Context;
use autopatch_flow::Template;
use autopatch_git::Scripts;
use autopatch_store::layout::{WorkspaceLayout, WORKSPACE_DIR};

/// Find the workspace root by walking up from the current directory.
pub fn find_repo_root() -> anyhow::Result<PathBuf> {
    let start = std::env::current_dir()?;
    find_workspace(&start, dirs::home_dir().as_deref()).ok_or_else(|| {
        anyhow::anyhow!("not in an autopatch workspace (no {WORKSPACE_DIR} directory found); run `autopatch init`")
    })
}

/// Nearest ancestor of `start` holding an initialized workspace. The walk
/// stops below `home`, whose `.autopatch` is the user config directory.
fn find_workspace(start: &Path, home: Option<&Path>) -> Option<PathBuf> {
    let mut dir = start.to_path_buf();
    loop {
        if home == Some(dir.as_path()) {
            return None;
        }
        if WorkspaceLayout::new(&dir).is_initialized() {
            return Some(dir);
        }
        if !dir.pop() {
            return None;
        }
    }
}

/// Where `init` should create the workspace: the enclosing git checkout,
/// else the current directory. The home directory itself is refused.
pub fn init_root() -> anyhow::Result<PathBuf> {
    let start = std::env::current_dir()?;
    let root = find_marker(&start, ".git").unwrap_or(start);
    check_init_root(&root, dirs::home_dir().as_deref())?;
    Ok(root)
}

fn check_init_root(root: &Path, home: Option<&Path>) -> anyhow::Result<()> {
    if home == Some(root) {
        anyhow::bail!(
            "refusing to create a workspace in the home directory; {} there holds the user config",
            WORKSPACE_DIR
        );
    }
    Ok(())
}

fn find_marker(start: &Path, marker: &str) -> Option<PathBuf> {
    let mut dir = start.to_path_buf();
    loop {
        if dir.join(marker).exists() {
            return Some(dir);
        }
        if !dir.pop() {
            return None;
        }
    }
}

/// Per-user settings in `~/.autopatch/config.toml`.
#[derive(serde::Serialize, serde::Deserialize, Default, Clone, Debug, PartialEq)]
pub struct UserConfig {
    /// Commit message templates by name. Relative paths resolve against
    /// the config directory.
    #[serde(default)]
    pub templates: BTreeMap<String, PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkpatch: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub get_maintainer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub editor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub viewer: Option<String>,
    /// Seeds a workspace's test address when it has none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_email: Option<String>,
}

impl UserConfig {
    pub fn scripts(&self) -> Scripts {
        let defaults = Scripts::default();
        Scripts {
            checkpatch: self.checkpatch.clone().unwrap_or(defaults.checkpatch),
            get_maintainer: self.get_maintainer.clone().unwrap_or(defaults.get_maintainer),
        }
    }

    pub fn resolved_templates(&self, config_dir: &Path) -> Vec<Template> {
        self.templates
            .iter()
            .map(|(name, path)| Template {
                name: name.clone(),
                path: if path.is_absolute() {
                    path.clone()
                } else {
                    config_dir.join(path)
                },
            })
            .collect()
    }
}

fn home_dir() -> anyhow::Result<PathBuf> {
    dirs::home_dir().ok_or_else(|| anyhow::anyhow!("could not find home directory"))
}

pub fn user_config_dir() -> anyhow::Result<PathBuf> {
    Ok(home_dir()?.join(WORKSPACE_DIR))
}

pub fn user_config_path() -> anyhow::Result<PathBuf> {
    Ok(user_config_dir()?.join("config.toml"))
}

pub fn load_user_config_from(path: &Path) -> anyhow::Result<UserConfig> {
    if !path.exists() {
        return Ok(UserConfig::default());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))
}

pub fn load_user_config() -> anyhow::Result<UserConfig> {
    load_user_config_from(&user_config_path()?)
}

pub fn save_user_config_to(path: &Path, config: &UserConfig) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}

pub const DEFAULT_TEMPLATE: &str = "subsys: short summary\n\
\n\
Describe the problem and how this change fixes it.\n\
\n\
Fixes: \n";

/// Write a starter config with one template unless a config already
/// exists. Returns whether anything was written.
pub fn ensure_user_config(dir: &Path) -> anyhow::Result<bool> {
    let path = dir.join("config.toml");
    if path.exists() {
        return Ok(false);
    }
    let template = dir.join("templates").join("default.txt");
    if let Some(parent) = template.parent() {
        std::fs::create_dir_all(parent)?;
    }
    if !template.exists() {
        std::fs::write(&template, DEFAULT_TEMPLATE)?;
    }
    let mut config = UserConfig::default();
    config
        .templates
        .insert("default".into(), PathBuf::from("templates/default.txt"));
    save_user_config_to(&path, &config)?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_config_is_default() {
        let tmp = tempfile::tempdir().unwrap();
        let config = load_user_config_from(&tmp.path().join("config.toml")).unwrap();
        assert_eq!(config, UserConfig::default());
        assert_eq!(config.scripts().checkpatch, "./scripts/checkpatch.pl");
    }

    #[test]
    fn starter_config_round_trips() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(ensure_user_config(tmp.path()).unwrap());
        assert!(!ensure_user_config(tmp.path()).unwrap());

        let config = load_user_config_from(&tmp.path().join("config.toml")).unwrap();
        let templates = config.resolved_templates(tmp.path());
        assert_eq!(templates.len(), 1);
        assert_eq!(templates[0].name, "default");
        assert!(templates[0].path.exists());
    }

    #[test]
    fn parses_script_overrides() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(
            &path,
            "checkpatch = \"perl scripts/checkpatch.pl --strict\"\ntest_email = \"me@example.com\"\n\n[templates]\nnet = \"/srv/net.txt\"\n",
        )
        .unwrap();
        let config = load_user_config_from(&path).unwrap();
        assert_eq!(config.scripts().checkpatch, "perl scripts/checkpatch.pl --strict");
        assert_eq!(config.scripts().get_maintainer, "./scripts/get_maintainer.pl");
        assert_eq!(config.test_email.as_deref(), Some("me@example.com"));
        assert_eq!(
            config.resolved_templates(tmp.path())[0].path,
            PathBuf::from("/srv/net.txt")
        );
    }

    #[test]
    fn finds_marker_in_ancestors() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(tmp.path().join(".git")).unwrap();
        let nested = tmp.path().join("drivers").join("net");
        std::fs::create_dir_all(&nested).unwrap();
        assert_eq!(find_marker(&nested, ".git").unwrap(), tmp.path());
        assert!(find_marker(&nested, ".no-such-marker").is_none());
    }

    #[test]
    fn finds_initialized_workspace_in_ancestors() {
        let tmp = tempfile::tempdir().unwrap();
        let repo = tmp.path().join("linux");
        autopatch_store::Workspace::init(&repo).unwrap();
        let nested = repo.join("drivers").join("net");
        std::fs::create_dir_all(&nested).unwrap();
        assert_eq!(find_workspace(&nested, None).unwrap(), repo);
    }

    #[test]
    fn user_config_dir_is_not_a_workspace() {
        let home = tempfile::tempdir().unwrap();
        ensure_user_config(&home.path().join(WORKSPACE_DIR)).unwrap();
        let checkout = home.path().join("src").join("linux").join("drivers");
        std::fs::create_dir_all(&checkout).unwrap();

        assert!(find_workspace(&checkout, Some(home.path())).is_none());
        // Even without knowing the home directory, a config-only
        // .autopatch has no state file.
        assert!(find_workspace(&checkout, None).is_none());
    }

    #[test]
    fn walk_stops_at_home() {
        let home = tempfile::tempdir().unwrap();
        autopatch_store::Workspace::init(home.path()).unwrap();
        let checkout = home.path().join("src");
        std::fs::create_dir_all(&checkout).unwrap();
        assert!(find_workspace(&checkout, Some(home.path())).is_none());
        assert!(check_init_root(home.path(), Some(home.path())).is_err());
        assert!(check_init_root(&checkout, Some(home.path())).is_ok());
    }
}
