//! Configuration management for Stobo
//!
//! Uses XDG-compliant paths:
//! - Config: ~/.config/stobo/config.toml
//! - Data: ~/.local/share/stobo/

mod paths;

pub use paths::{collapse_home, expand_home, Paths};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::sync::RwLock;

/// Number of entries kept in the recent workspaces list
pub const MAX_RECENT_WORKSPACES: usize = 10;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Game installation directory (may start with `~`)
    pub game_dir: Option<String>,

    /// Recently opened workspaces, most recent first
    pub recent_workspaces: Vec<String>,

    /// Add-on discovery settings
    pub addons: AddonsConfig,

    /// Deployment settings
    pub deployment: DeploymentConfig,

    /// Paths configuration
    #[serde(skip)]
    pub paths: Paths,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            game_dir: None,
            recent_workspaces: Vec::new(),
            addons: AddonsConfig::default(),
            deployment: DeploymentConfig::default(),
            paths: Paths::new(),
        }
    }
}

/// How add-on archives and their manifests are recognised in a workspace
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AddonsConfig {
    /// Archive file extension, without the dot
    pub archive_extension: String,

    /// Sidecar manifest extension, without the dot
    pub manifest_extension: String,

    /// Extended attribute prefix used when no sidecar manifest exists
    pub xattr_prefix: String,
}

impl Default for AddonsConfig {
    fn default() -> Self {
        Self {
            archive_extension: "vpk".to_string(),
            manifest_extension: "toml".to_string(),
            xattr_prefix: "user.stobo.".to_string(),
        }
    }
}

/// Deployment configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DeploymentConfig {
    /// Add-on directory relative to the game directory
    pub addons_subdir: String,

    /// Tag embedded in every link name so cleanup only touches our links
    pub link_tag: String,

    /// Install history file inside the add-on directory
    pub history_file: String,
}

impl Default for DeploymentConfig {
    fn default() -> Self {
        Self {
            addons_subdir: "left4dead2/addons".to_string(),
            link_tag: "stvpk".to_string(),
            history_file: ".stobo-log".to_string(),
        }
    }
}

impl Config {
    /// Resolve the game directory with `~` expanded
    pub fn game_dir(&self) -> Option<PathBuf> {
        self.game_dir
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(expand_home)
    }

    /// Directory the add-on links are deployed into
    pub fn destination_dir(&self) -> crate::Result<PathBuf> {
        let game_dir = self.game_dir().ok_or(crate::Error::GameDirNotConfigured)?;
        Ok(game_dir.join(&self.deployment.addons_subdir))
    }

    /// Move `root` to the front of the recent workspaces list.
    ///
    /// Returns false when it was already the most recent entry.
    pub fn push_recent_workspace(&mut self, root: &Path) -> bool {
        let collapsed = collapse_home(root);
        if self.recent_workspaces.first() == Some(&collapsed) {
            return false;
        }
        self.recent_workspaces.retain(|w| *w != collapsed);
        self.recent_workspaces.insert(0, collapsed);
        self.recent_workspaces.truncate(MAX_RECENT_WORKSPACES);
        true
    }

    /// Most recently opened workspace, expanded
    pub fn most_recent_workspace(&self) -> Option<PathBuf> {
        self.recent_workspaces.first().map(|w| expand_home(w))
    }

    /// Load configuration from disk or create default
    pub async fn load() -> Result<Self> {
        Self::load_from(Paths::new()).await
    }

    /// Load configuration using an explicit set of paths
    pub async fn load_from(paths: Paths) -> Result<Self> {
        let config_path = paths.config_file();

        let mut config = if config_path.exists() {
            let content = fs::read_to_string(&config_path)
                .await
                .context("Failed to read config file")?;
            toml::from_str(&content).context("Failed to parse config file")?
        } else {
            let config = Config {
                paths: paths.clone(),
                ..Config::default()
            };
            config.save().await?;
            config
        };

        config.paths = paths;
        Ok(config)
    }

    /// Save configuration to disk
    pub async fn save(&self) -> Result<()> {
        let config_path = self.paths.config_file();

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)
                .await
                .context("Failed to create config directory")?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(&config_path, content)
            .await
            .context("Failed to write config file")?;

        Ok(())
    }
}

/// Application context passed explicitly to everything that needs settings
#[derive(Debug, Clone)]
pub struct AppContext {
    config: Arc<RwLock<Config>>,
}

impl AppContext {
    pub fn new(config: Config) -> Self {
        Self {
            config: Arc::new(RwLock::new(config)),
        }
    }

    /// Shared handle to the configuration
    pub fn config(&self) -> &Arc<RwLock<Config>> {
        &self.config
    }

    /// Copy of the current configuration
    pub async fn snapshot(&self) -> Config {
        self.config.read().await.clone()
    }

    /// Record `root` as the most recent workspace and persist the change
    pub async fn push_recent_workspace(&self, root: &Path) -> Result<()> {
        let mut config = self.config.write().await;
        if config.push_recent_workspace(root) {
            config.save().await?;
        }
        Ok(())
    }

    /// Set the game directory and persist the change
    pub async fn set_game_dir(&self, path: &Path) -> Result<()> {
        let mut config = self.config.write().await;
        config.game_dir = Some(collapse_home(path));
        config.save().await?;
        Ok(())
    }
}
