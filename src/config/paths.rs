//! XDG-compliant path management and home-relative path helpers

use directories::{BaseDirs, ProjectDirs};
use std::path::{Path, PathBuf};

/// Manages all application paths using XDG base directory specification
#[derive(Debug, Clone)]
pub struct Paths {
    config_dir: PathBuf,
    data_dir: PathBuf,
}

impl Default for Paths {
    fn default() -> Self {
        Self::new()
    }
}

impl Paths {
    /// Create a new Paths instance
    ///
    /// Falls back to `./.stobo` when no home directory can be determined.
    pub fn new() -> Self {
        match ProjectDirs::from("", "", "stobo") {
            Some(dirs) => Self {
                config_dir: dirs.config_dir().to_path_buf(),
                data_dir: dirs.data_dir().to_path_buf(),
            },
            None => Self::with_root(Path::new(".stobo")),
        }
    }

    /// Keep every application path under a single directory.
    pub fn with_root(root: &Path) -> Self {
        Self {
            config_dir: root.join("config"),
            data_dir: root.join("data"),
        }
    }

    // ========== Config Paths ==========

    /// Config directory: ~/.config/stobo/
    pub fn config_dir(&self) -> PathBuf {
        self.config_dir.clone()
    }

    /// Main config file: ~/.config/stobo/config.toml
    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join("config.toml")
    }

    // ========== Data Paths ==========

    /// Data directory: ~/.local/share/stobo/
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone()
    }

    /// Log file: ~/.local/share/stobo/stobo.log
    pub fn log_file(&self) -> PathBuf {
        self.data_dir.join("stobo.log")
    }

    /// Ensure all required directories exist
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.config_dir)?;
        std::fs::create_dir_all(&self.data_dir)?;
        Ok(())
    }
}

fn home_dir() -> Option<PathBuf> {
    BaseDirs::new().map(|dirs| dirs.home_dir().to_path_buf())
}

/// Replace a leading home directory with `~`.
pub fn collapse_home(path: &Path) -> String {
    match home_dir() {
        Some(home) => collapse_with(path, &home),
        None => path.display().to_string(),
    }
}

/// Expand a leading `~` to the home directory.
pub fn expand_home(raw: &str) -> PathBuf {
    match home_dir() {
        Some(home) => expand_with(raw, &home),
        None => PathBuf::from(raw),
    }
}

fn collapse_with(path: &Path, home: &Path) -> String {
    match path.strip_prefix(home) {
        Ok(rest) if rest.as_os_str().is_empty() => "~".to_string(),
        Ok(rest) => format!("~/{}", rest.display()),
        Err(_) => path.display().to_string(),
    }
}

fn expand_with(raw: &str, home: &Path) -> PathBuf {
    if raw == "~" {
        return home.to_path_buf();
    }
    match raw.strip_prefix("~/") {
        Some(rest) => home.join(rest),
        None => PathBuf::from(raw),
    }
}
