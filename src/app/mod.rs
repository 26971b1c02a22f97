//! Application state and orchestration

mod actions;

use crate::config::{AppContext, Config};
use crate::workspace::{Workspace, WorkspaceSession};

use anyhow::{bail, Context, Result};
use std::path::Path;

/// Main application struct that orchestrates all components
pub struct App {
    /// Shared application context
    pub ctx: AppContext,

    /// The session holding the open workspace
    pub session: WorkspaceSession,
}

impl App {
    /// Create a new App instance
    pub async fn new(config: Config) -> Result<Self> {
        config
            .paths
            .ensure_dirs()
            .context("Failed to create directories")?;

        let ctx = AppContext::new(config);
        let session = WorkspaceSession::new(ctx.clone());

        Ok(Self { ctx, session })
    }

    /// Open `root`, or the most recent workspace when none is given
    pub async fn open_workspace(&mut self, root: Option<&Path>) -> Result<&mut Workspace> {
        let root = match root {
            Some(root) => root.to_path_buf(),
            None => match self.ctx.config().read().await.most_recent_workspace() {
                Some(recent) => recent,
                None => bail!("No workspace given and none opened before. Pass --workspace <dir>."),
            },
        };

        self.session
            .switch_to(&root)
            .await
            .with_context(|| format!("Failed to open workspace {}", root.display()))
    }

    /// The open workspace
    pub fn workspace(&self) -> Result<&Workspace> {
        Ok(self.session.current()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Paths;
    use tempfile::TempDir;

    fn test_config(tmp: &TempDir) -> Config {
        Config {
            paths: Paths::with_root(&tmp.path().join("app")),
            ..Config::default()
        }
    }

    #[tokio::test]
    async fn opens_most_recent_workspace_by_default() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("addons");
        std::fs::create_dir_all(&root).unwrap();
        std::fs::write(root.join("a.vpk"), "a").unwrap();

        let mut app = App::new(test_config(&tmp)).await.unwrap();
        assert!(app.open_workspace(None).await.is_err());

        app.open_workspace(Some(&root)).await.unwrap();
        app.session.close();

        let ws = app.open_workspace(None).await.unwrap();
        assert_eq!(ws.entries().len(), 1);
        assert!(app.workspace().is_ok());
    }
}
