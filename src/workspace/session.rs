//! Workspace session - owns the active workspace and runs deployments

use super::Workspace;
use crate::addons::AddonList;
use crate::config::AppContext;
use crate::deploy::{resolve, DeploymentStats, Linker, ShuffleChoices};
use crate::error::{Error, Result};
use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::Path;
use tokio_util::sync::CancellationToken;

/// What a deployment did
#[derive(Debug, Clone, Default)]
pub struct DeployReport {
    pub stats: DeploymentStats,

    /// Names of the deployed entries, in deployment order
    pub deployed: Vec<String>,

    pub choices: ShuffleChoices,
}

/// Holds at most one loaded workspace at a time
#[derive(Debug)]
pub struct WorkspaceSession {
    ctx: AppContext,
    current: Option<Workspace>,
}

impl WorkspaceSession {
    pub fn new(ctx: AppContext) -> Self {
        Self { ctx, current: None }
    }

    pub fn context(&self) -> &AppContext {
        &self.ctx
    }

    /// Close the current workspace, then load `root` in its place.
    ///
    /// The previous workspace's watch and listeners are gone before the new
    /// one is scanned. On success `root` becomes the most recent workspace.
    pub async fn switch_to(&mut self, root: &Path) -> Result<&mut Workspace> {
        self.close();

        let addons = self.ctx.config().read().await.addons.clone();
        let workspace = Workspace::load(root, &addons).await?;

        if let Err(e) = self.ctx.push_recent_workspace(workspace.root()).await {
            tracing::warn!("Failed to update recent workspaces: {:#}", e);
        }

        Ok(self.current.insert(workspace))
    }

    /// Drop the current workspace, if any
    pub fn close(&mut self) {
        if let Some(previous) = self.current.take() {
            tracing::debug!("Closing workspace {}", previous.root().display());
        }
    }

    pub fn is_open(&self) -> bool {
        self.current.is_some()
    }

    pub fn current(&self) -> Result<&Workspace> {
        self.current.as_ref().ok_or(Error::NoWorkspace)
    }

    pub fn current_mut(&mut self) -> Result<&mut Workspace> {
        self.current.as_mut().ok_or(Error::NoWorkspace)
    }

    /// Deploy the current workspace with a freshly seeded random source
    pub async fn deploy(&mut self, cancel: &CancellationToken) -> Result<DeployReport> {
        self.deploy_with_rng(&mut StdRng::from_entropy(), cancel).await
    }

    /// Clean up old links, resolve shuffle groups, persist the choices, link
    /// the result and stamp the build time.
    ///
    /// Entries are resolved in manual order; group picks are linked after the
    /// ungrouped entries.
    pub async fn deploy_with_rng<R>(
        &mut self,
        rng: &mut R,
        cancel: &CancellationToken,
    ) -> Result<DeployReport>
    where
        R: Rng + ?Sized,
    {
        let linker = Linker::from_config(&*self.ctx.config().read().await)?;
        let workspace = self.current.as_mut().ok_or(Error::NoWorkspace)?;

        let removed = linker.cleanup(cancel).await?;

        let resolution = resolve(
            workspace.ordered_entries(),
            workspace.shuffle_choices(),
            rng,
        );
        workspace
            .request_save_shuffle_choices(resolution.choices.clone())
            .await?;

        let mut stats = linker
            .deploy(workspace.root(), &resolution.included, cancel)
            .await?;
        let mut errors = removed.errors;
        errors.append(&mut stats.errors);
        stats.errors = errors;
        stats.links_removed = removed.links_removed;

        workspace.set_last_build(Some(Utc::now())).await?;

        Ok(DeployReport {
            stats,
            deployed: resolution.included_names,
            choices: resolution.choices,
        })
    }

    /// Remove every deployed link without deploying anything
    pub async fn cleanup(&self, cancel: &CancellationToken) -> Result<DeploymentStats> {
        let linker = Linker::from_config(&*self.ctx.config().read().await)?;
        linker.cleanup(cancel).await
    }

    /// Write the shareable add-on list of the current workspace to `dest`
    pub async fn export_list(&self, dest: &Path) -> Result<AddonList> {
        let workspace = self.current()?;
        let list = AddonList::new(workspace.root(), workspace.ordered_entries());
        list.write(dest).await?;
        tracing::info!("Exported {} add-ons to {}", list.addons.len(), dest.display());
        Ok(list)
    }
}
