//! Symlink-based add-on deployment

use super::history::InstallHistory;
use crate::addons::list_dir;
use crate::config::Config;
use crate::error::{Error, Result};
use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;

/// Deployment statistics
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DeploymentStats {
    pub links_removed: usize,
    pub links_created: usize,
    pub errors: Vec<String>,
    pub history_written: bool,
}

/// Creates and removes tagged links inside the game's add-on directory
#[derive(Debug, Clone)]
pub struct Linker {
    dest_dir: PathBuf,
    link_suffix: String,
    archive_suffix: String,
    history_file: PathBuf,
}

impl Linker {
    pub fn new(dest_dir: PathBuf, config: &Config) -> Self {
        let deployment = &config.deployment;
        let extension = &config.addons.archive_extension;
        Self {
            history_file: dest_dir.join(&deployment.history_file),
            link_suffix: format!("@{}.{}", deployment.link_tag, extension),
            archive_suffix: format!(".{extension}"),
            dest_dir,
        }
    }

    /// Linker for the configured game directory
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(config.destination_dir()?, config))
    }

    pub fn dest_dir(&self) -> &Path {
        &self.dest_dir
    }

    pub fn history_file(&self) -> &Path {
        &self.history_file
    }

    /// Does `file_name` look like a link this tool created?
    pub fn is_managed_link(&self, file_name: &str) -> bool {
        file_name.ends_with(&self.link_suffix)
    }

    fn link_name(&self, index: usize) -> String {
        format!("{index}{}", self.link_suffix)
    }

    /// Remove every previously deployed link; other files are left alone.
    ///
    /// Individual deletion failures are logged and skipped.
    pub async fn cleanup(&self, cancel: &CancellationToken) -> Result<DeploymentStats> {
        let mut stats = DeploymentStats::default();

        for name in list_dir(&self.dest_dir).await? {
            if !self.is_managed_link(&name) {
                continue;
            }
            let path = self.dest_dir.join(&name);
            match cancellable(cancel, tokio::fs::remove_file(&path)).await? {
                Ok(()) => stats.links_removed += 1,
                Err(e) => {
                    tracing::warn!("Failed to remove {}: {}", path.display(), e);
                    stats.errors.push(format!("Failed to remove {}: {}", path.display(), e));
                }
            }
        }

        tracing::info!(
            "Removed {} deployed links from {}",
            stats.links_removed,
            self.dest_dir.display()
        );
        Ok(stats)
    }

    /// Link `files` into the add-on directory and record the deployment.
    ///
    /// Directories are expanded into the archives directly inside them. Every
    /// link gets the next index of a single counter. Failed links and a failed
    /// history write are logged, never fatal.
    pub async fn deploy(
        &self,
        root: &Path,
        files: &[PathBuf],
        cancel: &CancellationToken,
    ) -> Result<DeploymentStats> {
        let mut stats = DeploymentStats::default();
        let mut counter = 0usize;

        for file in files {
            let metadata = match cancellable(cancel, tokio::fs::metadata(file)).await? {
                Ok(metadata) => metadata,
                Err(e) => {
                    tracing::warn!("Source {} is missing, skipping: {}", file.display(), e);
                    stats.errors.push(format!("Source missing: {}", file.display()));
                    continue;
                }
            };

            let sources = if metadata.is_dir() {
                match self.sub_archives(file).await {
                    Ok(sources) => sources,
                    Err(e) => {
                        tracing::warn!("Cannot list {}: {}", file.display(), e);
                        stats.errors.push(e.to_string());
                        continue;
                    }
                }
            } else {
                vec![file.clone()]
            };

            for source in sources {
                let dest = self.dest_dir.join(self.link_name(counter));
                counter += 1;
                match self.link_one(&source, &dest, cancel).await? {
                    Ok(()) => stats.links_created += 1,
                    Err(e) => {
                        tracing::warn!("Failed to link {}: {}", source.display(), e);
                        stats
                            .errors
                            .push(format!("Failed to link {}: {}", source.display(), e));
                    }
                }
            }
        }

        match InstallHistory::prepend(&self.history_file, root).await {
            Ok(_) => stats.history_written = true,
            Err(e) => tracing::warn!("Failed to update install history: {}", e),
        }

        tracing::info!(
            "Deployed {} links into {} ({} errors)",
            stats.links_created,
            self.dest_dir.display(),
            stats.errors.len()
        );
        Ok(stats)
    }

    async fn sub_archives(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let mut names: Vec<String> = list_dir(dir)
            .await?
            .into_iter()
            .filter(|n| n.ends_with(&self.archive_suffix))
            .collect();
        names.sort();
        Ok(names.into_iter().map(|n| dir.join(n)).collect())
    }

    async fn link_one(
        &self,
        source: &Path,
        dest: &Path,
        cancel: &CancellationToken,
    ) -> Result<io::Result<()>> {
        let source = match std::path::absolute(source) {
            Ok(source) => source,
            Err(e) => return Ok(Err(e)),
        };
        cancellable(cancel, tokio::fs::symlink(source, dest)).await
    }
}

/// Race a filesystem step against cancellation.
///
/// The outer result carries cancellation, the inner one the step's own outcome.
async fn cancellable<T, F>(cancel: &CancellationToken, step: F) -> Result<io::Result<T>>
where
    F: Future<Output = io::Result<T>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Error::Cancelled),
        res = step => Ok(res),
    }
}
