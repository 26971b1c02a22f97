//! Folder scanning - pairs archives with their sidecar manifests

use super::{base_name, AddonEntry, ManifestResolver};
use crate::config::AddonsConfig;
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};

/// An archive paired with its manifest, before metadata is resolved
#[derive(Debug, Clone, PartialEq, Eq)]
struct Pairing {
    name: String,
    archive: PathBuf,
    manifest: Option<PathBuf>,
}

/// Lists a workspace directory and builds its add-on entries
#[derive(Debug, Clone)]
pub struct FolderScanner {
    resolver: ManifestResolver,
    archive_suffix: String,
    manifest_suffix: String,
}

impl FolderScanner {
    pub fn new(config: &AddonsConfig) -> Self {
        Self {
            resolver: ManifestResolver::new(config),
            archive_suffix: format!(".{}", config.archive_extension),
            manifest_suffix: format!(".{}", config.manifest_extension),
        }
    }

    /// Scan `root` (one level deep) and return entries in enumeration order.
    ///
    /// Archives whose name cannot be derived are skipped. A manifest that
    /// exists but cannot be decoded fails the whole scan.
    pub async fn scan(&self, root: &Path) -> Result<Vec<AddonEntry>> {
        let listing = list_dir(root).await?;
        let pairings = self.pair(root, &listing);

        let mut entries = Vec::with_capacity(pairings.len());
        for pairing in pairings {
            let metadata = self
                .resolver
                .resolve(&pairing.archive, pairing.manifest.as_deref())
                .await?;
            entries.push(AddonEntry {
                name: pairing.name,
                archive_path: pairing.archive,
                manifest_path: pairing.manifest,
                metadata,
            });
        }

        tracing::debug!("Scanned {} add-ons in {}", entries.len(), root.display());
        Ok(entries)
    }

    fn pair(&self, root: &Path, listing: &[String]) -> Vec<Pairing> {
        let manifests: Vec<&str> = listing
            .iter()
            .filter(|name| name.ends_with(&self.manifest_suffix))
            .map(String::as_str)
            .collect();

        let mut pairings: Vec<Pairing> = Vec::new();
        for file_name in listing.iter().filter(|n| n.ends_with(&self.archive_suffix)) {
            let Some(name) = base_name(file_name) else {
                tracing::warn!("Cannot derive an add-on name from {}, skipping", file_name);
                continue;
            };

            let mut matches = manifests.iter().filter(|m| base_name(m) == Some(name));
            let manifest = matches.next().map(|m| root.join(m));
            if let Some(extra) = matches.next() {
                tracing::warn!(
                    "Add-on '{}' has several manifests; using {} and ignoring {}",
                    name,
                    manifest.as_ref().map(|m| m.display().to_string()).unwrap_or_default(),
                    extra
                );
            }

            let pairing = Pairing {
                name: name.to_string(),
                archive: root.join(file_name),
                manifest,
            };

            match pairings.iter_mut().find(|p| p.name == pairing.name) {
                Some(existing) => {
                    tracing::warn!(
                        "Archives {} and {} share the name '{}'; keeping the latter",
                        existing.archive.display(),
                        pairing.archive.display(),
                        pairing.name
                    );
                    *existing = pairing;
                }
                None => pairings.push(pairing),
            }
        }
        pairings
    }
}

/// File names directly inside `dir`, in enumeration order.
///
/// Names that are not valid UTF-8 are logged and dropped.
pub(crate) async fn list_dir(dir: &Path) -> Result<Vec<String>> {
    let mut reader = tokio::fs::read_dir(dir)
        .await
        .map_err(|e| Error::io(dir, e))?;

    let mut names = Vec::new();
    while let Some(entry) = reader.next_entry().await.map_err(|e| Error::io(dir, e))? {
        match entry.file_name().into_string() {
            Ok(name) => names.push(name),
            Err(raw) => tracing::warn!("Skipping non UTF-8 path {:?} in {}", raw, dir.display()),
        }
    }
    Ok(names)
}
