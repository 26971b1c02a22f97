//! Install history kept next to the deployed links

use crate::config::collapse_home;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// History file content, most recent deployment first
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct InstallHistory {
    #[serde(default)]
    pub entries: Vec<HistoryEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HistoryEntry {
    /// Workspace the deployment came from, home-relative
    pub root: String,
}

impl InstallHistory {
    /// Read the history; a missing or unreadable file counts as empty
    pub async fn read(path: &Path) -> Self {
        let content = match tokio::fs::read(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Self::default(),
            Err(e) => {
                tracing::warn!("Cannot read install history {}: {}", path.display(), e);
                return Self::default();
            }
        };
        match serde_json::from_slice(&content) {
            Ok(history) => history,
            Err(e) => {
                tracing::warn!("Install history {} is corrupt, starting over: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Record a deployment from `root` ahead of the existing entries
    pub async fn prepend(path: &Path, root: &Path) -> Result<Self> {
        let mut history = Self::read(path).await;
        history.entries.insert(
            0,
            HistoryEntry {
                root: collapse_home(root),
            },
        );

        let json = serde_json::to_vec_pretty(&history).map_err(|source| Error::Encode {
            path: path.to_path_buf(),
            source,
        })?;
        tokio::fs::write(path, json)
            .await
            .map_err(|e| Error::io(path, e))?;
        Ok(history)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn prepend_puts_newest_first() {
        let tmp = TempDir::new().unwrap();
        let log = tmp.path().join(".stobo-log");

        InstallHistory::prepend(&log, Path::new("/srv/one")).await.unwrap();
        let history = InstallHistory::prepend(&log, Path::new("/srv/two")).await.unwrap();

        assert_eq!(history.entries.len(), 2);
        assert_eq!(history.entries[0].root, "/srv/two");
        assert_eq!(InstallHistory::read(&log).await, history);
    }

    #[tokio::test]
    async fn corrupt_history_is_treated_as_empty() {
        let tmp = TempDir::new().unwrap();
        let log = tmp.path().join(".stobo-log");
        std::fs::write(&log, "{ not json").unwrap();

        let history = InstallHistory::prepend(&log, Path::new("/srv/one")).await.unwrap();
        assert_eq!(history.entries.len(), 1);
    }

    #[tokio::test]
    async fn history_without_entries_array_is_treated_as_empty() {
        let tmp = TempDir::new().unwrap();
        let log = tmp.path().join(".stobo-log");
        std::fs::write(&log, "{\"entries\": 3}").unwrap();
        assert_eq!(InstallHistory::read(&log).await, InstallHistory::default());

        std::fs::write(&log, "{}").unwrap();
        assert_eq!(InstallHistory::read(&log).await, InstallHistory::default());
    }
}
