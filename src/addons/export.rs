//! Shareable add-on list export (JSON)

use super::AddonEntry;
use crate::config::collapse_home;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const EXPORT_FORMAT_VERSION: u32 = 0;

/// Snapshot of a workspace for sharing; never read back internally
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AddonList {
    /// Workspace root, home-relative
    pub repository: String,
    pub addons: Vec<ExportedAddon>,
    #[serde(rename = "_version")]
    pub version: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ExportedAddon {
    pub archive_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub steam_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl AddonList {
    pub fn new<'a>(root: &Path, entries: impl IntoIterator<Item = &'a AddonEntry>) -> Self {
        Self {
            repository: collapse_home(root),
            addons: entries
                .into_iter()
                .map(|entry| ExportedAddon {
                    archive_name: entry.archive_name(),
                    steam_id: entry.metadata.steam_id,
                    note: entry.metadata.note.clone(),
                })
                .collect(),
            version: EXPORT_FORMAT_VERSION,
        }
    }

    /// Write the list as pretty JSON, replacing `dest`
    pub async fn write(&self, dest: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).map_err(|source| Error::Encode {
            path: dest.to_path_buf(),
            source,
        })?;
        tokio::fs::write(dest, json)
            .await
            .map_err(|e| Error::io(dest, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::addons::AddonMetadata;
    use std::path::PathBuf;

    #[test]
    fn export_omits_absent_fields() {
        let entries = vec![
            AddonEntry {
                name: "a".into(),
                archive_path: PathBuf::from("/srv/w/a.vpk"),
                manifest_path: None,
                metadata: AddonMetadata {
                    steam_id: Some(9),
                    note: Some("keep".into()),
                    ..Default::default()
                },
            },
            AddonEntry {
                name: "b".into(),
                archive_path: PathBuf::from("/srv/w/b.vpk"),
                manifest_path: None,
                metadata: AddonMetadata::default(),
            },
        ];

        let list = AddonList::new(Path::new("/srv/w"), &entries);
        let value = serde_json::to_value(&list).unwrap();

        assert_eq!(value["_version"], 0);
        assert_eq!(value["addons"][0]["archiveName"], "a.vpk");
        assert_eq!(value["addons"][0]["steamId"], 9);
        assert_eq!(value["addons"][0]["note"], "keep");
        assert!(value["addons"][1].get("steamId").is_none());
        assert!(value["addons"][1].get("note").is_none());
    }
}
