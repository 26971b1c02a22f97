//! Add-on discovery - archives, their manifests, and the exported list format

pub mod export;
mod manifest;
mod scan;

pub use export::*;
pub use manifest::*;
pub use scan::*;

use std::path::PathBuf;

/// Stable handle to an entry within one loaded workspace.
///
/// Ids index the workspace's entry arena and stay valid until the workspace
/// is reloaded. UI rows hold the id, never the entry itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AddonId(pub(crate) usize);

impl AddonId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Optional metadata attached to an archive
///
/// Every field is independently optional; a missing manifest yields the
/// default value with everything absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddonMetadata {
    /// `None` means "treat as enabled"
    pub enabled: Option<bool>,

    /// Identifier used only by external enrichment
    pub steam_id: Option<u64>,

    pub note: Option<String>,

    /// Entries sharing a group compete; one is deployed per group
    pub shuffle_group: Option<String>,
}

/// One discovered archive and its metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddonEntry {
    /// Archive file name up to the first `.`; unique within a workspace
    pub name: String,

    /// Archive file, or a directory holding several archives
    pub archive_path: PathBuf,

    /// Sidecar manifest, when one was matched
    pub manifest_path: Option<PathBuf>,

    pub metadata: AddonMetadata,
}

impl AddonEntry {
    /// Explicitly disabled entries are never deployed
    pub fn is_enabled(&self) -> bool {
        self.metadata.enabled != Some(false)
    }

    pub fn shuffle_group(&self) -> Option<&str> {
        self.metadata.shuffle_group.as_deref()
    }

    /// File name of the archive, including its extension
    pub fn archive_name(&self) -> String {
        self.archive_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Derive an add-on name from a file name: everything before the first `.`.
///
/// Returns `None` when the result would be empty or the name has no dot.
pub fn base_name(file_name: &str) -> Option<&str> {
    let (stem, _) = file_name.split_once('.')?;
    if stem.is_empty() {
        None
    } else {
        Some(stem)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_name_stops_at_first_dot() {
        assert_eq!(base_name("alpha.vpk"), Some("alpha"));
        assert_eq!(base_name("alpha.toml"), Some("alpha"));
        assert_eq!(base_name("alpha.tar.vpk"), Some("alpha"));
        // Known ambiguity: dotted names are truncated at the first dot.
        assert_eq!(base_name("v1.2-addon.vpk"), Some("v1"));
        assert_eq!(base_name(".vpk"), None);
        assert_eq!(base_name("noext"), None);
    }

    #[test]
    fn unknown_enabled_counts_as_enabled() {
        let mut entry = AddonEntry {
            name: "a".to_string(),
            archive_path: PathBuf::from("/w/a.vpk"),
            manifest_path: None,
            metadata: AddonMetadata::default(),
        };
        assert!(entry.is_enabled());
        entry.metadata.enabled = Some(true);
        assert!(entry.is_enabled());
        entry.metadata.enabled = Some(false);
        assert!(!entry.is_enabled());
        assert_eq!(entry.archive_name(), "a.vpk");
    }
}
