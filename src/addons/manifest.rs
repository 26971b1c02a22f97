//! Manifest resolution: sidecar TOML first, extended attributes as fallback

use super::AddonMetadata;
use crate::config::AddonsConfig;
use crate::error::{Error, Result};
use std::path::Path;

const KEY_ENABLED: &str = "enabled";
const KEY_STEAM_ID: &str = "steam_id";
const KEY_NOTE: &str = "note";
const KEY_SHUFFLE_GROUP: &str = "shuffle_group";

/// Resolves the optional metadata of one archive
#[derive(Debug, Clone)]
pub struct ManifestResolver {
    xattr_prefix: String,
}

impl ManifestResolver {
    pub fn new(config: &AddonsConfig) -> Self {
        Self {
            xattr_prefix: config.xattr_prefix.clone(),
        }
    }

    /// Resolve metadata for `archive`.
    ///
    /// With a sidecar, its content decides; a sidecar that cannot be read or
    /// parsed is a hard error. Without one, extended attributes on the archive
    /// are consulted and any unreadable attribute is simply absent.
    pub async fn resolve(&self, archive: &Path, sidecar: Option<&Path>) -> Result<AddonMetadata> {
        match sidecar {
            Some(manifest) => {
                let content = tokio::fs::read_to_string(manifest).await.map_err(|source| {
                    Error::UnreadableManifest {
                        path: manifest.to_path_buf(),
                        source,
                    }
                })?;
                parse_sidecar(manifest, &content)
            }
            None => Ok(self.read_attributes(archive).await),
        }
    }

    async fn read_attributes(&self, archive: &Path) -> AddonMetadata {
        let archive = archive.to_path_buf();
        let prefix = self.xattr_prefix.clone();
        match tokio::task::spawn_blocking(move || attributes_blocking(&archive, &prefix)).await {
            Ok(metadata) => metadata,
            Err(e) => {
                tracing::warn!("Extended attribute lookup panicked: {}", e);
                AddonMetadata::default()
            }
        }
    }
}

/// Parse a sidecar manifest. Fields with the wrong type are dropped individually.
pub fn parse_sidecar(path: &Path, content: &str) -> Result<AddonMetadata> {
    let table: toml::Table = toml::from_str(content).map_err(|source| Error::CorruptManifest {
        path: path.to_path_buf(),
        source,
    })?;

    let enabled = table.get(KEY_ENABLED).and_then(toml::Value::as_bool);
    let steam_id = table
        .get(KEY_STEAM_ID)
        .and_then(toml::Value::as_integer)
        .and_then(|id| u64::try_from(id).ok());
    let note = table
        .get(KEY_NOTE)
        .and_then(toml::Value::as_str)
        .map(str::to_owned);
    let shuffle_group = table
        .get(KEY_SHUFFLE_GROUP)
        .and_then(toml::Value::as_str)
        .map(str::to_owned);

    Ok(AddonMetadata {
        enabled,
        steam_id,
        note,
        shuffle_group,
    })
}

fn attributes_blocking(archive: &Path, prefix: &str) -> AddonMetadata {
    let get = |key: &str| -> Option<String> {
        let name = format!("{prefix}{key}");
        match xattr::get(archive, &name) {
            Ok(Some(bytes)) => match String::from_utf8(bytes) {
                Ok(value) if !value.is_empty() => Some(value),
                Ok(_) => None,
                Err(_) => {
                    tracing::debug!("Attribute {} on {} is not UTF-8", name, archive.display());
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                tracing::debug!("Cannot read attribute {} on {}: {}", name, archive.display(), e);
                None
            }
        }
    };

    AddonMetadata {
        enabled: get(KEY_ENABLED).and_then(|v| coerce_bool(&v)),
        steam_id: get(KEY_STEAM_ID).and_then(|v| v.trim().parse().ok()),
        note: get(KEY_NOTE),
        shuffle_group: get(KEY_SHUFFLE_GROUP),
    }
}

fn coerce_bool(value: &str) -> Option<bool> {
    match value.trim() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn sidecar_fields_are_parsed() {
        let meta = parse_sidecar(
            Path::new("a.toml"),
            "enabled = false\nsteam_id = 1234\nnote = \"hi\"\nshuffle_group = \"x\"\n",
        )
        .unwrap();
        assert_eq!(
            meta,
            AddonMetadata {
                enabled: Some(false),
                steam_id: Some(1234),
                note: Some("hi".to_string()),
                shuffle_group: Some("x".to_string()),
            }
        );
    }

    #[test]
    fn mistyped_fields_are_nulled_independently() {
        let meta = parse_sidecar(
            Path::new("a.toml"),
            "enabled = \"yes\"\nsteam_id = -5\nnote = 3\nshuffle_group = \"x\"\n",
        )
        .unwrap();
        assert_eq!(meta.enabled, None);
        assert_eq!(meta.steam_id, None);
        assert_eq!(meta.note, None);
        assert_eq!(meta.shuffle_group.as_deref(), Some("x"));
    }

    #[test]
    fn corrupt_sidecar_is_an_error() {
        let err = parse_sidecar(Path::new("a.toml"), "enabled = = true").unwrap_err();
        assert!(matches!(err, Error::CorruptManifest { .. }));
    }

    #[test]
    fn bool_coercion_only_accepts_literals() {
        assert_eq!(coerce_bool("true"), Some(true));
        assert_eq!(coerce_bool(" false\n"), Some(false));
        assert_eq!(coerce_bool("1"), None);
        assert_eq!(coerce_bool("True"), None);
    }

    #[tokio::test]
    async fn missing_manifest_yields_empty_metadata() {
        let tmp = TempDir::new().unwrap();
        let archive = tmp.path().join("plain.vpk");
        std::fs::write(&archive, b"vpk").unwrap();

        let resolver = ManifestResolver::new(&AddonsConfig::default());
        let meta = resolver.resolve(&archive, None).await.unwrap();
        assert_eq!(meta, AddonMetadata::default());
    }

    #[tokio::test]
    async fn unreadable_sidecar_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let archive = tmp.path().join("a.vpk");
        let resolver = ManifestResolver::new(&AddonsConfig::default());
        let err = resolver
            .resolve(&archive, Some(&tmp.path().join("a.toml")))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UnreadableManifest { .. }));
    }

    #[tokio::test]
    async fn attributes_are_used_without_sidecar() {
        let tmp = TempDir::new().unwrap();
        let archive = tmp.path().join("tagged.vpk");
        std::fs::write(&archive, b"vpk").unwrap();

        // Not every filesystem (tmpfs on older kernels) accepts user attributes.
        if xattr::set(&archive, "user.stobo.enabled", b"false").is_err() {
            return;
        }
        xattr::set(&archive, "user.stobo.steam_id", b"77").unwrap();
        xattr::set(&archive, "user.stobo.shuffle_group", b"maps").unwrap();
        xattr::set(&archive, "user.stobo.note", b"").unwrap();

        let resolver = ManifestResolver::new(&AddonsConfig::default());
        let meta = resolver.resolve(&archive, None).await.unwrap();
        assert_eq!(meta.enabled, Some(false));
        assert_eq!(meta.steam_id, Some(77));
        assert_eq!(meta.shuffle_group.as_deref(), Some("maps"));
        assert_eq!(meta.note, None);
    }
}
