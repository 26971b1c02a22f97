//! Error types for the workspace core

use std::io;
use std::path::{Path, PathBuf};

/// Errors raised by scanning, persistence and deployment.
///
/// Missing persisted resources and missing manifests are not errors; they are
/// recovered to defaults where they are read.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("manifest {} is not valid TOML: {source}", path.display())]
    CorruptManifest {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("manifest {} could not be read: {source}", path.display())]
    UnreadableManifest {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("workspace data {} is corrupt: {source}", path.display())]
    CorruptStore {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("cannot encode {}: {source}", path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("operation cancelled")]
    Cancelled,

    #[error("filesystem watch failed: {0}")]
    Watch(#[from] notify::Error),

    #[error("no workspace is loaded")]
    NoWorkspace,

    #[error("game directory is not configured")]
    GameDirNotConfigured,
}

impl Error {
    pub(crate) fn io(path: impl AsRef<Path>, source: io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Cancellation is a benign outcome, not a failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
