//! Per-workspace persisted state under `<root>/.stobo/`
//!
//! Three resources live there, each owned by one loaded workspace and each
//! rewritten whole on every save:
//! - `manual-order`: JSON array of add-on names
//! - `shuffle-choices`: JSON object, shuffle group -> add-on name
//! - `log`: build record; only its modification time is read back

use crate::config::collapse_home;
use crate::deploy::ShuffleChoices;
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use filetime::FileTime;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Hidden directory holding workspace state
pub const WORKSPACE_DATA_DIR: &str = ".stobo";

const BUILD_LOG_FILE: &str = "log";

/// A JSON resource stored in the workspace data directory
pub trait Resource {
    const FILE_NAME: &'static str;
    type Value: Serialize + DeserializeOwned + Default;
}

/// The user's manual ordering of add-on names
pub enum ManualOrderFile {}

impl Resource for ManualOrderFile {
    const FILE_NAME: &'static str = "manual-order";
    type Value = Vec<String>;
}

/// The last shuffle selection per group
pub enum ShuffleChoicesFile {}

impl Resource for ShuffleChoicesFile {
    const FILE_NAME: &'static str = "shuffle-choices";
    type Value = ShuffleChoices;
}

/// Content of the build log
#[derive(Debug, Clone, Serialize, Deserialize)]
struct BuildRecord {
    built_at: DateTime<Utc>,
    root: String,
}

/// Loads and saves the persisted state of one workspace
#[derive(Debug, Clone)]
pub struct WorkspaceStore {
    root: PathBuf,
    dir: PathBuf,
}

impl WorkspaceStore {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            dir: root.join(WORKSPACE_DATA_DIR),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_of(&self, file_name: &str) -> PathBuf {
        self.dir.join(file_name)
    }

    /// Load a resource; a missing file yields the empty default
    pub async fn load<R: Resource>(&self) -> Result<R::Value> {
        let path = self.path_of(R::FILE_NAME);
        let content = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(R::Value::default()),
            Err(e) => return Err(Error::io(&path, e)),
        };
        serde_json::from_slice(&content).map_err(|source| Error::CorruptStore { path, source })
    }

    /// Replace a resource's content entirely
    pub async fn save<R: Resource>(&self, value: &R::Value) -> Result<()> {
        let path = self.path_of(R::FILE_NAME);
        let json = serde_json::to_vec_pretty(value).map_err(|source| Error::Encode {
            path: path.clone(),
            source,
        })?;
        self.replace(&path, &json).await
    }

    /// Modification time of the build log, if a build was ever recorded
    pub async fn last_build(&self) -> Result<Option<DateTime<Utc>>> {
        let path = self.path_of(BUILD_LOG_FILE);
        let metadata = match tokio::fs::metadata(&path).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(Error::io(&path, e)),
        };
        let modified = metadata.modified().map_err(|e| Error::io(&path, e))?;
        Ok(Some(DateTime::<Utc>::from(modified)))
    }

    /// Write the build log and stamp its modification time with `at`
    pub async fn record_build(&self, at: DateTime<Utc>) -> Result<()> {
        let path = self.path_of(BUILD_LOG_FILE);
        let record = BuildRecord {
            built_at: at,
            root: collapse_home(&self.root),
        };
        let json = serde_json::to_vec_pretty(&record).map_err(|source| Error::Encode {
            path: path.clone(),
            source,
        })?;
        self.replace(&path, &json).await?;

        let mtime = FileTime::from_system_time(SystemTime::from(at));
        filetime::set_file_mtime(&path, mtime).map_err(|e| Error::io(&path, e))
    }

    /// Forget the last build
    pub async fn clear_build(&self) -> Result<()> {
        let path = self.path_of(BUILD_LOG_FILE);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::io(&path, e)),
        }
    }

    /// Write to a sibling temporary file, then rename over the target
    async fn replace(&self, path: &Path, content: &[u8]) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| Error::io(&self.dir, e))?;

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let tmp = self.dir.join(format!(".{file_name}.tmp"));

        tokio::fs::write(&tmp, content)
            .await
            .map_err(|e| Error::io(&tmp, e))?;
        tokio::fs::rename(&tmp, path)
            .await
            .map_err(|e| Error::io(path, e))
    }
}
