//! Workspaces - a directory of add-ons plus its persisted state
//!
//! A [`Workspace`] is one loaded root. Its entries are fixed for the lifetime
//! of the load; the manual order, shuffle choices and last build time change
//! through the `request_*`/`set_*` transitions, each of which rewrites its
//! own file under `<root>/.stobo/` and announces the change on a channel.

pub mod order;
mod session;
pub mod store;
pub mod watch;

pub use order::{MoveOutcome, MoveRequest};
pub use session::*;
pub use store::WorkspaceStore;
pub use watch::{FsEvent, FsEventKind, FsWatch};

use crate::addons::{AddonEntry, AddonId, FolderScanner};
use crate::config::AddonsConfig;
use crate::deploy::ShuffleChoices;
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use store::{ManualOrderFile, ShuffleChoicesFile};
use tokio::sync::broadcast;

const CHANGE_BUFFER: usize = 32;

/// A state transition of a loaded workspace
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkspaceChange {
    ManualOrder(Vec<String>),
    ShuffleChoices(ShuffleChoices),
    LastBuild(Option<DateTime<Utc>>),
}

/// Mutable workspace state at one point in time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceSnapshot {
    pub root: PathBuf,
    pub manual_order: Vec<String>,
    pub shuffle_choices: ShuffleChoices,
    pub last_build: Option<DateTime<Utc>>,
}

/// Result of a transition: the state after it, and what changed
#[derive(Debug, Clone)]
pub struct Transition {
    pub snapshot: WorkspaceSnapshot,
    pub changes: Vec<WorkspaceChange>,
}

/// One loaded workspace root
#[derive(Debug)]
pub struct Workspace {
    root: PathBuf,
    entries: Vec<AddonEntry>,
    by_name: HashMap<String, AddonId>,
    manual_order: Vec<String>,
    shuffle_choices: ShuffleChoices,
    last_build: Option<DateTime<Utc>>,
    store: WorkspaceStore,
    watch: Option<FsWatch>,
    changes: broadcast::Sender<WorkspaceChange>,
}

impl Workspace {
    /// Scan `root` and restore its persisted state.
    ///
    /// The persisted manual order is reconciled with what was discovered and
    /// written back when the two differ. A watch failure only disables
    /// change notifications.
    pub async fn load(root: &Path, config: &AddonsConfig) -> Result<Self> {
        let root = tokio::fs::canonicalize(root)
            .await
            .map_err(|e| Error::io(root, e))?;
        let store = WorkspaceStore::new(&root);

        let entries = FolderScanner::new(config).scan(&root).await?;
        let by_name = entries
            .iter()
            .enumerate()
            .map(|(idx, entry)| (entry.name.clone(), AddonId(idx)))
            .collect();

        let persisted = store.load::<ManualOrderFile>().await?;
        let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        let manual_order = order::merge_with_discovery(&persisted, &names);
        if manual_order != persisted {
            tracing::debug!("Manual order of {} reconciled with disk", root.display());
            store.save::<ManualOrderFile>(&manual_order).await?;
        }

        let shuffle_choices = store.load::<ShuffleChoicesFile>().await?;

        let watch = match FsWatch::start(&root) {
            Ok(watch) => Some(watch),
            Err(e) => {
                tracing::warn!("Cannot watch {}: {}", root.display(), e);
                None
            }
        };

        let (changes, _) = broadcast::channel(CHANGE_BUFFER);
        let mut workspace = Self {
            root,
            entries,
            by_name,
            manual_order,
            shuffle_choices,
            last_build: None,
            store,
            watch,
            changes,
        };
        workspace.set_last_build_silent(workspace.store.last_build().await?);

        tracing::info!(
            "Loaded workspace {} ({} add-ons)",
            workspace.root.display(),
            workspace.entries.len()
        );
        Ok(workspace)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Display name of the workspace: the root's final component
    pub fn name(&self) -> String {
        self.root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.root.display().to_string())
    }

    /// Entries in discovery order
    pub fn entries(&self) -> &[AddonEntry] {
        &self.entries
    }

    pub fn entry(&self, id: AddonId) -> Option<&AddonEntry> {
        self.entries.get(id.0)
    }

    pub fn id_of(&self, name: &str) -> Option<AddonId> {
        self.by_name.get(name).copied()
    }

    /// Entries in manual order
    pub fn ordered_entries(&self) -> impl Iterator<Item = &AddonEntry> + '_ {
        self.manual_order
            .iter()
            .filter_map(|name| self.id_of(name))
            .filter_map(|id| self.entry(id))
    }

    pub fn manual_order(&self) -> &[String] {
        &self.manual_order
    }

    pub fn shuffle_choices(&self) -> &ShuffleChoices {
        &self.shuffle_choices
    }

    pub fn last_build(&self) -> Option<DateTime<Utc>> {
        self.last_build
    }

    pub fn snapshot(&self) -> WorkspaceSnapshot {
        WorkspaceSnapshot {
            root: self.root.clone(),
            manual_order: self.manual_order.clone(),
            shuffle_choices: self.shuffle_choices.clone(),
            last_build: self.last_build,
        }
    }

    /// Listen for state transitions of this workspace
    pub fn subscribe(&self) -> broadcast::Receiver<WorkspaceChange> {
        self.changes.subscribe()
    }

    /// Listen for external changes inside the root.
    ///
    /// All listeners share the workspace's single watch. `None` when the
    /// watch could not be started.
    pub fn on_fs_changed(&self) -> Option<broadcast::Receiver<FsEvent>> {
        self.watch.as_ref().map(FsWatch::subscribe)
    }

    /// Move `src` to `target`'s position.
    ///
    /// Names missing from the order are ignored with a warning; they come
    /// from a view that raced a reload.
    pub async fn request_change_manual_order(&mut self, request: MoveRequest) -> Result<Transition> {
        let mut changes = Vec::new();
        let mut next = self.manual_order.clone();
        match order::apply_move(&mut next, &request) {
            MoveOutcome::Moved => {
                self.store.save::<ManualOrderFile>(&next).await?;
                self.manual_order = next;
                changes.push(self.emit(WorkspaceChange::ManualOrder(self.manual_order.clone())));
            }
            MoveOutcome::Unchanged => {}
            MoveOutcome::UnknownName => tracing::warn!(
                "Ignoring move of '{}' to '{}': not in the manual order",
                request.src,
                request.target
            ),
        }
        Ok(self.transition(changes))
    }

    /// Replace the shuffle choices in memory and on disk
    pub async fn request_save_shuffle_choices(&mut self, choices: ShuffleChoices) -> Result<Transition> {
        self.store.save::<ShuffleChoicesFile>(&choices).await?;
        self.shuffle_choices = choices;
        let change = self.emit(WorkspaceChange::ShuffleChoices(self.shuffle_choices.clone()));
        Ok(self.transition(vec![change]))
    }

    /// Record (or forget, with `None`) the last build and persist it
    pub async fn set_last_build(&mut self, at: Option<DateTime<Utc>>) -> Result<Transition> {
        match at {
            Some(at) => self.store.record_build(at).await?,
            None => self.store.clear_build().await?,
        }
        self.last_build = at;
        let change = self.emit(WorkspaceChange::LastBuild(at));
        Ok(self.transition(vec![change]))
    }

    /// Set the last build time without writing it back
    pub fn set_last_build_silent(&mut self, at: Option<DateTime<Utc>>) {
        self.last_build = at;
    }

    fn emit(&self, change: WorkspaceChange) -> WorkspaceChange {
        // No subscribers is fine.
        let _ = self.changes.send(change.clone());
        change
    }

    fn transition(&self, changes: Vec<WorkspaceChange>) -> Transition {
        Transition {
            snapshot: self.snapshot(),
            changes,
        }
    }
}
