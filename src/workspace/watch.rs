//! Filesystem change notifications for a workspace root

use super::store::WORKSPACE_DATA_DIR;
use crate::error::Result;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use tokio::sync::broadcast;

const EVENT_BUFFER: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsEventKind {
    Created,
    Removed,
    Modified,
    Other,
}

/// An external change inside the workspace root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FsEvent {
    pub kind: FsEventKind,
    pub paths: Vec<PathBuf>,
}

/// One watch per workspace, fanned out to any number of subscribers.
///
/// Dropping the value stops the underlying watcher.
pub struct FsWatch {
    _watcher: RecommendedWatcher,
    events: broadcast::Sender<FsEvent>,
}

impl std::fmt::Debug for FsWatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FsWatch")
            .field("subscribers", &self.events.receiver_count())
            .finish()
    }
}

impl FsWatch {
    /// Watch the entries directly inside `root`
    pub fn start(root: &Path) -> Result<Self> {
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        let sender = events.clone();
        let data_dir = root.join(WORKSPACE_DATA_DIR);

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
            Ok(event) => {
                let paths: Vec<PathBuf> = event
                    .paths
                    .into_iter()
                    .filter(|p| !p.starts_with(&data_dir))
                    .collect();
                if paths.is_empty() {
                    return;
                }
                let kind = match event.kind {
                    EventKind::Create(_) => FsEventKind::Created,
                    EventKind::Remove(_) => FsEventKind::Removed,
                    EventKind::Modify(_) => FsEventKind::Modified,
                    _ => FsEventKind::Other,
                };
                // No subscribers is fine.
                let _ = sender.send(FsEvent { kind, paths });
            }
            Err(e) => tracing::warn!("Workspace watch error: {}", e),
        })?;

        watcher.watch(root, RecursiveMode::NonRecursive)?;
        tracing::debug!("Watching {}", root.display());

        Ok(Self {
            _watcher: watcher,
            events,
        })
    }

    pub fn subscribe(&self) -> broadcast::Receiver<FsEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;

    #[tokio::test]
    async fn subscribers_see_new_files() {
        let tmp = TempDir::new().unwrap();
        let watch = FsWatch::start(tmp.path()).unwrap();
        let mut first = watch.subscribe();
        let mut second = watch.subscribe();

        std::fs::write(tmp.path().join("new.vpk"), b"x").unwrap();

        for rx in [&mut first, &mut second] {
            let event = tokio::time::timeout(Duration::from_secs(5), rx.recv())
                .await
                .expect("no event within timeout")
                .unwrap();
            assert!(event.paths.iter().any(|p| p.ends_with("new.vpk")));
        }
    }
}
