//! Stobo - a workspace-based add-on manager for Left 4 Dead 2 on Linux
//!
//! A workspace is a directory of `.vpk` archives, each optionally described
//! by a sidecar manifest. This crate provides:
//! - Folder scanning with manifest and extended-attribute metadata
//! - A persisted manual order and shuffle groups per workspace
//! - Symlink-based deployment into the game's add-on directory
//! - An install history and a shareable add-on list export

pub mod addons;
pub mod app;
pub mod config;
pub mod deploy;
pub mod error;
pub mod workspace;

pub use app::App;
pub use config::{AppContext, Config};
pub use error::{Error, Result};
pub use workspace::{Workspace, WorkspaceSession};
