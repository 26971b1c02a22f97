//! CLI command action handlers

use super::App;
use crate::config::collapse_home;
use crate::workspace::{FsEventKind, MoveRequest};
use anyhow::{bail, Context, Result};
use std::path::Path;
use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;

/// Token cancelled when the user presses Ctrl-C
fn ctrl_c_token() -> (CancellationToken, tokio::task::JoinHandle<()>) {
    let cancel = CancellationToken::new();
    let handle = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        }
    });
    (cancel, handle)
}

impl App {
    // ========== Workspace Commands ==========

    pub async fn cmd_list(&self) -> Result<()> {
        let ws = self.workspace()?;

        if ws.entries().is_empty() {
            println!("No add-ons found in {}.", collapse_home(ws.root()));
            return Ok(());
        }

        println!("Add-ons in {}:", ws.name());
        println!("{:-<60}", "");
        for (i, entry) in ws.ordered_entries().enumerate() {
            let status = if entry.is_enabled() { "[x]" } else { "[ ]" };
            let group = entry
                .shuffle_group()
                .map(|g| {
                    let chosen = ws.shuffle_choices().get(g) == Some(&entry.name);
                    format!(" <{}{}>", g, if chosen { ", last pick" } else { "" })
                })
                .unwrap_or_default();
            println!("{:>3}. {} {}{}", i + 1, status, entry.name, group);
            if let Some(note) = &entry.metadata.note {
                println!("       {}", note);
            }
        }
        Ok(())
    }

    pub async fn cmd_status(&self) -> Result<()> {
        let ws = self.workspace()?;
        let config = self.ctx.snapshot().await;

        let enabled = ws.entries().iter().filter(|e| e.is_enabled()).count();
        let last_build = ws
            .last_build()
            .map(|t| {
                t.with_timezone(&chrono::Local)
                    .format("%Y-%m-%d %H:%M:%S")
                    .to_string()
            })
            .unwrap_or_else(|| "never".to_string());

        println!("Workspace Status");
        println!("{:-<40}", "");
        println!("Name:        {}", ws.name());
        println!("Root:        {}", collapse_home(ws.root()));
        println!("Add-ons:     {} ({} enabled)", ws.entries().len(), enabled);
        println!("Last build:  {}", last_build);
        match config.destination_dir() {
            Ok(dest) => println!("Deploys to:  {}", collapse_home(&dest)),
            Err(_) => println!("Deploys to:  (game directory not configured)"),
        }

        if !ws.shuffle_choices().is_empty() {
            println!();
            println!("Shuffle picks:");
            for (group, name) in ws.shuffle_choices() {
                println!("  {:<16} {}", group, name);
            }
        }
        Ok(())
    }

    pub async fn cmd_move(&mut self, src: &str, target: &str) -> Result<()> {
        let ws = self.session.current_mut()?;
        let transition = ws
            .request_change_manual_order(MoveRequest::new(src, target))
            .await
            .context("Failed to save manual order")?;

        if transition.changes.is_empty() {
            println!("Order unchanged.");
        } else {
            println!("Moved '{}' to position of '{}':", src, target);
            for (i, name) in transition.snapshot.manual_order.iter().enumerate() {
                println!("{:>3}. {}", i + 1, name);
            }
        }
        Ok(())
    }

    pub async fn cmd_export(&self, path: &str) -> Result<()> {
        let list = self
            .session
            .export_list(Path::new(path))
            .await
            .with_context(|| format!("Failed to export add-on list to {}", path))?;
        println!("Exported {} add-ons to {}", list.addons.len(), path);
        Ok(())
    }

    pub async fn cmd_watch(&self) -> Result<()> {
        let ws = self.workspace()?;
        let Some(mut events) = ws.on_fs_changed() else {
            bail!("Filesystem watching is unavailable for {}", ws.root().display());
        };

        println!("Watching {} (Ctrl-C to stop)...", collapse_home(ws.root()));
        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => break,
                event = events.recv() => match event {
                    Ok(event) => {
                        let kind = match event.kind {
                            FsEventKind::Created => "created",
                            FsEventKind::Removed => "removed",
                            FsEventKind::Modified => "modified",
                            FsEventKind::Other => "changed",
                        };
                        for path in &event.paths {
                            println!("  {:<9} {}", kind, collapse_home(path));
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!("Dropped {} filesystem events", skipped);
                    }
                    Err(RecvError::Closed) => break,
                },
            }
        }
        Ok(())
    }

    // ========== Deployment Commands ==========

    pub async fn cmd_deploy(&mut self) -> Result<()> {
        println!("Deploying add-ons...");

        let (cancel, ctrl_c) = ctrl_c_token();
        let result = self.session.deploy(&cancel).await;
        ctrl_c.abort();

        let report = match result {
            Ok(report) => report,
            Err(e) if e.is_cancelled() => {
                println!("Deployment cancelled; links created so far were kept.");
                return Ok(());
            }
            Err(e) => return Err(e).context("Deployment failed"),
        };

        println!("Deployment complete:");
        println!("  Old links removed: {}", report.stats.links_removed);
        println!("  Links created:     {}", report.stats.links_created);
        for (group, name) in &report.choices {
            println!("  Group {:<12} -> {}", group, name);
        }
        if !report.stats.history_written {
            println!("  Install history could not be updated.");
        }
        if !report.stats.errors.is_empty() {
            println!("  Errors: {}", report.stats.errors.len());
            for err in &report.stats.errors {
                println!("    - {}", err);
            }
        }
        Ok(())
    }

    pub async fn cmd_cleanup(&self) -> Result<()> {
        let (cancel, ctrl_c) = ctrl_c_token();
        let result = self.session.cleanup(&cancel).await;
        ctrl_c.abort();

        match result {
            Ok(stats) => {
                println!("Removed {} deployed links.", stats.links_removed);
                for err in &stats.errors {
                    println!("  - {}", err);
                }
                Ok(())
            }
            Err(e) if e.is_cancelled() => {
                println!("Cleanup cancelled.");
                Ok(())
            }
            Err(e) => Err(e).context("Cleanup failed"),
        }
    }

    // ========== Settings Commands ==========

    pub async fn cmd_recent(&self) -> Result<()> {
        let config = self.ctx.snapshot().await;
        if config.recent_workspaces.is_empty() {
            println!("No workspaces opened yet.");
            return Ok(());
        }

        println!("Recent workspaces:");
        for (i, root) in config.recent_workspaces.iter().enumerate() {
            println!("{:>3}. {}", i + 1, root);
        }
        Ok(())
    }

    pub async fn cmd_config_show(&self) -> Result<()> {
        let config = self.ctx.snapshot().await;

        println!("Configuration");
        println!("{:-<40}", "");
        println!("Config file:   {}", config.paths.config_file().display());
        println!("Log file:      {}", config.paths.log_file().display());
        println!(
            "Game dir:      {}",
            config.game_dir.as_deref().unwrap_or("(not set)")
        );
        println!("Add-ons dir:   {}", config.deployment.addons_subdir);
        println!("Link tag:      {}", config.deployment.link_tag);
        println!(
            "Archives:      *.{} (manifests *.{})",
            config.addons.archive_extension, config.addons.manifest_extension
        );
        Ok(())
    }

    pub async fn cmd_config_set_game_dir(&self, path: &str) -> Result<()> {
        let path = path.trim();
        if path.is_empty() {
            bail!("Game directory cannot be empty");
        }

        let expanded = crate::config::expand_home(path);
        if !expanded.is_dir() {
            bail!("Game directory does not exist: {}", expanded.display());
        }

        self.ctx.set_game_dir(&expanded).await?;
        let dest = self.ctx.snapshot().await.destination_dir()?;
        println!("Game directory set. Add-ons will deploy to {}", collapse_home(&dest));
        if !dest.is_dir() {
            println!("Warning: {} does not exist yet.", dest.display());
        }
        Ok(())
    }
}
