use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use stobo::{App, Config};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "stobo")]
#[command(
    author,
    version,
    about = "A workspace-based add-on manager that deploys archives via symlinks"
)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Workspace directory (defaults to the most recently opened one)
    #[arg(short, long, global = true)]
    workspace: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List add-ons in manual order
    List,

    /// Show workspace status
    Status,

    /// Move an add-on to another add-on's position
    Move {
        /// Add-on to move
        src: String,
        /// Add-on whose position it takes
        target: String,
    },

    /// Clean up old links and deploy the workspace
    Deploy,

    /// Remove every deployed link
    Cleanup,

    /// Export the add-on list as JSON
    Export { path: String },

    /// List recently opened workspaces
    Recent,

    /// Print external changes to the workspace until interrupted
    Watch,

    /// Manage settings
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show current settings
    Show,
    /// Set the game installation directory
    SetGameDir { path: String },
}

impl Commands {
    fn needs_workspace(&self) -> bool {
        matches!(
            self,
            Commands::List
                | Commands::Status
                | Commands::Move { .. }
                | Commands::Deploy
                | Commands::Export { .. }
                | Commands::Watch
        )
    }
}

fn setup_logging(log_file: &Path, verbosity: u8, also_stderr: bool) -> Result<()> {
    let filter = match verbosity {
        0 => "stobo=info",
        1 => "stobo=debug",
        2 => "stobo=trace",
        _ => "trace",
    };

    if let Some(dir) = log_file.parent() {
        std::fs::create_dir_all(dir).ok();
    }
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)
        .with_context(|| format!("Failed to open log file {}", log_file.display()))?;

    let env_filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into());
    let file_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_ansi(false)
        .with_writer(std::sync::Arc::new(file));

    if also_stderr {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(file_layer)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(file_layer)
            .init();
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load().await?;

    // Watch output goes to stdout; keep log lines off the terminal there
    let interactive = matches!(cli.command, Commands::Watch);
    setup_logging(&config.paths.log_file(), cli.verbose, !interactive)?;

    // Initialize app
    let mut app = App::new(config).await?;
    if cli.command.needs_workspace() {
        app.open_workspace(cli.workspace.as_deref()).await?;
    }

    match cli.command {
        Commands::List => app.cmd_list().await?,
        Commands::Status => app.cmd_status().await?,
        Commands::Move { src, target } => app.cmd_move(&src, &target).await?,
        Commands::Deploy => app.cmd_deploy().await?,
        Commands::Cleanup => app.cmd_cleanup().await?,
        Commands::Export { path } => app.cmd_export(&path).await?,
        Commands::Recent => app.cmd_recent().await?,
        Commands::Watch => app.cmd_watch().await?,
        Commands::Config { action } => match action {
            ConfigCommands::Show => app.cmd_config_show().await?,
            ConfigCommands::SetGameDir { path } => app.cmd_config_set_game_dir(&path).await?,
        },
    }

    Ok(())
}
