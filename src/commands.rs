//! Command-line shell over the launcher core.
//!
//! Every subcommand builds one [`Launcher`] and renders its log sink through
//! `tracing`; none of them touch files or the network directly.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use crate::core::launch::{Launcher, OutputMode};
use crate::core::loaders::import_profile;
use crate::core::platform::Platform;
use crate::core::settings::{default_base_dir, LauncherSettings};
use crate::core::sink::{LogSink, TracingSink};

/// Resolve, download and launch game versions.
#[derive(Debug, Parser)]
#[command(name = "craftpath")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directory holding versions, libraries, assets and caches.
    #[arg(long, env = "CRAFTPATH_BASE_DIR", global = true)]
    pub base_dir: Option<PathBuf>,

    /// Offline player name for this run.
    #[arg(long, global = true)]
    pub username: Option<String>,

    /// Java executable for this run.
    #[arg(long, global = true)]
    pub java: Option<PathBuf>,

    /// Maximum heap in MiB for this run.
    #[arg(long, global = true)]
    pub memory: Option<u32>,

    /// Debug-level logging for the launcher itself.
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn base_dir(&self) -> PathBuf {
        self.base_dir.clone().unwrap_or_else(default_base_dir)
    }

    /// Stored settings with this run's flags applied on top.
    pub fn settings(&self) -> LauncherSettings {
        let mut settings = LauncherSettings::load(&self.base_dir());
        if let Some(username) = &self.username {
            settings.username = username.clone();
        }
        if let Some(java) = &self.java {
            settings.java_path = Some(java.clone());
        }
        if let Some(memory) = self.memory {
            settings.max_memory_mb = memory;
        }
        settings
    }
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List versions from the (cached) version list.
    Versions(VersionsArgs),
    /// Download a version without launching it.
    Download(VersionArgs),
    /// Prepare and start a version.
    Launch(LaunchArgs),
    /// Re-hash installed files and delete corrupt ones.
    Verify(VersionArgs),
    /// Install a pre-fetched loader profile JSON.
    Import(ImportArgs),
    /// Version list cache maintenance.
    #[command(subcommand)]
    Cache(CacheCommand),
    /// Show or persist launcher settings.
    #[command(subcommand)]
    Settings(SettingsCommand),
}

#[derive(Debug, Args)]
pub struct VersionsArgs {
    /// Only show this type (release, snapshot, old_beta, ...).
    #[arg(long = "type")]
    pub version_type: Option<String>,

    /// Ignore the cache and fetch the list again.
    #[arg(long)]
    pub refresh: bool,
}

#[derive(Debug, Args)]
pub struct VersionArgs {
    pub id: String,
}

#[derive(Debug, Args)]
pub struct LaunchArgs {
    pub id: String,

    /// Wait for the game to exit, streaming its output.
    #[arg(long)]
    pub wait: bool,

    /// Print the command as JSON instead of starting the game.
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Debug, Args)]
pub struct ImportArgs {
    pub profile: PathBuf,
}

#[derive(Debug, Subcommand)]
pub enum CacheCommand {
    /// Delete the cached version list.
    Clear,
}

#[derive(Debug, Subcommand)]
pub enum SettingsCommand {
    /// Print the effective settings.
    Show,
    /// Write the effective settings to the base directory.
    Save,
}

pub async fn execute(cli: Cli) -> Result<()> {
    let base_dir = cli.base_dir();
    let settings = cli.settings();
    let sink: Arc<dyn LogSink> = Arc::new(TracingSink);

    match cli.command {
        Commands::Settings(SettingsCommand::Show) => {
            println!("{}", serde_json::to_string_pretty(&settings)?);
            return Ok(());
        }
        Commands::Settings(SettingsCommand::Save) => {
            let path = settings.save(&base_dir)?;
            println!("Settings written to {}", path.display());
            return Ok(());
        }
        _ => {}
    }

    let launcher = Launcher::new(&base_dir, settings, Platform::current(), Arc::clone(&sink))
        .with_context(|| format!("cannot use base directory {}", base_dir.display()))?;

    match cli.command {
        Commands::Versions(args) => {
            let versions = if args.refresh {
                launcher.refresh_versions().await?
            } else {
                launcher.available_versions().await?
            };
            for version in versions
                .iter()
                .filter(|v| args.version_type.as_deref().map_or(true, |t| v.version_type == t))
            {
                println!("{:<24} {:<10} {}", version.id, version.version_type, version.release_time);
            }
        }
        Commands::Download(args) => {
            launcher
                .install_version(&args.id)
                .await
                .with_context(|| format!("download of {} failed", args.id))?;
        }
        Commands::Launch(args) => {
            if args.dry_run {
                let prepared = launcher.prepare(&args.id).await?;
                println!("{}", serde_json::to_string_pretty(&prepared)?);
                return Ok(());
            }

            let output = if args.wait {
                OutputMode::Forward(Arc::clone(&sink))
            } else {
                OutputMode::Inherit
            };
            let handle = launcher
                .launch(&args.id, output)
                .await
                .with_context(|| format!("launch of {} failed", args.id))?;

            if args.wait {
                let status = handle.wait().await?;
                if !status.success() {
                    anyhow::bail!("game exited with {status}");
                }
            }
        }
        Commands::Verify(args) => {
            let removed = launcher.verify_version(&args.id).await?;
            for path in &removed {
                println!("removed {}", path.display());
            }
        }
        Commands::Import(args) => {
            let version = import_profile(launcher.layout(), &args.profile).await?;
            println!("Imported {}", version.id);
        }
        Commands::Cache(CacheCommand::Clear) => {
            launcher.catalog().cache().clear_cache()?;
            println!("Version cache cleared");
        }
        Commands::Settings(_) => {}
    }

    Ok(())
}
