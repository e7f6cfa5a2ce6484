//! Repozo Runner - Main entry point
//!
//! Backs up a Data.fs with repozo and removes backups beyond the keep count.

use anyhow::Result;
use clap::{Parser, Subcommand};
use repozo_runner::{config::Config, runner, utils, PrunePlan};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run repozo, then remove old backups
    Backup {
        /// Force a full backup
        #[arg(long)]
        full: bool,

        /// Number of full backups to keep, 0 keeps everything (overrides config)
        #[arg(short, long)]
        keep: Option<usize>,

        /// Skip removing old backups after the run
        #[arg(long)]
        no_prune: bool,

        /// Kill repozo after this many seconds (overrides config)
        #[arg(long, value_name = "SECS")]
        timeout: Option<u64>,
    },

    /// Remove old backups without running repozo
    Cleanup {
        /// Number of full backups to keep, 0 keeps everything (overrides config)
        #[arg(short, long)]
        keep: Option<usize>,

        /// Only list what would be removed
        #[arg(long)]
        dry_run: bool,
    },

    /// Print the repozo arguments for the configured backup
    Args {
        /// Force a full backup
        #[arg(long)]
        full: bool,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration
    let mut config = if let Some(config_path) = &args.config {
        Config::from_file(config_path)?
    } else {
        Config::default()
    };

    // Initialize logging
    let log_level = args.log_level.as_deref().unwrap_or(&config.log.level);
    utils::logger::init(log_level)?;

    tracing::debug!("Starting repozo-runner v{}", env!("CARGO_PKG_VERSION"));

    match args.command {
        Command::Backup {
            full,
            keep,
            no_prune,
            timeout,
        } => {
            config.backup.full |= full;
            if let Some(keep) = keep {
                config.backup.keep = keep;
            }
            if timeout.is_some() {
                config.backup.timeout_secs = timeout;
            }
            config.validate()?;

            let summary = runner::run_backup(&config.backup, !no_prune).await?;
            if let Some(report) = summary.pruned {
                if !report.failed.is_empty() {
                    tracing::warn!("{} old backup(s) could not be removed", report.failed.len());
                }
            }
        }
        Command::Cleanup { keep, dry_run } => {
            if let Some(keep) = keep {
                config.backup.keep = keep;
            }

            if dry_run {
                match runner::plan_cleanup(&config.backup)? {
                    PrunePlan::Skip(reason) => println!("Nothing to remove: {}.", reason),
                    PrunePlan::Prune {
                        oldest_kept,
                        to_delete,
                        ..
                    } => {
                        println!("Oldest backup to keep: {}", oldest_kept.filename);
                        for entry in to_delete {
                            println!("would remove {}", entry.path.display());
                        }
                    }
                }
            } else {
                let report = runner::run_cleanup(&config.backup)?;
                if !report.failed.is_empty() {
                    tracing::warn!("{} old backup(s) could not be removed", report.failed.len());
                }
            }
        }
        Command::Args { full } => {
            config.backup.full |= full;
            let args = runner::backup_request(&config.backup).arguments()?;
            println!("{}", args);
        }
    }

    Ok(())
}
