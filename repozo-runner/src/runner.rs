//! One backup run: invoke repozo, then clean up the backup location.

use tracing::info;

use crate::config::BackupConfig;
use crate::executor::{BackupRequest, ExecutionOutcome, RepozoExecutor};
use crate::retention::{self, PrunePlan, PruneReport};
use crate::utils::Result;

/// What happened during [`run_backup`].
#[derive(Debug)]
pub struct RunSummary {
    pub outcome: ExecutionOutcome,
    /// `None` when pruning was switched off for this run
    pub pruned: Option<PruneReport>,
}

pub fn backup_request(settings: &BackupConfig) -> BackupRequest {
    BackupRequest::new(&settings.datafs, &settings.location).full(settings.full)
}

/// Back up `settings.datafs` and, if repozo succeeded and `prune` is set,
/// remove old backups according to the configured keep count.
///
/// A failing repozo run is returned as an error and nothing is pruned.
pub async fn run_backup(settings: &BackupConfig, prune: bool) -> Result<RunSummary> {
    let args = backup_request(settings).arguments()?;
    let executor = RepozoExecutor::locate(&settings.bin_dir)?.with_timeout(settings.timeout());

    info!(
        "Backing up database file: {} to {}...",
        settings.datafs.display(),
        settings.location.display()
    );
    let outcome = executor.run(&args).await?.ensure_success()?;

    let pruned = if prune {
        Some(retention::prune(&settings.location, settings.retention_policy())?)
    } else {
        None
    };

    Ok(RunSummary { outcome, pruned })
}

/// Prune the backup location without running a backup.
pub fn run_cleanup(settings: &BackupConfig) -> Result<PruneReport> {
    retention::prune(&settings.location, settings.retention_policy())
}

/// Show what [`run_cleanup`] would delete.
pub fn plan_cleanup(settings: &BackupConfig) -> Result<PrunePlan> {
    retention::plan(&settings.location, settings.retention_policy())
}
