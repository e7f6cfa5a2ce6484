//! Retention of full backups in the backup location.
//!
//! Only full backups (`*.fs`) decide how far back to keep: the modification
//! time of the oldest full backup still within the keep count becomes the
//! cut-off, and *every* file older than that is removed. Incremental files
//! depend on the full backup they were made against, so they go with it.

use chrono::{DateTime, Local};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, info, warn};

use crate::fs::{list_backup_files, BackupFileEntry};
use crate::utils::Result;

/// How many full backups to keep.
///
/// A keep count of 0 disables retention management altogether; it does not
/// mean "keep no backups".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    keep_count: usize,
}

impl RetentionPolicy {
    pub fn new(keep_count: usize) -> Self {
        Self { keep_count }
    }

    pub fn disabled() -> Self {
        Self::new(0)
    }

    pub fn keep_count(&self) -> usize {
        self.keep_count
    }

    pub fn is_disabled(&self) -> bool {
        self.keep_count == 0
    }
}

/// Why nothing is removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Keep count is 0
    Disabled,
    /// Not more full backups than the keep count
    WithinLimit { full_backups: usize, keep_count: usize },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Disabled => write!(
                f,
                "max # of backups is 0, so that is a sign to us to not remove backups"
            ),
            SkipReason::WithinLimit {
                full_backups,
                keep_count,
            } => write!(f, "#backups ({}) <= than max ({})", full_backups, keep_count),
        }
    }
}

/// What a prune pass is going to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrunePlan {
    Skip(SkipReason),
    Prune {
        keep_count: usize,
        /// Oldest full backup that survives; its mtime is the cut-off
        oldest_kept: BackupFileEntry,
        /// Files strictly older than the cut-off, oldest first
        to_delete: Vec<BackupFileEntry>,
    },
}

/// Outcome of applying a [`PrunePlan`].
#[derive(Debug, Default)]
pub struct PruneReport {
    pub deleted: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, String)>,
}

impl PrunePlan {
    pub fn to_delete(&self) -> &[BackupFileEntry] {
        match self {
            PrunePlan::Skip(_) => &[],
            PrunePlan::Prune { to_delete, .. } => to_delete,
        }
    }
}

/// Decide which of `entries` to delete under `policy`.
pub fn plan_prune(entries: Vec<BackupFileEntry>, policy: RetentionPolicy) -> PrunePlan {
    if policy.is_disabled() {
        return PrunePlan::Skip(SkipReason::Disabled);
    }
    let keep_count = policy.keep_count();

    let mut full_backups: Vec<&BackupFileEntry> =
        entries.iter().filter(|e| e.is_full_backup()).collect();
    debug!(
        "Filtered out full backups (*.fs): {:?}.",
        full_backups.iter().map(|e| &e.filename).collect::<Vec<_>>()
    );

    if full_backups.len() <= keep_count {
        return PrunePlan::Skip(SkipReason::WithinLimit {
            full_backups: full_backups.len(),
            keep_count,
        });
    }

    // Newest first; equal mtimes fall back to the name, which for repozo's
    // timestamped file names is the creation order.
    full_backups.sort_by(|a, b| {
        b.modified
            .cmp(&a.modified)
            .then_with(|| b.filename.cmp(&a.filename))
    });
    debug!(
        "Full backups, sorted by date, newest first: {:?}.",
        full_backups.iter().map(|e| &e.filename).collect::<Vec<_>>()
    );

    let oldest_kept = full_backups[keep_count - 1].clone();
    let last_date_to_keep = oldest_kept.modified;
    debug!(
        "Oldest backup to keep: {} (from {}).",
        oldest_kept.filename,
        format_time(last_date_to_keep)
    );

    let mut to_delete: Vec<BackupFileEntry> = entries
        .into_iter()
        .filter(|e| e.modified < last_date_to_keep)
        .collect();
    to_delete.sort_by(|a, b| {
        a.modified
            .cmp(&b.modified)
            .then_with(|| a.filename.cmp(&b.filename))
    });

    PrunePlan::Prune {
        keep_count,
        oldest_kept,
        to_delete,
    }
}

/// List `backup_location` and plan a prune pass without touching anything.
pub fn plan(backup_location: &Path, policy: RetentionPolicy) -> Result<PrunePlan> {
    if policy.is_disabled() {
        return Ok(PrunePlan::Skip(SkipReason::Disabled));
    }

    let entries = list_backup_files(backup_location)?;
    debug!(
        "Looked up filenames in the target dir: {} found. {:?}.",
        entries.len(),
        entries.iter().map(|e| &e.filename).collect::<Vec<_>>()
    );
    debug!("Max number of backups: {}.", policy.keep_count());

    Ok(plan_prune(entries, policy))
}

/// Remove old backups from `backup_location` so that at most
/// `policy.keep_count()` full backups remain.
///
/// A keep count of 0 returns immediately without reading the directory.
/// Files that cannot be removed are logged and reported; the pass goes on.
pub fn prune(backup_location: &Path, policy: RetentionPolicy) -> Result<PruneReport> {
    if policy.is_disabled() {
        debug!("Value of 'keep' is 0, we don't want to remove anything.");
        return Ok(PruneReport::default());
    }

    debug!("Trying to clean up old backups in {}.", backup_location.display());
    let plan = plan(backup_location, policy)?;
    Ok(apply(&plan))
}

/// Delete the files a plan selected.
pub fn apply(plan: &PrunePlan) -> PruneReport {
    let mut report = PruneReport::default();

    let (keep_count, to_delete) = match plan {
        PrunePlan::Skip(reason) => {
            log_skip(reason);
            return report;
        }
        PrunePlan::Prune {
            keep_count,
            to_delete,
            ..
        } => (*keep_count, to_delete),
    };

    debug!("There are older backups that we can remove.");
    for entry in to_delete {
        match std::fs::remove_file(&entry.path) {
            Ok(()) => {
                debug!("Deleted {}.", entry.path.display());
                report.deleted.push(entry.path.clone());
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("{} was already gone.", entry.path.display());
            }
            Err(e) => {
                warn!(path = %entry.path.display(), error = %e, "Could not remove old backup");
                report.failed.push((entry.path.clone(), e.to_string()));
            }
        }
    }

    info!(
        "Removed old backups, the latest {} full backups have been kept.",
        keep_count
    );
    report
}

fn log_skip(reason: &SkipReason) {
    debug!("Not removing backups.");
    debug!("Reason: {}.", reason);
}

fn format_time(time: SystemTime) -> String {
    DateTime::<Local>::from(time)
        .format("%Y-%m-%d %H:%M:%S%.3f")
        .to_string()
}
