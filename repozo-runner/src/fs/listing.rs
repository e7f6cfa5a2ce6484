//! Backup directory listing.
//!
//! Produces one [`BackupFileEntry`] per regular file directly inside the
//! backup location. Entries are read fresh on every call.

use std::path::{Path, PathBuf};
use std::time::SystemTime;
use walkdir::WalkDir;

/// Extension repozo gives full backups.
pub const FULL_BACKUP_EXTENSION: &str = ".fs";

/// A file found in the backup location
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupFileEntry {
    /// File name relative to the backup location
    pub filename: String,

    /// Full path to the file
    pub path: PathBuf,

    /// Last modification time
    pub modified: SystemTime,
}

impl BackupFileEntry {
    pub fn new(path: impl Into<PathBuf>, modified: SystemTime) -> Self {
        let path = path.into();
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            filename,
            path,
            modified,
        }
    }

    /// Is this a full backup (`*.fs`)?
    pub fn is_full_backup(&self) -> bool {
        self.filename.ends_with(FULL_BACKUP_EXTENSION)
    }
}

/// List the regular files in `dir`, without descending into subdirectories.
///
/// Symlinks are followed; broken links are skipped.
///
/// # Returns
/// * `Ok(Vec<BackupFileEntry>)` - Files found, in no particular order
/// * `Err(io::Error)` - If the directory or a file's metadata cannot be read
pub fn list_backup_files(dir: &Path) -> std::io::Result<Vec<BackupFileEntry>> {
    let mut entries = Vec::new();

    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry?;

        if entry.file_type().is_dir() {
            continue;
        }

        // Symlinks are judged by their target: links to directories are
        // skipped, links to files carry the target's mtime.
        let metadata = match std::fs::metadata(entry.path()) {
            Ok(metadata) => metadata,
            Err(_) if entry.path_is_symlink() => continue,
            Err(e) => return Err(e),
        };
        if !metadata.is_file() {
            continue;
        }

        entries.push(BackupFileEntry::new(entry.path(), metadata.modified()?));
    }

    Ok(entries)
}
