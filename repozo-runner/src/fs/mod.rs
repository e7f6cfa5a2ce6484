//! File system helpers for the backup location.

pub mod listing;

pub use listing::{list_backup_files, BackupFileEntry, FULL_BACKUP_EXTENSION};
