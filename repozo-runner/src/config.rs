//! Configuration management for the repozo runner.
//!
//! Loads configuration from a TOML file. Every key is optional; missing keys
//! fall back to the defaults of a standard buildout layout.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::retention::RetentionPolicy;
use crate::utils::{Result, RunnerError};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub backup: BackupConfig,

    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupConfig {
    /// Directory containing the `repozo` executable
    #[serde(default = "default_bin_dir")]
    pub bin_dir: PathBuf,

    /// Database file to back up
    #[serde(default = "default_datafs")]
    pub datafs: PathBuf,

    /// Directory repozo writes backups into
    #[serde(default = "default_location")]
    pub location: PathBuf,

    /// Number of full backups to keep (0 = never remove anything)
    #[serde(default = "default_keep")]
    pub keep: usize,

    /// Force a full backup instead of an incremental one
    #[serde(default)]
    pub full: bool,

    /// Kill repozo if it runs longer than this many seconds
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Default values
fn default_bin_dir() -> PathBuf {
    PathBuf::from("bin")
}

fn default_datafs() -> PathBuf {
    PathBuf::from("var/filestorage/Data.fs")
}

fn default_location() -> PathBuf {
    PathBuf::from("var/backups")
}

fn default_keep() -> usize {
    2
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            bin_dir: default_bin_dir(),
            datafs: default_datafs(),
            location: default_location(),
            keep: default_keep(),
            full: false,
            timeout_secs: None,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            RunnerError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| RunnerError::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.backup.bin_dir.as_os_str().is_empty() {
            return Err(RunnerError::Config("backup.bin_dir must not be empty".into()));
        }
        if self.backup.timeout_secs == Some(0) {
            return Err(RunnerError::Config(
                "backup.timeout_secs must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}

impl BackupConfig {
    pub fn retention_policy(&self) -> RetentionPolicy {
        RetentionPolicy::new(self.keep)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}
