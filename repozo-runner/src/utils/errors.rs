//! Custom error types for the repozo runner.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("Missing locations.")]
    MissingLocation,

    #[error("repozo executable not found: {}", .0.display())]
    ExecutableNotFound(PathBuf),

    #[error("Backup failed ({}): {stderr}", exit_description(.code))]
    BackupExecution { code: Option<i32>, stderr: String },

    #[error("Backup did not finish within {0:?}")]
    Timeout(Duration),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn exit_description(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {}", code),
        None => "terminated by signal".to_string(),
    }
}

pub type Result<T> = std::result::Result<T, RunnerError>;
