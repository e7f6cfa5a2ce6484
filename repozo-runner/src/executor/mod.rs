//! Runs the external `repozo` tool.
//!
//! The process is spawned with captured output and awaited to completion,
//! optionally bounded by a timeout. Its exit status is returned to the
//! caller as an [`ExecutionOutcome`] so that pruning can be skipped after a
//! failed backup.

pub mod arguments;

pub use arguments::{BackupArguments, BackupRequest};

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::utils::{Result, RunnerError};

/// Name of the executable looked up in the bin directory.
pub const REPOZO_BINARY: &str = "repozo";

/// Handle on a located repozo executable.
#[derive(Debug, Clone)]
pub struct RepozoExecutor {
    binary: PathBuf,
    timeout: Option<Duration>,
}

/// Result of one repozo run.
#[derive(Debug, Clone)]
pub struct ExecutionOutcome {
    /// Exit code, `None` if the process was killed by a signal
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl RepozoExecutor {
    /// Find `repozo` in `bin_dir`.
    pub fn locate(bin_dir: &Path) -> Result<Self> {
        let binary = bin_dir.join(REPOZO_BINARY);
        if !binary.is_file() {
            return Err(RunnerError::ExecutableNotFound(binary));
        }
        Ok(Self {
            binary,
            timeout: None,
        })
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    /// Run repozo with `args` and wait for it to exit.
    ///
    /// Output is captured, never parsed. On timeout the child is killed.
    pub async fn run(&self, args: &BackupArguments) -> Result<ExecutionOutcome> {
        info!("Running {} {}", self.binary.display(), args);

        let child = Command::new(&self.binary)
            .args(args.as_slice())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let output = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, child.wait_with_output()).await {
                Ok(output) => output?,
                Err(_) => {
                    warn!("repozo did not finish within {:?}, killing it", limit);
                    return Err(RunnerError::Timeout(limit));
                }
            },
            None => child.wait_with_output().await?,
        };

        let outcome = ExecutionOutcome {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };

        debug!(
            exit_code = ?outcome.exit_code,
            stdout = %outcome.stdout.trim_end(),
            stderr = %outcome.stderr.trim_end(),
            "repozo finished"
        );

        Ok(outcome)
    }
}

impl ExecutionOutcome {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Turn a failed run into [`RunnerError::BackupExecution`].
    pub fn ensure_success(self) -> Result<Self> {
        if self.success() {
            Ok(self)
        } else {
            Err(RunnerError::BackupExecution {
                code: self.exit_code,
                stderr: self.stderr.trim_end().to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    /// Link `target` into a fresh bin dir under the name `repozo`.
    #[cfg(unix)]
    fn bin_dir_with(target: &str) -> std::io::Result<Option<TempDir>> {
        if !Path::new(target).exists() {
            return Ok(None);
        }
        let dir = TempDir::new()?;
        std::os::unix::fs::symlink(target, dir.path().join(REPOZO_BINARY))?;
        Ok(Some(dir))
    }

    fn args() -> BackupArguments {
        BackupRequest::new("in/Data.fs", "out").arguments().unwrap()
    }

    #[test]
    fn test_locate_missing_binary() -> std::io::Result<()> {
        let dir = TempDir::new()?;
        let err = RepozoExecutor::locate(dir.path()).unwrap_err();
        match err {
            RunnerError::ExecutableNotFound(path) => {
                assert_eq!(path, dir.path().join("repozo"));
            }
            other => panic!("unexpected error: {other}"),
        }
        Ok(())
    }

    #[test]
    fn test_outcome_success() {
        let outcome = ExecutionOutcome {
            exit_code: Some(0),
            stdout: String::new(),
            stderr: String::new(),
        };
        assert!(outcome.success());
        assert!(outcome.ensure_success().is_ok());
    }

    #[test]
    fn test_outcome_failure() {
        let outcome = ExecutionOutcome {
            exit_code: Some(2),
            stdout: String::new(),
            stderr: "cannot open Data.fs\n".to_string(),
        };
        match outcome.ensure_success().unwrap_err() {
            RunnerError::BackupExecution { code, stderr } => {
                assert_eq!(code, Some(2));
                assert_eq!(stderr, "cannot open Data.fs");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_killed_process_is_failure() {
        let outcome = ExecutionOutcome {
            exit_code: None,
            stdout: String::new(),
            stderr: String::new(),
        };
        assert!(!outcome.success());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_successful_tool() -> std::io::Result<()> {
        let Some(bin) = bin_dir_with("/bin/true")? else {
            return Ok(());
        };
        let executor = RepozoExecutor::locate(bin.path()).unwrap();
        let outcome = executor.run(&args()).await.unwrap();
        assert!(outcome.success());
        Ok(())
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_times_out() -> std::io::Result<()> {
        use std::os::unix::fs::PermissionsExt;
        use std::time::Instant;

        if !Path::new("/bin/sh").exists() {
            return Ok(());
        }
        let bin = TempDir::new()?;
        let script = bin.path().join(REPOZO_BINARY);
        std::fs::write(&script, "#!/bin/sh\nsleep 30\n")?;
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755))?;

        let limit = Duration::from_millis(500);
        let executor = RepozoExecutor::locate(bin.path())
            .unwrap()
            .with_timeout(Some(limit));

        let started = Instant::now();
        let mut result = executor.run(&args()).await;
        // A concurrently forked test process can briefly hold the fresh
        // script open for writing (ETXTBSY); try again in that case.
        for _ in 0..5 {
            let busy = matches!(&result, Err(RunnerError::Io(e)) if e.raw_os_error() == Some(26));
            if !busy {
                break;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
            result = executor.run(&args()).await;
        }

        match result {
            Err(RunnerError::Timeout(elapsed)) => assert_eq!(elapsed, limit),
            other => panic!("expected a timeout, got {other:?}"),
        }
        assert!(started.elapsed() < Duration::from_secs(10));
        Ok(())
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_failing_tool() -> std::io::Result<()> {
        let Some(bin) = bin_dir_with("/bin/false")? else {
            return Ok(());
        };
        let executor = RepozoExecutor::locate(bin.path())
            .unwrap()
            .with_timeout(Some(Duration::from_secs(30)));
        let outcome = executor.run(&args()).await.unwrap();
        assert_eq!(outcome.exit_code, Some(1));
        assert!(matches!(
            outcome.ensure_success(),
            Err(RunnerError::BackupExecution { code: Some(1), .. })
        ));
        Ok(())
    }
}
