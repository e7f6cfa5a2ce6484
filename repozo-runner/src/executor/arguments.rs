//! Command line assembly for `repozo --backup`.

use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::utils::{Result, RunnerError};

/// A single backup run: what to back up, where to, and whether to force a
/// full backup.
#[derive(Debug, Clone, Default)]
pub struct BackupRequest {
    pub source_path: Option<PathBuf>,
    pub destination_dir: Option<PathBuf>,
    pub full: bool,
}

/// Arguments passed to repozo, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupArguments(Vec<OsString>);

impl BackupRequest {
    pub fn new(source_path: impl Into<PathBuf>, destination_dir: impl Into<PathBuf>) -> Self {
        Self {
            source_path: Some(source_path.into()),
            destination_dir: Some(destination_dir.into()),
            full: false,
        }
    }

    pub fn full(mut self, full: bool) -> Self {
        self.full = full;
        self
    }

    /// Build `--backup -f <source> -r <destination> [-F]`.
    ///
    /// Without `-F` repozo makes an incremental backup when it can.
    pub fn arguments(&self) -> Result<BackupArguments> {
        let (source, destination) = match (
            non_empty(self.source_path.as_deref()),
            non_empty(self.destination_dir.as_deref()),
        ) {
            (Some(source), Some(destination)) => (source, destination),
            _ => return Err(RunnerError::MissingLocation),
        };

        let mut args: Vec<OsString> = vec![
            "--backup".into(),
            "-f".into(),
            source.as_os_str().to_owned(),
            "-r".into(),
            destination.as_os_str().to_owned(),
        ];
        if self.full {
            args.push("-F".into());
        }

        let args = BackupArguments(args);
        debug!("Command used: {}", args);
        Ok(args)
    }
}

fn non_empty(path: Option<&Path>) -> Option<&Path> {
    path.filter(|p| !p.as_os_str().is_empty())
}

impl BackupArguments {
    pub fn as_slice(&self) -> &[OsString] {
        &self.0
    }
}

impl fmt::Display for BackupArguments {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, arg) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_locations() {
        let err = BackupRequest::default().arguments().unwrap_err();
        assert!(matches!(err, RunnerError::MissingLocation));
    }

    #[test]
    fn test_one_location_missing() {
        let request = BackupRequest {
            source_path: Some(PathBuf::from("in/Data.fs")),
            destination_dir: None,
            full: true,
        };
        assert!(matches!(request.arguments(), Err(RunnerError::MissingLocation)));

        let request = BackupRequest {
            source_path: None,
            destination_dir: Some(PathBuf::from("out")),
            full: false,
        };
        assert!(matches!(request.arguments(), Err(RunnerError::MissingLocation)));
    }

    #[test]
    fn test_empty_location_is_missing() {
        let request = BackupRequest::new("", "out");
        assert!(matches!(request.arguments(), Err(RunnerError::MissingLocation)));
    }

    #[test]
    fn test_incremental_arguments() {
        let args = BackupRequest::new("in/Data.fs", "out").arguments().unwrap();
        assert_eq!(args.to_string(), "--backup -f in/Data.fs -r out");
        assert_eq!(args.as_slice().len(), 5);
    }

    #[test]
    fn test_full_arguments() {
        let args = BackupRequest::new("in/Data.fs", "out")
            .full(true)
            .arguments()
            .unwrap();
        assert_eq!(args.to_string(), "--backup -f in/Data.fs -r out -F");
        assert_eq!(args.as_slice().last().unwrap(), "-F");
    }

    #[test]
    fn test_path_with_spaces_stays_one_argument() {
        let args = BackupRequest::new("my data/Data.fs", "out").arguments().unwrap();
        assert_eq!(args.as_slice()[2], OsString::from("my data/Data.fs"));
    }
}
