//! Repozo Runner Library
//!
//! Runs `repozo` backups of a ZODB `Data.fs` and prunes old backups from the
//! backup location by a retention count.

pub mod config;
pub mod executor;
pub mod fs;
pub mod retention;
pub mod runner;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use executor::{BackupArguments, BackupRequest, ExecutionOutcome, RepozoExecutor};
pub use retention::{PrunePlan, PruneReport, RetentionPolicy};
pub use utils::errors::RunnerError;
pub type Result<T> = std::result::Result<T, RunnerError>;
