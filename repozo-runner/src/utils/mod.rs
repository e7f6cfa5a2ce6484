//! Utility modules for the repozo runner.

pub mod errors;
pub mod logger;

pub use errors::{Result, RunnerError};
