//! Error types for portsweep.
//!
//! Uses `thiserror` for ergonomic error definitions. Only conditions that
//! stop a scan from starting are errors; per-port outcomes (refused,
//! dropped, unreachable) are reported as [`crate::scanner::ProbeResult`]s.

use crate::types::{PortError, TargetError};
use std::path::PathBuf;
use thiserror::Error;

/// Fatal, scan-aborting errors. Raised before any probe is dispatched.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error(transparent)]
    Target(#[from] TargetError),

    #[error(transparent)]
    Ports(#[from] PortError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type alias for scan operations.
pub type ScanResult<T> = Result<T, ScanError>;

/// Errors loading the settings file.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("could not determine configuration directory")]
    DirectoryNotFound,

    #[error("failed to read {path}: {reason}")]
    ReadFailed { path: PathBuf, reason: String },

    #[error("invalid settings file {path}: {reason}")]
    InvalidFormat { path: PathBuf, reason: String },
}

/// Result type alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors persisting a report.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to write report to {path}: {reason}")]
    SaveFailed { path: PathBuf, reason: String },
}

/// Result type alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors building the service-name database.
///
/// None of these stop a scan: the caller falls back to the next source.
#[derive(Error, Debug)]
pub enum ServiceDbError {
    #[error("failed to read {path}: {reason}")]
    ReadFailed { path: PathBuf, reason: String },

    #[error("invalid service data in {path}: {reason}")]
    InvalidFormat { path: PathBuf, reason: String },

    #[error("failed to write {path}: {reason}")]
    WriteFailed { path: PathBuf, reason: String },

    #[error("{0} contains no TCP service entries")]
    Empty(PathBuf),
}

/// Result type alias for service database operations.
pub type ServiceDbResult<T> = Result<T, ServiceDbError>;

/// Top-level errors surfaced by the command-line driver.
#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("output error: {0}")]
    Output(#[from] std::io::Error),
}

impl From<TargetError> for CliError {
    fn from(e: TargetError) -> Self {
        Self::Scan(e.into())
    }
}

impl From<PortError> for CliError {
    fn from(e: PortError) -> Self {
        Self::Scan(e.into())
    }
}

/// Result type alias for CLI operations.
pub type CliResult<T> = Result<T, CliError>;
