//! CLI error type.

use std::path::PathBuf;

use thiserror::Error;
use ugcmount::compat::CompatError;
use ugcmount::config::ConfigError;
use ugcmount::logging::LoggingError;
use ugcmount::registry::RegistryError;

/// Errors surfaced to the user. Every variant exits with status 1.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Logging(#[from] LoggingError),

    #[error("Invalid --engine-version: {0}")]
    EngineVersion(CompatError),

    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("Descriptor not found: {0}")]
    DescriptorNotFound(PathBuf),

    #[error("{path} is not compatible: {source}")]
    Incompatible { path: PathBuf, source: CompatError },

    #[error("{0}")]
    Registry(#[from] RegistryError),
}
