//! Engine version compatibility checks.
//!
//! A descriptor declares the engine version it was built against in its
//! `EngineVersion` field. [`CompatibilityChecker`] compares that version with
//! the running engine, component by component, according to
//! [`CompatibilitySettings`](crate::config::CompatibilitySettings).

mod check;
mod version;

pub use check::CompatibilityChecker;
pub use version::{EngineVersion, VersionComponent};

use std::path::PathBuf;

use thiserror::Error;

/// Result type for compatibility checks.
pub type CompatResult<T> = Result<T, CompatError>;

/// Reasons a descriptor is rejected.
#[derive(Debug, Error)]
pub enum CompatError {
    #[error("Failed to read descriptor {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse descriptor {path}: {reason}")]
    ParseFailed { path: PathBuf, reason: String },

    #[error("Descriptor {0} does not declare an EngineVersion")]
    MissingEngineVersion(PathBuf),

    #[error("Invalid engine version '{0}'")]
    InvalidVersion(String),

    #[error("Engine {component} mismatch: running {current}, package built for {declared}")]
    Mismatch {
        component: VersionComponent,
        current: String,
        declared: String,
    },
}
