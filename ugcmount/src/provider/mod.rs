//! UGC providers.
//!
//! A provider tells the registry where installed UGC lives on disk. Each
//! root directory maps to the [`PackageId`](crate::package::PackageId) the provider knows it by, or to
//! `None` for side-loaded content.
//!
//! - [`SideloadProvider`]: every subdirectory of a base directory
//! - [`CompositeProvider`]: the merged view of several providers
//!
//! An [`EnabledStateProvider`] is a separate seam that decides whether an
//! individual mod is switched on.

mod composite;
mod enabled;
mod path_map;
mod sideload;

pub use composite::CompositeProvider;
pub use enabled::{EnabledStateProvider, InMemoryEnabledState};
pub use path_map::PackagePathMap;
pub use sideload::SideloadProvider;

use std::path::PathBuf;

use thiserror::Error;

/// Result type for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Errors reported by providers.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Provider unavailable: {0}")]
    Unavailable(String),

    #[error("Provider failed: {0}")]
    Failed(String),
}

/// Source of installed UGC root directories.
pub trait UgcProvider: Send + Sync {
    /// Prepare the provider. Called once before the first refresh.
    fn initialize(&self) -> ProviderResult<()>;

    fn deinitialize(&self) -> ProviderResult<()>;

    fn is_enabled(&self) -> bool;

    /// Installed root directories and the identifier of each.
    fn installed_paths(&self) -> PackagePathMap;
}
