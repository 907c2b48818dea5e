//! Registry error types.

use thiserror::Error;

use crate::package::MountError;
use crate::provider::ProviderError;

/// Result type for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Errors that can occur while managing UGC packages.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// No provider has been installed.
    #[error("No UGC provider is set")]
    NoProvider,

    /// The installed provider reports itself disabled.
    #[error("UGC provider is not enabled")]
    ProviderDisabled,

    /// The provider failed.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// The plugin was not loaded from the project.
    #[error("Plugin {name} is not project-local content")]
    NotProjectLocal { name: String },

    /// The plugin's category does not mark it as UGC.
    #[error("Plugin {name} is not UGC content (category {category:?})")]
    NotUgcContent { name: String, category: String },

    /// Mounting failed. Whatever was acquired has been released again.
    #[error("Failed to mount {name}{}", .source.as_ref().map(|e| format!(": {e}")).unwrap_or_default())]
    MountFailed {
        name: String,
        source: Option<MountError>,
    },
}
