//! Package mount errors.

use std::path::PathBuf;

use thiserror::Error;

use super::AssetIndexError;

/// Terminal reasons a package failed to mount.
#[derive(Debug, Error)]
pub enum MountError {
    /// The content directory holds no archives.
    #[error("No archives found for {package} in {content_dir}")]
    NoArchives { package: String, content_dir: PathBuf },

    /// Archives exist but none of them could be mounted.
    #[error("None of the archives for {package} in {content_dir} could be mounted")]
    NoMountedArchives { package: String, content_dir: PathBuf },

    /// The asset index could not be loaded.
    #[error("Asset index unavailable: {0}")]
    AssetIndex(#[from] AssetIndexError),

    /// The package's storage format differs from the running build's.
    #[error(
        "Storage format mismatch for {package}: package io_store={package_io_store}, build io_store={build_io_store}"
    )]
    StorageFormatMismatch {
        package: String,
        package_io_store: bool,
        build_io_store: bool,
    },

    /// Editor sessions cannot load packages cooked for the container format.
    #[error("{package} uses the container storage format, which the editor cannot load")]
    EditorStorageFormat { package: String },
}
