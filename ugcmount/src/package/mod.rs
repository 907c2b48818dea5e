//! UGC packages.
//!
//! A [`UgcPackage`] is one mounted bundle of user generated content: a
//! plugin descriptor, a `Content/` directory of archives, an asset index and
//! optional metadata.
//!
//! # Bundle Layout
//!
//! ```text
//! <Name>/
//! ├── <Name>.uplugin          descriptor
//! ├── AssetRegistry.bin       asset index
//! └── Content/
//!     ├── UgcMetadata.json    metadata asset (optional)
//!     └── Paks/**/*.pak       archives
//! ```
//!
//! # Lifecycle
//!
//! ```text
//! UgcPackage::mount ──► Mounted ──unload_assets──► unmount ──► Unmounted
//!        │
//!        └── failure ──► Unmounted (mount_error() says why)
//! ```
//!
//! Construction never fails outright. Callers inspect
//! [`UgcPackage::mount_state`] and tear down anything that did not mount.

mod asset_index;
mod core;
pub mod discovery;
mod error;
mod id;
mod metadata;
pub mod naming;

pub use asset_index::{AssetIndex, AssetIndexError, AssetRecord, ASSET_INDEX_MAGIC, ASSET_INDEX_VERSION};
pub use self::core::{MountState, PackageKey, PathSanitizer, TeardownReport, UgcPackage};
pub use error::MountError;
pub use id::PackageId;
pub use metadata::{PrimaryAssetTypeInfo, UgcMetadata, METADATA_ASSET_NAME, METADATA_FILE};
pub use naming::{mounted_asset_path, object_path, object_path_to_package_name, package_path_from_mount};
