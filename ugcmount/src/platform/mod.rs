//! Host engine seams.
//!
//! The registry never touches engine internals directly. Each facility it
//! needs is a trait here, and [`HostServices`] bundles one shared handle per
//! trait. [`local`] implements all of them in-process.
//!
//! | Seam | Trait | Local implementation |
//! |------|-------|----------------------|
//! | File layers | [`PlatformFile`], [`ArchiveFileSystem`] | [`local::LocalArchiveFileSystem`] |
//! | Plugins | [`Plugin`], [`PluginManager`] | [`local::LocalPluginManager`] |
//! | Asset index | [`AssetRegistry`] | [`local::LocalAssetRegistry`] |
//! | Primary assets | [`PrimaryAssetDirectory`] | [`local::LocalPrimaryAssetDirectory`] |
//! | Streaming | [`StreamableLoader`], [`LoadHandle`] | [`local::LocalStreamableLoader`] |
//! | Shaders | [`ShaderLibrary`] | [`local::LocalShaderLibrary`] |

mod archive_override;
mod assets;
mod file_manager;
pub mod local;
mod mount_points;
mod plugin;
mod services;
mod shaders;
mod streaming;

pub use archive_override::ArchiveMountOverride;
pub use assets::{AssetRegistry, PrimaryAssetDirectory};
pub use file_manager::{
    ArchiveFileSystem, Layer, PhysicalPlatformFile, PlatformFile, PlatformFileManager,
    ARCHIVE_LAYER_TYPE, PHYSICAL_LAYER_TYPE,
};
pub use mount_points::{ContentPathDismounted, DismountEventPause, MountPointTable};
pub use plugin::{
    Plugin, PluginDescriptor, PluginError, PluginManager, PluginOrigin, PluginRef, PluginResult,
    UGC_CATEGORY,
};
pub use services::{HostEnvironment, HostServices};
pub use shaders::ShaderLibrary;
pub use streaming::{LoadHandle, StreamableLoader};
