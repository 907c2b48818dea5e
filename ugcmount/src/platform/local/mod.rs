//! In-process host implementations.
//!
//! [`LocalHost`] wires one of each local implementation into a
//! [`HostServices`] bundle and keeps typed handles to them for inspection.
//!
//! # Example
//!
//! ```
//! use ugcmount::platform::local::LocalHost;
//! use ugcmount::platform::HostEnvironment;
//!
//! let host = LocalHost::new(HostEnvironment::default());
//! assert!(host.services.files.is_archive_installed());
//!
//! let editor = LocalHost::new(HostEnvironment::editor(Default::default()));
//! assert!(!editor.services.files.is_archive_installed());
//! ```

mod archive;
mod assets;
mod plugins;
mod shaders;
mod streaming;

pub use archive::{write_archive, LocalArchiveFileSystem, MountRecord, ARCHIVE_MAGIC};
pub use assets::{LocalAssetRegistry, LocalPrimaryAssetDirectory};
pub use plugins::{LocalPlugin, LocalPluginManager};
pub use shaders::LocalShaderLibrary;
pub use streaming::LocalStreamableLoader;

use std::sync::Arc;

use super::{
    HostEnvironment, HostServices, MountPointTable, PhysicalPlatformFile, PlatformFileManager,
    PrimaryAssetDirectory,
};

/// Local host services plus typed handles to each implementation.
pub struct LocalHost {
    pub services: HostServices,
    pub archives: Arc<LocalArchiveFileSystem>,
    pub plugins: Arc<LocalPluginManager>,
    pub mount_points: Arc<MountPointTable>,
    pub asset_registry: Arc<LocalAssetRegistry>,
    pub primary_assets: Arc<LocalPrimaryAssetDirectory>,
    pub loader: Arc<LocalStreamableLoader>,
    pub shaders: Arc<LocalShaderLibrary>,
}

impl LocalHost {
    /// Runtime hosts start with the archive layer installed; editor hosts
    /// install it on demand.
    pub fn new(environment: HostEnvironment) -> Self {
        let archives = Arc::new(LocalArchiveFileSystem::new());
        let files = if environment.is_editor {
            PlatformFileManager::new(Arc::new(PhysicalPlatformFile), Some(archives.clone()))
        } else {
            PlatformFileManager::with_archive_installed(Arc::new(PhysicalPlatformFile), archives.clone())
        };
        Self::assemble(environment, files, archives)
    }

    /// Host whose platform cannot provide an archive layer.
    pub fn without_archive_support(environment: HostEnvironment) -> Self {
        let archives = Arc::new(LocalArchiveFileSystem::new());
        let files = PlatformFileManager::new(Arc::new(PhysicalPlatformFile), None);
        Self::assemble(environment, files, archives)
    }

    /// Replace the primary asset directory, e.g. to mark config-covered types.
    pub fn with_primary_assets(mut self, primary_assets: LocalPrimaryAssetDirectory) -> Self {
        let primary_assets = Arc::new(primary_assets);
        self.services.primary_assets = Arc::clone(&primary_assets) as Arc<dyn PrimaryAssetDirectory>;
        self.primary_assets = primary_assets;
        self
    }

    fn assemble(
        environment: HostEnvironment,
        files: PlatformFileManager,
        archives: Arc<LocalArchiveFileSystem>,
    ) -> Self {
        let mount_points = Arc::new(MountPointTable::new());
        let plugins = Arc::new(LocalPluginManager::new(Arc::clone(&mount_points)));
        let asset_registry = Arc::new(LocalAssetRegistry::new());
        let primary_assets = Arc::new(LocalPrimaryAssetDirectory::new(Arc::clone(&asset_registry)));
        let loader = Arc::new(LocalStreamableLoader::new(Arc::clone(&mount_points)));
        let shaders = Arc::new(LocalShaderLibrary::new());

        let services = HostServices::new(
            Arc::new(files),
            plugins.clone(),
            Arc::clone(&mount_points),
            asset_registry.clone(),
            primary_assets.clone(),
            loader.clone(),
            shaders.clone(),
            environment,
        );

        Self {
            services,
            archives,
            plugins,
            mount_points,
            asset_registry,
            primary_assets,
            loader,
            shaders,
        }
    }
}
