//! The UGC package entity and its mount and teardown pipelines.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, enabled, error, info, trace, warn, Level};

use super::{discovery, naming, AssetIndex, MountError, PackageId, PrimaryAssetTypeInfo, UgcMetadata};
use crate::config::PackagingSettings;
use crate::platform::{ArchiveMountOverride, HostServices, LoadHandle, Plugin, PluginManager, PluginRef};

/// Rewrites path strings recorded on a package, e.g. to make them relative
/// for display.
pub type PathSanitizer = dyn Fn(&str) -> String + Send + Sync;

/// Whether a package's archives are mounted and its assets registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MountState {
    #[default]
    Unmounted,
    Mounted,
}

/// Identity of a package: its identifier plus the identity of its plugin.
///
/// Two keys are equal when the ids match and both refer to the same plugin
/// object.
#[derive(Clone)]
pub struct PackageKey {
    id: Option<PackageId>,
    plugin: PluginRef,
}

impl PackageKey {
    pub fn new(id: Option<PackageId>, plugin: PluginRef) -> Self {
        Self { id, plugin }
    }

    pub fn id(&self) -> Option<PackageId> {
        self.id
    }

    pub fn plugin(&self) -> &PluginRef {
        &self.plugin
    }

    fn plugin_addr(&self) -> *const () {
        Arc::as_ptr(&self.plugin).cast::<()>()
    }
}

impl PartialEq for PackageKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.plugin_addr() == other.plugin_addr()
    }
}

impl Eq for PackageKey {}

impl Hash for PackageKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
        (self.plugin_addr() as usize).hash(state);
    }
}

impl fmt::Debug for PackageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PackageKey")
            .field("plugin", &self.plugin.name())
            .field("id", &self.id)
            .finish()
    }
}

/// What a teardown pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeardownReport {
    pub unregistered_rules: usize,
    pub released_metadata: bool,
    pub removed_asset_index: bool,
    pub closed_shader_library: bool,
    pub unmounted_archives: usize,
    pub failed_unmounts: usize,
    pub plugin_unloaded: bool,
    pub plugin_error: Option<String>,
}

impl TeardownReport {
    /// Returns `true` if no sub-step logged a problem.
    pub fn is_clean(&self) -> bool {
        self.failed_unmounts == 0 && self.plugin_error.is_none()
    }

    /// Returns `true` if the pass released anything at all.
    pub fn did_work(&self) -> bool {
        self.unregistered_rules > 0
            || self.released_metadata
            || self.removed_asset_index
            || self.closed_shader_library
            || self.unmounted_archives > 0
            || self.plugin_unloaded
    }

    /// Fold another pass into this one.
    pub fn absorb(&mut self, other: TeardownReport) {
        self.unregistered_rules += other.unregistered_rules;
        self.released_metadata |= other.released_metadata;
        self.removed_asset_index |= other.removed_asset_index;
        self.closed_shader_library |= other.closed_shader_library;
        self.unmounted_archives += other.unmounted_archives;
        self.failed_unmounts += other.failed_unmounts;
        self.plugin_unloaded |= other.plugin_unloaded;
        if other.plugin_error.is_some() {
            self.plugin_error = other.plugin_error;
        }
    }
}

/// One bundle of user generated content hosted by a plugin.
///
/// Created by [`UgcPackage::mount`], which runs the whole mount pipeline.
/// Everything the pipeline registered is undone by
/// [`unload_assets`](Self::unload_assets) followed by
/// [`unmount`](Self::unmount). Both are idempotent.
pub struct UgcPackage {
    plugin: PluginRef,
    id: Option<PackageId>,

    descriptor_path: String,
    package_path: String,
    content_path: String,
    engine_version: String,
    author: String,
    description: String,
    friendly_name: String,

    mount_state: MountState,
    mount_error: Option<MountError>,
    mounted_archives: Vec<PathBuf>,
    asset_index: Option<AssetIndex>,
    metadata: Option<Arc<UgcMetadata>>,
    metadata_handle: Option<Box<dyn LoadHandle>>,
    scanned_rules: Vec<PrimaryAssetTypeInfo>,
    shader_library_open: bool,
}

impl UgcPackage {
    /// Mount the package hosted by `plugin`.
    ///
    /// The plugin must already be enabled and its mount point registered.
    /// Steps, in order:
    ///
    /// 1. Find every archive under the content directory; none is terminal.
    /// 2. Mount each at the plugin's virtual root. Failures are skipped;
    ///    none mounting at all is terminal.
    /// 3. Load `AssetRegistry.bin` and append it to the global registry.
    /// 4. Load the metadata asset, check its storage format and register
    ///    its primary asset scan rules.
    /// 5. Open the plugin's shader library when the build shares shader code.
    ///
    /// A terminal failure leaves the package [`MountState::Unmounted`] with
    /// [`mount_error`](Self::mount_error) set. Whatever was acquired before
    /// the failure is still held and must be torn down.
    ///
    /// # Panics
    ///
    /// Panics if archives exist but the platform has no archive layer.
    pub fn mount(
        plugin: PluginRef,
        id: Option<PackageId>,
        services: &HostServices,
        packaging: &PackagingSettings,
        sanitizer: Option<&PathSanitizer>,
    ) -> Self {
        let mut package = Self::describe(plugin, id, sanitizer);
        let archive_layer = ArchiveMountOverride::acquire(&services.files);

        let content_dir = package.plugin.content_dir();
        let archives = discovery::find_archives(&content_dir);
        if archives.is_empty() {
            error!(package = package.name(), content = %content_dir.display(), "No archives found");
            package.mount_error = Some(MountError::NoArchives {
                package: package.name().to_string(),
                content_dir,
            });
            return package;
        }

        let mount_point = package.plugin.mounted_asset_path();
        for archive in archives {
            if archive_layer.mount(&archive, naming::ARCHIVE_MOUNT_ORDER, &mount_point) {
                debug!(package = package.name(), archive = %archive.display(), "Mounted archive");
                package.mounted_archives.push(archive);
            } else {
                warn!(package = package.name(), archive = %archive.display(), "Failed to mount archive, skipping");
            }
        }
        if package.mounted_archives.is_empty() {
            error!(package = package.name(), content = %content_dir.display(), "No archive could be mounted");
            package.mount_error = Some(MountError::NoMountedArchives {
                package: package.name().to_string(),
                content_dir,
            });
            return package;
        }

        match package.load_assets(services, packaging) {
            Ok(()) => {
                package.mount_state = MountState::Mounted;
                info!(
                    package = package.name(),
                    id = ?package.id,
                    archives = package.mounted_archives.len(),
                    "UGC package mounted"
                );
            }
            Err(e) => {
                error!(package = package.name(), error = %e, "UGC package failed to mount");
                package.mount_error = Some(e);
            }
        }

        package
    }

    fn describe(plugin: PluginRef, id: Option<PackageId>, sanitizer: Option<&PathSanitizer>) -> Self {
        let sanitize = |raw: String| match sanitizer {
            Some(sanitize) => sanitize(&raw),
            None => raw,
        };
        let descriptor = plugin.descriptor();

        Self {
            id: id.and_then(PackageId::into_option),
            descriptor_path: sanitize(plugin.descriptor_file().to_string_lossy().into_owned()),
            package_path: sanitize(naming::package_path_from_mount(&plugin.mounted_asset_path())),
            content_path: sanitize(plugin.content_dir().to_string_lossy().into_owned()),
            engine_version: descriptor.engine_version.clone(),
            author: descriptor.created_by.clone(),
            description: descriptor.description.clone(),
            friendly_name: descriptor.friendly_name.clone(),
            mount_state: MountState::Unmounted,
            mount_error: None,
            mounted_archives: Vec::new(),
            asset_index: None,
            metadata: None,
            metadata_handle: None,
            scanned_rules: Vec::new(),
            shader_library_open: false,
            plugin,
        }
    }

    fn load_assets(&mut self, services: &HostServices, packaging: &PackagingSettings) -> Result<(), MountError> {
        self.load_asset_index(services)?;
        self.register_primary_assets(services, packaging)?;
        self.load_shader_library(services, packaging);
        Ok(())
    }

    fn load_asset_index(&mut self, services: &HostServices) -> Result<(), MountError> {
        let path = self.plugin.base_dir().join(naming::ASSET_INDEX_FILE);
        let index = AssetIndex::load_non_empty(&path)?;

        if enabled!(Level::TRACE) {
            for name in &index.packages {
                trace!(package = self.name(), asset_package = %name, "Indexed package");
            }
            for asset in &index.assets {
                trace!(
                    package = self.name(),
                    object_path = %asset.object_path,
                    class = %asset.asset_class,
                    "Indexed asset"
                );
            }
        }

        services.asset_registry.append_state(&index);
        debug!(
            package = self.name(),
            packages = index.packages.len(),
            assets = index.assets.len(),
            "Registered asset index"
        );
        self.asset_index = Some(index);
        Ok(())
    }

    fn virtual_root(&self) -> String {
        naming::package_path_from_mount(&self.plugin.mounted_asset_path())
    }

    fn register_primary_assets(
        &mut self,
        services: &HostServices,
        packaging: &PackagingSettings,
    ) -> Result<(), MountError> {
        let object_path = UgcMetadata::object_path_for(&self.virtual_root());
        let Some(metadata) = self.load_metadata(&object_path, services) else {
            warn!(package = self.name(), object_path = %object_path, "No UGC metadata, using asset index only");
            return Ok(());
        };
        metadata.log_values();

        if services.environment.is_editor {
            if metadata.io_store_enabled {
                return Err(MountError::EditorStorageFormat {
                    package: self.name().to_string(),
                });
            }
        } else if metadata.io_store_enabled != packaging.use_io_store {
            return Err(MountError::StorageFormatMismatch {
                package: self.name().to_string(),
                package_io_store: metadata.io_store_enabled,
                build_io_store: packaging.use_io_store,
            });
        }

        if metadata.primary_asset_types_to_scan.is_empty() {
            warn!(package = self.name(), "Metadata lists no primary asset types to scan");
            return Ok(());
        }

        let directory = &services.primary_assets;
        let force_synchronous = !services.asset_registry.is_loading_assets();
        for rule in &metadata.primary_asset_types_to_scan {
            let mut rule = rule.clone();
            if !directory.should_scan(&mut rule) {
                debug!(
                    package = self.name(),
                    primary_asset_type = %rule.primary_asset_type,
                    "Scan rule covered by host configuration, skipping"
                );
                continue;
            }

            let found = directory.scan_paths(&rule, force_synchronous);
            directory.invalidate();
            directory.refresh(true);
            debug!(
                package = self.name(),
                primary_asset_type = %rule.primary_asset_type,
                found,
                "Registered primary asset scan rule"
            );
            self.scanned_rules.push(rule);
        }

        Ok(())
    }

    fn load_metadata(&mut self, object_path: &str, services: &HostServices) -> Option<Arc<UgcMetadata>> {
        if !services.loader.package_exists(object_path) {
            return None;
        }
        let mut handle = services.loader.request_async_load(object_path)?;
        handle.wait_until_complete();

        match handle.loaded_asset() {
            Some(metadata) => {
                self.metadata = Some(Arc::clone(&metadata));
                self.metadata_handle = Some(handle);
                Some(metadata)
            }
            None => {
                error!(package = self.name(), object_path, "Metadata asset failed to load");
                handle.release();
                None
            }
        }
    }

    fn load_shader_library(&mut self, services: &HostServices, packaging: &PackagingSettings) {
        if !packaging.share_material_shader_code || !services.environment.uses_shaders() {
            return;
        }
        self.shader_library_open = services.shaders.open_plugin_library(self.plugin.as_ref());
        if !self.shader_library_open {
            debug!(package = self.name(), "No shader library opened");
        }
    }

    /// Undo asset registration: scan rules, metadata, asset index and shader
    /// library.
    pub fn unload_assets(&mut self, services: &HostServices) -> TeardownReport {
        TeardownReport {
            unregistered_rules: self.unregister_primary_assets(services),
            released_metadata: self.release_metadata(services),
            removed_asset_index: self.remove_asset_index(services),
            closed_shader_library: self.unload_shader_library(services),
            ..TeardownReport::default()
        }
    }

    fn unregister_primary_assets(&mut self, services: &HostServices) -> usize {
        if self.scanned_rules.is_empty() {
            trace!(package = self.name(), "No primary asset scan rules to remove");
            return 0;
        }

        let directory = &services.primary_assets;
        let rules = std::mem::take(&mut self.scanned_rules);
        let root = self.virtual_root();
        for rule in &rules {
            directory.remove_scan_paths(rule);
            directory.invalidate();
            directory.refresh(true);

            if enabled!(Level::TRACE) {
                let leftover = directory
                    .primary_asset_ids(&rule.primary_asset_type)
                    .into_iter()
                    .filter(|id| naming::is_under_virtual_root(id, &root))
                    .count();
                if leftover > 0 {
                    error!(
                        package = self.name(),
                        primary_asset_type = %rule.primary_asset_type,
                        leftover,
                        "Primary assets still registered after removing scan rule"
                    );
                }
            }
        }

        debug!(package = self.name(), rules = rules.len(), "Removed primary asset scan rules");
        rules.len()
    }

    fn release_metadata(&mut self, services: &HostServices) -> bool {
        let had_metadata = self.metadata.take().is_some();
        let had_handle = match self.metadata_handle.take() {
            Some(mut handle) => {
                handle.release();
                true
            }
            None => false,
        };
        if !had_metadata && !had_handle {
            return false;
        }

        services.loader.flush_async_loading();
        services.loader.collect_garbage();
        debug!(package = self.name(), "Released metadata");
        true
    }

    fn remove_asset_index(&mut self, services: &HostServices) -> bool {
        match self.asset_index.take() {
            Some(index) => {
                services.asset_registry.remove_state(&index);
                true
            }
            None => false,
        }
    }

    fn unload_shader_library(&mut self, services: &HostServices) -> bool {
        if !std::mem::take(&mut self.shader_library_open) {
            return false;
        }
        services.shaders.close_library(self.plugin.name());
        true
    }

    /// Unmount archives, drop the asset index, drop mount points and unload
    /// the plugin.
    pub fn unmount(&mut self, services: &HostServices) -> TeardownReport {
        let mut report = TeardownReport::default();
        self.unmount_archives(services, &mut report);
        report.removed_asset_index = self.remove_asset_index(services);
        self.detach_plugin(services, &mut report);
        report
    }

    fn unmount_archives(&mut self, services: &HostServices, report: &mut TeardownReport) {
        let archives = std::mem::take(&mut self.mounted_archives);
        if !archives.is_empty() {
            let archive_layer = ArchiveMountOverride::acquire(&services.files);
            for archive in &archives {
                if archive_layer.unmount(archive) {
                    report.unmounted_archives += 1;
                } else {
                    report.failed_unmounts += 1;
                    warn!(package = self.name(), archive = %archive.display(), "Failed to unmount archive");
                }
            }
        }
        self.mount_state = MountState::Unmounted;
    }

    fn detach_plugin(&mut self, services: &HostServices, report: &mut TeardownReport) {
        let root = self.plugin.mounted_asset_path();
        let content = self.plugin.content_dir();
        let mount_points = &services.mount_points;

        // Runtime builds also drop the mount point the plugin manager added.
        if !services.environment.is_editor {
            mount_points.unregister(&root, &content);
        }
        mount_points.unregister(&root, &content);

        if !self.plugin.is_enabled() {
            return;
        }

        let _pause = mount_points.suspend_dismount_events();
        let plugins = &services.plugins;
        for descriptor in discovery::find_descriptors(self.plugin.base_dir()) {
            if let Err(e) = plugins.remove_from_plugins_list(&descriptor) {
                debug!(package = self.name(), error = %e, "Descriptor not in plugin list");
            }
        }

        match plugins.unmount_explicitly_loaded_plugin(self.plugin.name()) {
            Ok(()) => {
                plugins.refresh_plugins_list();
                report.plugin_unloaded = true;
            }
            Err(e) => {
                error!(package = self.name(), error = %e, "Failed to unload plugin");
                report.plugin_error = Some(e.to_string());
            }
        }
    }

    /// Full teardown: [`unload_assets`](Self::unload_assets) then
    /// [`unmount`](Self::unmount).
    pub fn teardown(&mut self, services: &HostServices) -> TeardownReport {
        let mut report = self.unload_assets(services);
        report.absorb(self.unmount(services));
        report
    }

    pub fn key(&self) -> PackageKey {
        PackageKey::new(self.id, Arc::clone(&self.plugin))
    }

    pub fn name(&self) -> &str {
        self.plugin.name()
    }

    pub fn id(&self) -> Option<PackageId> {
        self.id
    }

    pub fn plugin(&self) -> &PluginRef {
        &self.plugin
    }

    pub fn descriptor_path(&self) -> &str {
        &self.descriptor_path
    }

    pub fn package_path(&self) -> &str {
        &self.package_path
    }

    pub fn content_path(&self) -> &str {
        &self.content_path
    }

    pub fn engine_version(&self) -> &str {
        &self.engine_version
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn friendly_name(&self) -> &str {
        &self.friendly_name
    }

    pub fn mount_state(&self) -> MountState {
        self.mount_state
    }

    pub fn is_mounted(&self) -> bool {
        self.mount_state == MountState::Mounted
    }

    /// Why mounting failed, if it did.
    pub fn mount_error(&self) -> Option<&MountError> {
        self.mount_error.as_ref()
    }

    pub fn take_mount_error(&mut self) -> Option<MountError> {
        self.mount_error.take()
    }

    pub fn mounted_archives(&self) -> &[PathBuf] {
        &self.mounted_archives
    }

    pub fn metadata(&self) -> Option<&UgcMetadata> {
        self.metadata.as_deref()
    }

    pub fn asset_index(&self) -> Option<&AssetIndex> {
        self.asset_index.as_ref()
    }

    /// Package names from the asset index.
    pub fn package_names(&self) -> Vec<String> {
        self.asset_index
            .as_ref()
            .map(|index| index.package_names().to_vec())
            .unwrap_or_default()
    }

    /// Primary asset types declared by the metadata.
    pub fn primary_asset_types(&self) -> Vec<String> {
        self.metadata
            .as_ref()
            .map(|metadata| metadata.primary_asset_types())
            .unwrap_or_default()
    }

    /// Scan rules currently registered with the primary asset directory.
    pub fn scanned_rules(&self) -> &[PrimaryAssetTypeInfo] {
        &self.scanned_rules
    }

    pub fn has_shader_library(&self) -> bool {
        self.shader_library_open
    }
}

impl PartialEq for UgcPackage {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for UgcPackage {}

impl Hash for UgcPackage {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl fmt::Debug for UgcPackage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UgcPackage")
            .field("name", &self.name())
            .field("id", &self.id)
            .field("mount_state", &self.mount_state)
            .field("archives", &self.mounted_archives.len())
            .field("has_metadata", &self.metadata.is_some())
            .finish()
    }
}
