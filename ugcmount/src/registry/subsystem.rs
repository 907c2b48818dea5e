//! The process-wide owner of live UGC packages.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, error, info, trace, warn};

use super::error::{RegistryError, RegistryResult};
use super::features::UgcFeature;
use super::types::{LoadOutcome, RefreshOutcome, RefreshSummary, SkipReason, UnloadOutcome};
use crate::compat::CompatibilityChecker;
use crate::config::UgcSettings;
use crate::events::{EnabledStateChange, HandlerId, Multicast};
use crate::package::{discovery, PackageId, PackageKey, PathSanitizer, UgcPackage};
use crate::platform::{HostServices, Plugin, PluginManager, PluginOrigin, PluginRef};
use crate::provider::{EnabledStateProvider, UgcProvider};

/// Discovers, mounts and tracks UGC packages.
///
/// All operations take `&mut self`; the registry is driven from one thread.
/// Packages are keyed by [`PackageKey`], so at most one package exists per
/// (identifier, plugin) pair.
pub struct UgcRegistry {
    services: HostServices,
    settings: UgcSettings,
    checker: CompatibilityChecker,

    provider: Option<Arc<dyn UgcProvider>>,
    enabled_state: Option<Arc<dyn EnabledStateProvider>>,
    path_sanitizer: Option<Arc<PathSanitizer>>,

    /// Descriptor files of every tracked package.
    loaded_descriptors: HashSet<PathBuf>,
    packages: HashMap<PackageKey, UgcPackage>,
    primary_asset_types: HashMap<PackageKey, Vec<String>>,

    packages_changed: Multicast<()>,
    enabled_state_changed: Multicast<EnabledStateChange>,
}

impl UgcRegistry {
    pub fn new(services: HostServices, settings: UgcSettings) -> Self {
        let checker = CompatibilityChecker::new(
            services.environment.engine_version.clone(),
            settings.compatibility,
        );
        Self {
            services,
            settings,
            checker,
            provider: None,
            enabled_state: None,
            path_sanitizer: None,
            loaded_descriptors: HashSet::new(),
            packages: HashMap::new(),
            primary_asset_types: HashMap::new(),
            packages_changed: Multicast::new(),
            enabled_state_changed: Multicast::new(),
        }
    }

    pub fn with_provider(mut self, provider: Arc<dyn UgcProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Rewrite the path strings recorded on every package loaded from now on.
    pub fn with_path_sanitizer<F>(mut self, sanitizer: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.path_sanitizer = Some(Arc::new(sanitizer));
        self
    }

    pub fn services(&self) -> &HostServices {
        &self.services
    }

    pub fn settings(&self) -> &UgcSettings {
        &self.settings
    }

    pub fn checker(&self) -> &CompatibilityChecker {
        &self.checker
    }

    // ========================================================================
    // Provider lifecycle
    // ========================================================================

    /// Startup hook.
    ///
    /// Initialises the provider when `auto_initialize_provider` is set and the
    /// provider is enabled. Returns whether it did.
    pub fn initialize(&mut self) -> RegistryResult<bool> {
        if self.services.environment.skips_ugc() {
            warn!("Skipping UGC initialization and scan because we are cooking or running a commandlet");
            return Ok(false);
        }
        if !self.settings.auto_initialize_provider || !self.is_provider_enabled() {
            debug!(
                auto_initialize = self.settings.auto_initialize_provider,
                provider_enabled = self.is_provider_enabled(),
                "Not initializing UGC provider"
            );
            return Ok(false);
        }
        self.initialize_provider()?;
        Ok(true)
    }

    pub fn set_provider(&mut self, provider: Option<Arc<dyn UgcProvider>>) {
        self.provider = provider;
    }

    pub fn provider(&self) -> Option<&Arc<dyn UgcProvider>> {
        self.provider.as_ref()
    }

    /// Initialise the provider, then refresh.
    pub fn initialize_provider(&mut self) -> RegistryResult<RefreshOutcome> {
        let provider = self.provider.clone().ok_or(RegistryError::NoProvider)?;
        if let Err(e) = provider.initialize() {
            error!(error = %e, "UGC provider failed to initialize");
            return Err(e.into());
        }
        info!("UGC provider initialized");
        Ok(self.refresh())
    }

    pub fn deinitialize_provider(&self) -> RegistryResult<()> {
        let provider = self.provider.as_ref().ok_or(RegistryError::NoProvider)?;
        match provider.deinitialize() {
            Ok(()) => {
                info!("UGC provider deinitialized");
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "UGC provider failed to deinitialize");
                Err(e.into())
            }
        }
    }

    /// Whether a provider is set and enabled.
    ///
    /// Inside the editor the provider also needs `enable_provider_in_editor`.
    pub fn is_provider_enabled(&self) -> bool {
        let Some(provider) = &self.provider else {
            return false;
        };
        if self.services.environment.is_editor && !self.settings.enable_provider_in_editor {
            return false;
        }
        provider.is_enabled()
    }

    /// Shutdown hook. Deinitialises an enabled provider unless the engine is
    /// already exiting.
    pub fn shutdown(&mut self) {
        if self.services.is_engine_exit_requested() || !self.is_provider_enabled() {
            return;
        }
        if let Err(e) = self.deinitialize_provider() {
            warn!(error = %e, "Provider shutdown incomplete");
        }
    }

    // ========================================================================
    // Refresh
    // ========================================================================

    fn refresh_guard(&self) -> Result<Arc<dyn UgcProvider>, SkipReason> {
        if self.services.environment.skips_ugc() {
            return Err(SkipReason::Cooking);
        }
        let Some(provider) = self.provider.clone() else {
            return Err(SkipReason::NoProvider);
        };
        if !self.is_provider_enabled() {
            return Err(SkipReason::ProviderDisabled);
        }
        Ok(provider)
    }

    /// Rebuild the live set from the provider's installed paths.
    ///
    /// Listeners of [`on_packages_changed`](Self::on_packages_changed) are
    /// notified once at the end whenever the live set changed, including a
    /// pass that only unloaded packages and loaded nothing new.
    ///
    /// # Panics
    ///
    /// Metadata loads are waited on synchronously. With a loader that blocks
    /// on a channel, such as the local one, calling this from inside an
    /// async runtime panics. Drive the registry from a plain thread.
    pub fn refresh(&mut self) -> RefreshOutcome {
        let provider = match self.refresh_guard() {
            Ok(provider) => provider,
            Err(reason) => {
                if reason != SkipReason::Cooking {
                    warn!(reason = %reason, "Skipping UGC refresh");
                }
                return RefreshOutcome::Skipped(reason);
            }
        };

        let mut summary = RefreshSummary::default();
        for key in self.keys() {
            if self.unload_key(&key) {
                summary.unloaded += 1;
            }
        }

        let path_map = provider.installed_paths();
        let roots: Vec<PathBuf> = path_map
            .paths()
            .map(PathBuf::from)
            .filter(|root| self.list_descriptors(root) > 0)
            .collect();
        for root in &roots {
            self.services.plugins.add_plugin_search_path(root, false);
        }

        self.services.plugins.refresh_plugins_list();
        for plugin in self.services.plugins.discovered_plugins() {
            if plugin.is_enabled() {
                continue;
            }
            let id = path_map.resolve(plugin.base_dir()).and_then(|(_, id)| id);
            if self.load_discovered(plugin, id) {
                summary.loaded += 1;
            }
        }

        summary.unmounted_missing = self.unmount_missing();

        if summary.changed() {
            self.packages_changed.broadcast(&());
        }
        info!(
            unloaded = summary.unloaded,
            loaded = summary.loaded,
            unmounted_missing = summary.unmounted_missing,
            live = self.packages.len(),
            "UGC refresh complete"
        );
        RefreshOutcome::Completed(summary)
    }

    /// List the compatible descriptors below `path` with the plugin manager
    /// and register `path` as a search path if any were added.
    ///
    /// Returns the number of descriptors added.
    pub fn add_from_path(&self, path: &Path) -> usize {
        let added = self.list_descriptors(path);
        if added > 0 {
            self.services.plugins.add_plugin_search_path(path, false);
        }
        added
    }

    fn list_descriptors(&self, root: &Path) -> usize {
        info!(path = %root.display(), "Searching for UGC plugins");
        let plugins = &self.services.plugins;
        let mut added = 0;

        for descriptor in discovery::find_descriptors(root) {
            if !self.checker.is_compatible(&descriptor) {
                continue;
            }
            let Some(name) = descriptor.file_stem().map(|s| s.to_string_lossy().into_owned()) else {
                continue;
            };

            if let Some(found) = plugins.find_plugin(&name) {
                if found.descriptor_file() == descriptor {
                    trace!(plugin = %name, "Plugin already discovered");
                } else {
                    error!(
                        plugin = %name,
                        existing = %found.base_dir().display(),
                        rejected = %descriptor.display(),
                        "Plugin already discovered at another path, not adding"
                    );
                }
                continue;
            }

            if plugins.add_to_plugins_list(&descriptor) {
                info!(plugin = %name, descriptor = %descriptor.display(), "Added UGC plugin");
                added += 1;
            }
        }

        added
    }

    fn load_discovered(&mut self, plugin: PluginRef, id: Option<PackageId>) -> bool {
        let name = plugin.name().to_string();
        match self.load(plugin, id) {
            Ok(LoadOutcome::Loaded) => true,
            Ok(LoadOutcome::AlreadyLoaded) => false,
            Err(e @ (RegistryError::NotProjectLocal { .. } | RegistryError::NotUgcContent { .. })) => {
                trace!(plugin = %name, reason = %e, "Ignoring discovered plugin");
                false
            }
            Err(e) => {
                warn!(plugin = %name, error = %e, "Discovered UGC failed to load");
                false
            }
        }
    }

    /// Unmount tracked packages whose descriptor file is gone.
    ///
    /// A refresh unloads everything before reloading, so this only finds
    /// packages loaded while the pass was running, e.g. by a provider or a
    /// plugin manager callback calling [`load`](Self::load).
    fn unmount_missing(&mut self) -> usize {
        let missing: Vec<PackageKey> = self
            .packages
            .iter()
            .filter(|(_, package)| !package.plugin().descriptor_file().exists())
            .map(|(key, _)| key.clone())
            .collect();

        for key in &missing {
            warn!(package = ?key, "Descriptor file missing, unmounting");
            self.unmount_key(key, false);
        }
        missing.len()
    }

    // ========================================================================
    // Load / unload
    // ========================================================================

    /// Mount the package hosted by `plugin` and add it to the live set.
    ///
    /// Loading a descriptor that is already tracked changes nothing. A
    /// failed mount is torn down before the error is returned.
    pub fn load(&mut self, plugin: PluginRef, id: Option<PackageId>) -> RegistryResult<LoadOutcome> {
        if plugin.loaded_from() != PluginOrigin::Project {
            return Err(RegistryError::NotProjectLocal {
                name: plugin.name().to_string(),
            });
        }
        if !plugin.descriptor().is_ugc() {
            return Err(RegistryError::NotUgcContent {
                name: plugin.name().to_string(),
                category: plugin.descriptor().category.clone(),
            });
        }

        let descriptor = plugin.descriptor_file().to_path_buf();
        if self.loaded_descriptors.contains(&descriptor) {
            trace!(descriptor = %descriptor.display(), "UGC plugin already loaded, skipping");
            return Ok(LoadOutcome::AlreadyLoaded);
        }

        debug!(plugin = plugin.name(), descriptor = %descriptor.display(), "Loading UGC plugin");
        self.loaded_descriptors.insert(descriptor.clone());
        self.services.plugins.mount_newly_created_plugin(plugin.name());
        // Registry-owned mount point, removed again at teardown.
        self.services
            .mount_points
            .register(&plugin.mounted_asset_path(), &plugin.content_dir());

        let mut package = UgcPackage::mount(
            Arc::clone(&plugin),
            id,
            &self.services,
            &self.settings.packaging,
            self.path_sanitizer.as_deref(),
        );

        if !package.is_mounted() {
            let source = package.take_mount_error();
            let report = package.teardown(&self.services);
            if !report.is_clean() {
                warn!(plugin = plugin.name(), ?report, "Failed mount left residue");
            }
            self.loaded_descriptors.remove(&descriptor);
            self.services.plugins.refresh_plugins_list();
            return Err(RegistryError::MountFailed {
                name: plugin.name().to_string(),
                source,
            });
        }

        let key = package.key();
        self.primary_asset_types
            .insert(key.clone(), package.primary_asset_types());
        self.packages.insert(key, package);
        Ok(LoadOutcome::Loaded)
    }

    /// Tear `key` down and forget it, without notifying.
    fn unload_key(&mut self, key: &PackageKey) -> bool {
        let Some(mut package) = self.packages.remove(key) else {
            return false;
        };
        debug!(package = package.name(), "Unloading UGC package");

        let report = package.teardown(&self.services);
        if !report.is_clean() {
            warn!(package = package.name(), ?report, "UGC package teardown incomplete");
        }
        self.loaded_descriptors.remove(package.plugin().descriptor_file());
        self.primary_asset_types.remove(key);
        self.services.plugins.refresh_plugins_list();
        true
    }

    /// Unload one package.
    pub fn unload(&mut self, key: &PackageKey) -> UnloadOutcome {
        if self.unload_key(key) {
            self.packages_changed.broadcast(&());
            UnloadOutcome::Unloaded(1)
        } else {
            UnloadOutcome::NotFound
        }
    }

    /// Unload every package carrying `id`.
    pub fn unload_by_id(&mut self, id: PackageId) -> UnloadOutcome {
        let keys = self.keys_with_id(id);
        if keys.is_empty() {
            warn!(%id, "No UGC package to unload for id");
            return UnloadOutcome::NotFound;
        }
        let unloaded = keys.iter().filter(|key| self.unload_key(key)).count();
        self.packages_changed.broadcast(&());
        UnloadOutcome::Unloaded(unloaded)
    }

    /// Unload every live package. Returns how many were unloaded.
    pub fn unload_all(&mut self) -> usize {
        let unloaded = self.keys().iter().filter(|key| self.unload_key(key)).count();
        if unloaded > 0 {
            self.packages_changed.broadcast(&());
        }
        unloaded
    }

    // ========================================================================
    // Unmount
    // ========================================================================

    /// `remove` tears the package down completely and drops it from the live
    /// set. Otherwise only its archives and plugin are unmounted and the
    /// package stays tracked.
    fn unmount_key(&mut self, key: &PackageKey, remove: bool) -> bool {
        if remove {
            return self.unload_key(key);
        }
        let Some(package) = self.packages.get_mut(key) else {
            return false;
        };
        debug!(package = package.name(), "Unmounting UGC package");
        let report = package.unmount(&self.services);
        if !report.is_clean() {
            warn!(package = package.name(), ?report, "UGC package unmount incomplete");
        }
        true
    }

    /// Unmount one package and notify listeners.
    pub fn unmount(&mut self, key: &PackageKey, remove: bool) -> bool {
        let found = self.unmount_key(key, remove);
        if found {
            self.packages_changed.broadcast(&());
        }
        found
    }

    /// Unmount every package carrying `id`. Returns how many matched.
    pub fn unmount_by_id(&mut self, id: PackageId, remove: bool) -> usize {
        let unmounted = self
            .keys_with_id(id)
            .iter()
            .filter(|key| self.unmount_key(key, remove))
            .count();
        if unmounted > 0 {
            self.packages_changed.broadcast(&());
        }
        unmounted
    }

    /// Unmount every live package. Returns how many there were.
    pub fn unmount_all(&mut self, remove: bool) -> usize {
        let unmounted = self
            .keys()
            .iter()
            .filter(|key| self.unmount_key(key, remove))
            .count();
        if unmounted > 0 {
            self.packages_changed.broadcast(&());
        }
        unmounted
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Snapshot of every live key.
    pub fn keys(&self) -> Vec<PackageKey> {
        self.packages.keys().cloned().collect()
    }

    fn keys_with_id(&self, id: PackageId) -> Vec<PackageKey> {
        self.packages
            .keys()
            .filter(|key| key.id() == Some(id))
            .cloned()
            .collect()
    }

    pub fn package(&self, key: &PackageKey) -> Option<&UgcPackage> {
        self.packages.get(key)
    }

    /// First live package carrying `id`. Packages without an id never match.
    pub fn package_by_id(&self, id: PackageId) -> Option<&UgcPackage> {
        self.packages.values().find(|package| package.id() == Some(id))
    }

    /// Look a package up by plugin name.
    pub fn package_by_name(&self, name: &str) -> Option<&UgcPackage> {
        self.packages.values().find(|package| package.name() == name)
    }

    /// Every live package, in no particular order.
    pub fn packages(&self) -> impl Iterator<Item = &UgcPackage> {
        self.packages.values()
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    /// Whether a package for `descriptor` is tracked.
    pub fn is_loaded(&self, descriptor: &Path) -> bool {
        self.loaded_descriptors.contains(descriptor)
    }

    /// Visit live packages until `visit` returns `false`.
    ///
    /// With the enable/disable feature on and an enabled-state provider set,
    /// packages whose id the provider reports disabled are skipped. Packages
    /// without an id are always visited. Returns `false` if enumeration
    /// stopped early.
    pub fn enumerate<F>(&self, mut visit: F) -> bool
    where
        F: FnMut(&UgcPackage) -> bool,
    {
        let policy = if self.is_feature_enabled(UgcFeature::ModEnableDisable) {
            self.enabled_state.as_deref()
        } else {
            None
        };

        for package in self.packages.values() {
            if let (Some(policy), Some(id)) = (policy, package.id()) {
                if !policy.is_enabled(id) {
                    trace!(package = package.name(), %id, "Skipping disabled UGC package");
                    continue;
                }
            }
            if !visit(package) {
                return false;
            }
        }
        true
    }

    /// Package names recorded in the package's asset index.
    pub fn package_names(&self, key: &PackageKey) -> Vec<String> {
        self.packages
            .get(key)
            .map(UgcPackage::package_names)
            .unwrap_or_default()
    }

    /// Primary asset types the package registered when it was loaded.
    pub fn registered_primary_asset_types(&self, key: &PackageKey) -> &[String] {
        self.primary_asset_types
            .get(key)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn is_compatible(&self, descriptor: &Path) -> bool {
        self.checker.is_compatible(descriptor)
    }

    // ========================================================================
    // Features and enabled state
    // ========================================================================

    pub fn is_feature_enabled(&self, feature: UgcFeature) -> bool {
        feature.is_enabled_in(&self.settings)
    }

    /// Install the enabled-state provider. Ignored unless the enable/disable
    /// feature is on.
    pub fn set_enabled_state_provider(&mut self, provider: Option<Arc<dyn EnabledStateProvider>>) {
        if self.is_feature_enabled(UgcFeature::ModEnableDisable) {
            self.enabled_state = provider;
        } else {
            if provider.is_some() {
                debug!("Mod enable/disable feature is off, ignoring enabled-state provider");
            }
            self.enabled_state = None;
        }
    }

    /// Every mod is enabled unless the feature is on and the provider says
    /// otherwise.
    pub fn is_mod_enabled(&self, id: PackageId) -> bool {
        if !self.is_feature_enabled(UgcFeature::ModEnableDisable) {
            return true;
        }
        self.enabled_state
            .as_ref()
            .map_or(true, |provider| provider.is_enabled(id))
    }

    /// Ask the provider to switch a mod on or off. Notifies listeners when
    /// the change is accepted.
    pub fn request_mod_enabled_state_change(&self, id: PackageId, enabled: bool) -> bool {
        if !self.is_feature_enabled(UgcFeature::ModEnableDisable) {
            debug!(%id, "Mod enable/disable feature is off, refusing state change");
            return false;
        }
        let Some(provider) = &self.enabled_state else {
            return false;
        };
        if !provider.request_state_change(id, enabled) {
            return false;
        }
        self.enabled_state_changed
            .broadcast(&EnabledStateChange { id, enabled });
        true
    }

    // ========================================================================
    // Notifications
    // ========================================================================

    pub fn on_packages_changed(&self) -> &Multicast<()> {
        &self.packages_changed
    }

    pub fn on_mod_enabled_state_changed(&self) -> &Multicast<EnabledStateChange> {
        &self.enabled_state_changed
    }

    pub fn add_packages_changed_handler<F>(&self, handler: F) -> HandlerId
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.packages_changed.add(move |_: &()| handler())
    }

    pub fn remove_packages_changed_handler(&self, id: HandlerId) -> bool {
        self.packages_changed.remove(id)
    }

    pub fn add_mod_enabled_state_handler<F>(&self, handler: F) -> HandlerId
    where
        F: Fn(&EnabledStateChange) + Send + Sync + 'static,
    {
        self.enabled_state_changed.add(handler)
    }

    pub fn remove_mod_enabled_state_handler(&self, id: HandlerId) -> bool {
        self.enabled_state_changed.remove(id)
    }
}

impl fmt::Debug for UgcRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UgcRegistry")
            .field("packages", &self.packages.len())
            .field("has_provider", &self.provider.is_some())
            .field("has_enabled_state", &self.enabled_state.is_some())
            .field("environment", &self.services.environment)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CompatibilitySettings;
    use crate::platform::local::LocalHost;
    use crate::platform::HostEnvironment;
    use crate::provider::{InMemoryEnabledState, SideloadProvider};
    use crate::testing::BundleBuilder;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    fn registry_over(host: &LocalHost, root: &Path, settings: UgcSettings) -> UgcRegistry {
        UgcRegistry::new(host.services.clone(), settings)
            .with_provider(Arc::new(SideloadProvider::new(root)))
    }

    fn counter(registry: &UgcRegistry) -> Arc<AtomicUsize> {
        let count = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&count);
        registry.add_packages_changed_handler(move || {
            seen.fetch_add(1, Ordering::SeqCst);
        });
        count
    }

    #[test]
    fn test_refresh_loads_sideloaded_packages() {
        let temp = TempDir::new().unwrap();
        BundleBuilder::new("Red").write(temp.path());
        BundleBuilder::new("Blue").write(temp.path());
        let host = LocalHost::new(HostEnvironment::default());
        let mut registry = registry_over(&host, temp.path(), UgcSettings::default());
        let changes = counter(&registry);

        let summary = registry.refresh().summary().unwrap();

        assert_eq!(summary.loaded, 2);
        assert_eq!(registry.len(), 2);
        assert_eq!(changes.load(Ordering::SeqCst), 1);
        assert!(registry.packages().all(UgcPackage::is_mounted));
        assert!(registry.package_by_name("Red").is_some());
    }

    #[test]
    fn test_refresh_twice_reloads_the_same_set() {
        let temp = TempDir::new().unwrap();
        BundleBuilder::new("Red").write(temp.path());
        let host = LocalHost::new(HostEnvironment::default());
        let mut registry = registry_over(&host, temp.path(), UgcSettings::default());

        registry.refresh();
        let summary = registry.refresh().summary().unwrap();

        assert_eq!(summary.unloaded, 1);
        assert_eq!(summary.loaded, 1);
        assert_eq!(registry.len(), 1);
        assert_eq!(host.archives.mount_count(), 1);
        assert_eq!(host.mount_points.registration_count("/Red/"), 2);
    }

    #[test]
    fn test_unload_only_refresh_notifies_once() {
        let temp = TempDir::new().unwrap();
        let descriptor = BundleBuilder::new("Red").write(temp.path());
        let host = LocalHost::new(HostEnvironment::default());
        let mut registry = registry_over(&host, temp.path(), UgcSettings::default());
        registry.refresh();
        let changes = counter(&registry);

        std::fs::remove_file(&descriptor).unwrap();
        let summary = registry.refresh().summary().unwrap();

        assert_eq!(summary.unloaded, 1);
        assert_eq!(summary.loaded, 0);
        assert!(registry.is_empty());
        assert_eq!(changes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_refresh_skips_without_enabled_provider() {
        let host = LocalHost::new(HostEnvironment::default());
        let mut registry = UgcRegistry::new(host.services.clone(), UgcSettings::default());
        assert_eq!(registry.refresh(), RefreshOutcome::Skipped(SkipReason::NoProvider));

        let cooking = LocalHost::new(HostEnvironment::default().with_cooking(true));
        let temp = TempDir::new().unwrap();
        let mut registry = registry_over(&cooking, temp.path(), UgcSettings::default());
        assert_eq!(registry.refresh(), RefreshOutcome::Skipped(SkipReason::Cooking));

        let editor = LocalHost::new(HostEnvironment::editor(Default::default()));
        let mut registry = registry_over(&editor, temp.path(), UgcSettings::default());
        assert_eq!(
            registry.refresh(),
            RefreshOutcome::Skipped(SkipReason::ProviderDisabled)
        );
    }

    #[test]
    fn test_incompatible_descriptor_is_not_listed() {
        let temp = TempDir::new().unwrap();
        let descriptor = BundleBuilder::new("Old").engine_version("4.27.0").write(temp.path());
        let host = LocalHost::new(HostEnvironment::default());
        let mut registry = registry_over(&host, temp.path(), UgcSettings::default());

        registry.refresh();

        assert!(registry.is_empty());
        assert!(!host.plugins.listed_descriptors().contains(&descriptor));
    }

    #[test]
    fn test_disabled_compatibility_check_accepts_anything() {
        let temp = TempDir::new().unwrap();
        BundleBuilder::new("Old").engine_version("4.27.0").write(temp.path());
        let host = LocalHost::new(HostEnvironment::default());
        let settings = UgcSettings::default().with_compatibility(CompatibilitySettings::disabled());
        let mut registry = registry_over(&host, temp.path(), settings);

        registry.refresh();

        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_non_ugc_plugin_is_rejected() {
        let temp = TempDir::new().unwrap();
        let descriptor = BundleBuilder::new("Tool").category("Editor").write(temp.path());
        let host = LocalHost::new(HostEnvironment::default());
        let mut registry = registry_over(&host, temp.path(), UgcSettings::default());
        host.plugins.add_to_plugins_list(&descriptor);
        host.plugins.refresh_plugins_list();
        let plugin = host.plugins.find_plugin("Tool").unwrap();

        let err = registry.load(plugin.clone(), None).unwrap_err();

        assert!(matches!(err, RegistryError::NotUgcContent { .. }));
        assert!(!plugin.is_enabled());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_failed_mount_is_released() {
        let temp = TempDir::new().unwrap();
        let descriptor = BundleBuilder::new("Empty").archives(0).write(temp.path());
        let host = LocalHost::new(HostEnvironment::default());
        let mut registry = registry_over(&host, temp.path(), UgcSettings::default());
        host.plugins.add_to_plugins_list(&descriptor);
        host.plugins.refresh_plugins_list();
        let plugin = host.plugins.find_plugin("Empty").unwrap();

        let err = registry.load(plugin.clone(), None).unwrap_err();

        assert!(matches!(
            err,
            RegistryError::MountFailed {
                source: Some(crate::package::MountError::NoArchives { .. }),
                ..
            }
        ));
        assert!(registry.is_empty());
        assert!(!registry.is_loaded(&descriptor));
        assert!(!host.mount_points.is_registered("/Empty/"));
        assert!(!plugin.is_enabled());
    }

    #[test]
    fn test_ids_come_from_the_provider_path() {
        let temp = TempDir::new().unwrap();
        let mods = temp.path().join("mods");
        BundleBuilder::new("Red").write(&mods.join("42"));
        let host = LocalHost::new(HostEnvironment::default());

        struct FixedProvider(crate::provider::PackagePathMap);
        impl UgcProvider for FixedProvider {
            fn initialize(&self) -> crate::provider::ProviderResult<()> {
                Ok(())
            }
            fn deinitialize(&self) -> crate::provider::ProviderResult<()> {
                Ok(())
            }
            fn is_enabled(&self) -> bool {
                true
            }
            fn installed_paths(&self) -> crate::provider::PackagePathMap {
                self.0.clone()
            }
        }

        let paths: crate::provider::PackagePathMap = [(
            mods.join("42").to_string_lossy().into_owned(),
            Some(PackageId::new(42)),
        )]
        .into_iter()
        .collect();
        let mut registry = UgcRegistry::new(host.services.clone(), UgcSettings::default())
            .with_provider(Arc::new(FixedProvider(paths)));

        registry.refresh();

        let package = registry.package_by_id(PackageId::new(42)).unwrap();
        assert_eq!(package.name(), "Red");
        assert_eq!(registry.unload_by_id(PackageId::new(42)), UnloadOutcome::Unloaded(1));
        assert_eq!(registry.unload_by_id(PackageId::new(42)), UnloadOutcome::NotFound);
    }

    #[test]
    fn test_unmount_without_remove_keeps_tracking() {
        let temp = TempDir::new().unwrap();
        BundleBuilder::new("Red").write(temp.path());
        let host = LocalHost::new(HostEnvironment::default());
        let mut registry = registry_over(&host, temp.path(), UgcSettings::default());
        registry.refresh();
        let key = registry.keys().remove(0);
        let changes = counter(&registry);

        assert!(registry.unmount(&key, false));

        assert_eq!(changes.load(Ordering::SeqCst), 1);
        let package = registry.package(&key).unwrap();
        assert!(!package.is_mounted());
        assert!(package.asset_index().is_none());
        assert_eq!(host.archives.mount_count(), 0);
        assert_eq!(host.asset_registry.asset_count(), 0);

        assert_eq!(registry.unload(&key), UnloadOutcome::Unloaded(1));
        assert_eq!(host.asset_registry.asset_count(), 0);
        assert_eq!(host.loader.resident_count(), 0);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_missing_descriptor_unmounts_but_keeps_tracking() {
        let temp = TempDir::new().unwrap();
        let descriptor = BundleBuilder::new("Red").write(temp.path());
        let host = LocalHost::new(HostEnvironment::default());
        let mut registry = UgcRegistry::new(host.services.clone(), UgcSettings::default());
        host.plugins.add_to_plugins_list(&descriptor);
        host.plugins.refresh_plugins_list();
        let plugin = host.plugins.find_plugin("Red").unwrap();
        assert_eq!(registry.load(plugin, None).unwrap(), LoadOutcome::Loaded);
        assert_eq!(registry.unmount_missing(), 0);

        std::fs::remove_file(&descriptor).unwrap();

        assert_eq!(registry.unmount_missing(), 1);
        assert_eq!(registry.len(), 1);
        let package = registry.packages().next().unwrap();
        assert!(!package.is_mounted());
        assert_eq!(host.archives.mount_count(), 0);
        assert_eq!(host.asset_registry.asset_count(), 0);
    }

    #[test]
    fn test_enumerate_stops_when_visitor_returns_false() {
        let temp = TempDir::new().unwrap();
        BundleBuilder::new("Red").write(temp.path());
        BundleBuilder::new("Blue").write(temp.path());
        BundleBuilder::new("Green").write(temp.path());
        let host = LocalHost::new(HostEnvironment::default());
        let mut registry = registry_over(&host, temp.path(), UgcSettings::default());
        registry.refresh();
        assert_eq!(registry.len(), 3);

        let mut visits = 0;
        let completed = registry.enumerate(|_| {
            visits += 1;
            false
        });

        assert!(!completed);
        assert_eq!(visits, 1);

        let mut visits = 0;
        assert!(registry.enumerate(|_| {
            visits += 1;
            true
        }));
        assert_eq!(visits, 3);
    }

    #[test]
    fn test_registered_primary_asset_types_follow_the_package() {
        let temp = TempDir::new().unwrap();
        BundleBuilder::new("Red").write(temp.path());
        let host = LocalHost::new(HostEnvironment::default());
        let mut registry = registry_over(&host, temp.path(), UgcSettings::default());
        registry.refresh();
        let key = registry.keys().remove(0);

        assert_eq!(registry.registered_primary_asset_types(&key), ["Item".to_string()]);
        assert_eq!(registry.package_names(&key), vec!["/Red/Items/Sword".to_string()]);

        registry.unload(&key);
        assert!(registry.registered_primary_asset_types(&key).is_empty());
    }

    #[test]
    fn test_enabled_state_requires_feature() {
        let host = LocalHost::new(HostEnvironment::default());
        let id = PackageId::new(5);

        let mut registry = UgcRegistry::new(host.services.clone(), UgcSettings::default());
        registry.set_enabled_state_provider(Some(Arc::new(InMemoryEnabledState::with_disabled([id]))));
        assert!(registry.is_mod_enabled(id));
        assert!(!registry.request_mod_enabled_state_change(id, false));

        let settings = UgcSettings::default().with_mod_enable_disable(true);
        let mut registry = UgcRegistry::new(host.services.clone(), settings);
        registry.set_enabled_state_provider(Some(Arc::new(InMemoryEnabledState::with_disabled([id]))));
        let events = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let seen = Arc::clone(&events);
        registry.add_mod_enabled_state_handler(move |change| seen.lock().push(*change));

        assert!(!registry.is_mod_enabled(id));
        assert!(registry.request_mod_enabled_state_change(id, true));
        assert!(registry.is_mod_enabled(id));
        assert_eq!(*events.lock(), vec![EnabledStateChange { id, enabled: true }]);
    }

    #[test]
    fn test_initialize_respects_auto_initialize() {
        let temp = TempDir::new().unwrap();
        BundleBuilder::new("Red").write(temp.path());
        let host = LocalHost::new(HostEnvironment::default());

        let mut registry = registry_over(&host, temp.path(), UgcSettings::default());
        assert!(!registry.initialize().unwrap());
        assert!(registry.is_empty());

        let settings = UgcSettings::default().with_auto_initialize_provider(true);
        let mut registry = registry_over(&host, temp.path(), settings);
        assert!(registry.initialize().unwrap());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_initialize_provider_without_provider_fails() {
        let host = LocalHost::new(HostEnvironment::default());
        let mut registry = UgcRegistry::new(host.services.clone(), UgcSettings::default());

        assert!(matches!(registry.initialize_provider(), Err(RegistryError::NoProvider)));
        assert!(matches!(registry.deinitialize_provider(), Err(RegistryError::NoProvider)));
    }
}
