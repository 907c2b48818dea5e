//! Plugin manager over descriptor files on disk.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::package::discovery::find_descriptors;
use crate::platform::{
    MountPointTable, Plugin, PluginDescriptor, PluginError, PluginManager, PluginOrigin, PluginRef,
    PluginResult,
};

/// A plugin backed by a descriptor file.
pub struct LocalPlugin {
    name: String,
    descriptor_file: PathBuf,
    base_dir: PathBuf,
    origin: PluginOrigin,
    descriptor: PluginDescriptor,
    enabled: AtomicBool,
}

impl LocalPlugin {
    /// Read the descriptor at `descriptor_file`. The plugin is named after
    /// the file stem.
    pub fn from_descriptor_file(descriptor_file: &Path, origin: PluginOrigin) -> PluginResult<Self> {
        let descriptor = PluginDescriptor::load(descriptor_file)?;
        let name = descriptor_file
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .ok_or_else(|| PluginError::NotFound(descriptor_file.display().to_string()))?;
        let base_dir = descriptor_file
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        Ok(Self {
            name,
            descriptor_file: descriptor_file.to_path_buf(),
            base_dir,
            origin,
            descriptor,
            enabled: AtomicBool::new(false),
        })
    }

    fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }
}

impl Plugin for LocalPlugin {
    fn name(&self) -> &str {
        &self.name
    }

    fn descriptor_file(&self) -> &Path {
        &self.descriptor_file
    }

    fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn loaded_from(&self) -> PluginOrigin {
        self.origin
    }

    fn descriptor(&self) -> &PluginDescriptor {
        &self.descriptor
    }

    fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }
}

impl fmt::Debug for LocalPlugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalPlugin")
            .field("name", &self.name)
            .field("descriptor_file", &self.descriptor_file)
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

#[derive(Default)]
struct PluginListState {
    /// Descriptor file -> plugin, for every listed descriptor.
    listed: BTreeMap<PathBuf, Arc<LocalPlugin>>,
    search_paths: BTreeSet<PathBuf>,
    /// Plugins visible after the last refresh, plus any still enabled.
    discovered: Vec<Arc<LocalPlugin>>,
}

impl PluginListState {
    fn find(&self, name: &str) -> Option<Arc<LocalPlugin>> {
        self.discovered
            .iter()
            .chain(self.listed.values())
            .find(|p| p.name == name)
            .cloned()
    }

    fn is_name_listed(&self, name: &str) -> bool {
        self.listed.values().any(|p| p.name == name)
    }
}

/// In-process plugin manager.
///
/// Plugins enter the list through [`add_to_plugins_list`](PluginManager::add_to_plugins_list)
/// or by living under a search path. Mounting a plugin enables it and
/// registers its content directory with the [`MountPointTable`].
pub struct LocalPluginManager {
    state: Mutex<PluginListState>,
    mount_points: Arc<MountPointTable>,
}

impl LocalPluginManager {
    pub fn new(mount_points: Arc<MountPointTable>) -> Self {
        Self {
            state: Mutex::new(PluginListState::default()),
            mount_points,
        }
    }

    pub fn search_paths(&self) -> Vec<PathBuf> {
        self.state.lock().search_paths.iter().cloned().collect()
    }

    pub fn listed_descriptors(&self) -> Vec<PathBuf> {
        self.state.lock().listed.keys().cloned().collect()
    }

    pub fn enabled_plugins(&self) -> Vec<String> {
        self.state
            .lock()
            .discovered
            .iter()
            .filter(|p| p.is_enabled())
            .map(|p| p.name.clone())
            .collect()
    }
}

impl PluginManager for LocalPluginManager {
    fn find_plugin(&self, name: &str) -> Option<PluginRef> {
        self.state.lock().find(name).map(|p| p as PluginRef)
    }

    fn add_to_plugins_list(&self, descriptor_file: &Path) -> bool {
        let plugin = match LocalPlugin::from_descriptor_file(descriptor_file, PluginOrigin::Project) {
            Ok(plugin) => plugin,
            Err(e) => {
                warn!(error = %e, "Unable to add plugin");
                return false;
            }
        };

        let mut state = self.state.lock();
        if state.listed.contains_key(descriptor_file) || state.is_name_listed(&plugin.name) {
            debug!(plugin = %plugin.name, "Plugin already listed");
            return false;
        }
        state
            .listed
            .insert(descriptor_file.to_path_buf(), Arc::new(plugin));
        true
    }

    fn add_plugin_search_path(&self, dir: &Path, refresh: bool) -> bool {
        let added = self.state.lock().search_paths.insert(dir.to_path_buf());
        if refresh {
            self.refresh_plugins_list();
        }
        added
    }

    fn refresh_plugins_list(&self) {
        let mut state = self.state.lock();

        state.listed.retain(|path, plugin| plugin.is_enabled() || path.exists());

        let search_paths: Vec<PathBuf> = state.search_paths.iter().cloned().collect();
        for dir in search_paths {
            for descriptor_file in find_descriptors(&dir) {
                if state.listed.contains_key(&descriptor_file) {
                    continue;
                }
                match LocalPlugin::from_descriptor_file(&descriptor_file, PluginOrigin::Project) {
                    Ok(plugin) if !state.is_name_listed(&plugin.name) => {
                        state.listed.insert(descriptor_file, Arc::new(plugin));
                    }
                    Ok(_) => {}
                    Err(e) => warn!(error = %e, "Skipping unreadable descriptor"),
                }
            }
        }

        let still_enabled: Vec<Arc<LocalPlugin>> = state
            .discovered
            .iter()
            .filter(|p| p.is_enabled() && !state.listed.values().any(|l| Arc::ptr_eq(l, p)))
            .cloned()
            .collect();
        let mut discovered: Vec<Arc<LocalPlugin>> = state.listed.values().cloned().collect();
        discovered.extend(still_enabled);
        state.discovered = discovered;

        debug!(plugins = state.discovered.len(), "Refreshed plugin list");
    }

    fn discovered_plugins(&self) -> Vec<PluginRef> {
        self.state
            .lock()
            .discovered
            .iter()
            .map(|p| Arc::clone(p) as PluginRef)
            .collect()
    }

    fn mount_newly_created_plugin(&self, name: &str) -> bool {
        let Some(plugin) = self.state.lock().find(name) else {
            warn!(plugin = name, "Cannot mount unknown plugin");
            return false;
        };
        if !plugin.is_enabled() {
            plugin.set_enabled(true);
            self.mount_points
                .register(&plugin.mounted_asset_path(), &plugin.content_dir());
            info!(plugin = name, "Mounted plugin");
        }
        true
    }

    fn remove_from_plugins_list(&self, descriptor_file: &Path) -> PluginResult<()> {
        self.state
            .lock()
            .listed
            .remove(descriptor_file)
            .map(|_| ())
            .ok_or_else(|| PluginError::NotFound(descriptor_file.display().to_string()))
    }

    fn unmount_explicitly_loaded_plugin(&self, name: &str) -> PluginResult<()> {
        let plugin = self
            .state
            .lock()
            .find(name)
            .ok_or_else(|| PluginError::NotFound(name.to_string()))?;
        if !plugin.is_enabled() {
            return Err(PluginError::NotLoaded(name.to_string()));
        }

        plugin.set_enabled(false);
        self.mount_points
            .unregister(&plugin.mounted_asset_path(), &plugin.content_dir());
        self.state
            .lock()
            .discovered
            .retain(|p| !Arc::ptr_eq(p, &plugin));
        info!(plugin = name, "Unmounted plugin");
        Ok(())
    }
}
