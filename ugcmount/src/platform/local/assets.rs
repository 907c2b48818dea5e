//! In-memory asset registry and primary asset directory.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::package::naming::is_under_virtual_root;
use crate::package::{AssetIndex, AssetRecord, PrimaryAssetTypeInfo};
use crate::platform::{AssetRegistry, PrimaryAssetDirectory};

/// Global asset index held in memory.
#[derive(Debug, Default)]
pub struct LocalAssetRegistry {
    assets: Mutex<BTreeMap<String, AssetRecord>>,
    packages: Mutex<BTreeMap<String, usize>>,
    loading: AtomicBool,
}

impl LocalAssetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate the host still discovering its own assets.
    pub fn set_loading_assets(&self, loading: bool) {
        self.loading.store(loading, Ordering::SeqCst);
    }

    pub fn asset_count(&self) -> usize {
        self.assets.lock().len()
    }

    pub fn contains_package(&self, package_name: &str) -> bool {
        self.packages.lock().contains_key(package_name)
    }

    /// Assets beneath a virtual directory.
    pub fn assets_under(&self, directory: &str) -> Vec<AssetRecord> {
        self.assets
            .lock()
            .values()
            .filter(|record| is_under_virtual_root(&record.package_name, directory))
            .cloned()
            .collect()
    }
}

impl AssetRegistry for LocalAssetRegistry {
    fn append_state(&self, state: &AssetIndex) {
        {
            let mut packages = self.packages.lock();
            for name in &state.packages {
                *packages.entry(name.clone()).or_insert(0) += 1;
            }
        }
        let mut assets = self.assets.lock();
        for record in &state.assets {
            assets.insert(record.object_path.clone(), record.clone());
        }
        debug!(packages = state.packages.len(), assets = state.assets.len(), "Appended asset index");
    }

    fn remove_state(&self, state: &AssetIndex) {
        {
            let mut packages = self.packages.lock();
            for name in &state.packages {
                if let Some(count) = packages.get_mut(name) {
                    *count -= 1;
                    if *count == 0 {
                        packages.remove(name);
                    }
                }
            }
        }
        let mut assets = self.assets.lock();
        for record in &state.assets {
            assets.remove(&record.object_path);
        }
        debug!(packages = state.packages.len(), assets = state.assets.len(), "Removed asset index");
    }

    fn is_loading_assets(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Default)]
struct DirectoryState {
    /// Scan rule registrations, one entry per registered rule.
    rules: Vec<PrimaryAssetTypeInfo>,
    /// Primary asset type -> object paths, as of the last refresh.
    directory: BTreeMap<String, BTreeSet<String>>,
    dirty: bool,
    refreshes: usize,
}

/// Primary asset directory built from [`LocalAssetRegistry`] contents.
///
/// A rule matches every asset of its base class (or any class, if the base
/// class is empty) beneath one of its directories.
#[derive(Debug)]
pub struct LocalPrimaryAssetDirectory {
    registry: Arc<LocalAssetRegistry>,
    config_covered: BTreeSet<String>,
    state: Mutex<DirectoryState>,
}

impl LocalPrimaryAssetDirectory {
    pub fn new(registry: Arc<LocalAssetRegistry>) -> Self {
        Self {
            registry,
            config_covered: BTreeSet::new(),
            state: Mutex::new(DirectoryState::default()),
        }
    }

    /// Mark a type as already scanned by host configuration.
    pub fn with_config_covered_type(mut self, primary_asset_type: impl Into<String>) -> Self {
        self.config_covered.insert(primary_asset_type.into());
        self
    }

    pub fn registered_rule_count(&self) -> usize {
        self.state.lock().rules.len()
    }

    /// Directories currently registered for `primary_asset_type`.
    pub fn scan_directories(&self, primary_asset_type: &str) -> Vec<String> {
        self.state
            .lock()
            .rules
            .iter()
            .filter(|rule| rule.primary_asset_type == primary_asset_type)
            .flat_map(|rule| rule.directories.iter().cloned())
            .collect()
    }

    pub fn refresh_count(&self) -> usize {
        self.state.lock().refreshes
    }

    fn rebuild(&self, state: &mut DirectoryState) {
        let mut directory: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for rule in &state.rules {
            let entry = directory.entry(rule.primary_asset_type.clone()).or_default();
            for dir in &rule.directories {
                for record in self.registry.assets_under(dir) {
                    if rule.asset_base_class.is_empty() || record.asset_class == rule.asset_base_class {
                        entry.insert(record.object_path);
                    }
                }
            }
        }
        state.directory = directory;
        state.dirty = false;
        state.refreshes += 1;
    }
}

impl PrimaryAssetDirectory for LocalPrimaryAssetDirectory {
    fn should_scan(&self, rule: &mut PrimaryAssetTypeInfo) -> bool {
        if self.config_covered.contains(&rule.primary_asset_type) {
            return false;
        }
        for dir in &mut rule.directories {
            let trimmed = dir.trim_end_matches('/').len();
            dir.truncate(trimmed.max(1));
        }
        true
    }

    fn scan_paths(&self, rule: &PrimaryAssetTypeInfo, force_synchronous: bool) -> usize {
        let mut state = self.state.lock();
        state.rules.push(rule.clone());
        state.dirty = true;
        if force_synchronous {
            self.rebuild(&mut state);
        }
        let found = state
            .directory
            .get(&rule.primary_asset_type)
            .map_or(0, BTreeSet::len);
        trace!(primary_asset_type = %rule.primary_asset_type, found, "Scanned primary asset paths");
        found
    }

    fn remove_scan_paths(&self, rule: &PrimaryAssetTypeInfo) {
        let mut state = self.state.lock();
        if let Some(index) = state.rules.iter().position(|r| r == rule) {
            state.rules.remove(index);
            state.dirty = true;
        }
    }

    fn invalidate(&self) {
        self.state.lock().dirty = true;
    }

    fn refresh(&self, force: bool) {
        let mut state = self.state.lock();
        if state.dirty || force {
            self.rebuild(&mut state);
        }
    }

    fn primary_asset_ids(&self, primary_asset_type: &str) -> Vec<String> {
        self.state
            .lock()
            .directory
            .get(primary_asset_type)
            .map(|ids| ids.iter().cloned().collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index() -> AssetIndex {
        let mut index = AssetIndex::new();
        index.push(AssetRecord::new("/Red/Items/Sword.Sword", "/Red/Items/Sword", "ItemDefinition"));
        index.push(AssetRecord::new("/Red/Items/Icon.Icon", "/Red/Items/Icon", "Texture"));
        index.push(AssetRecord::new("/Red/Maps/Arena.Arena", "/Red/Maps/Arena", "World"));
        index
    }

    #[test]
    fn test_append_and_remove_state() {
        let registry = LocalAssetRegistry::new();
        registry.append_state(&index());
        assert_eq!(registry.asset_count(), 3);
        assert!(registry.contains_package("/Red/Maps/Arena"));

        registry.remove_state(&index());
        assert_eq!(registry.asset_count(), 0);
        assert!(!registry.contains_package("/Red/Maps/Arena"));
    }

    #[test]
    fn test_scan_matches_base_class_under_directory() {
        let registry = Arc::new(LocalAssetRegistry::new());
        registry.append_state(&index());
        let directory = LocalPrimaryAssetDirectory::new(Arc::clone(&registry));

        let mut rule = PrimaryAssetTypeInfo::new("Item", "ItemDefinition").with_directory("/Red/Items/");
        assert!(directory.should_scan(&mut rule));
        assert_eq!(rule.directories, vec!["/Red/Items".to_string()]);

        assert_eq!(directory.scan_paths(&rule, true), 1);
        assert_eq!(directory.primary_asset_ids("Item"), vec!["/Red/Items/Sword.Sword".to_string()]);

        directory.remove_scan_paths(&rule);
        directory.invalidate();
        directory.refresh(true);
        assert!(directory.primary_asset_ids("Item").is_empty());
        assert_eq!(directory.registered_rule_count(), 0);
    }

    #[test]
    fn test_async_scan_defers_until_refresh() {
        let registry = Arc::new(LocalAssetRegistry::new());
        registry.append_state(&index());
        let directory = LocalPrimaryAssetDirectory::new(registry);
        let rule = PrimaryAssetTypeInfo::new("Map", "").with_directory("/Red/Maps");

        assert_eq!(directory.scan_paths(&rule, false), 0);
        directory.refresh(false);
        assert_eq!(directory.primary_asset_ids("Map").len(), 1);
    }

    #[test]
    fn test_config_covered_type_is_not_scanned() {
        let registry = Arc::new(LocalAssetRegistry::new());
        let directory = LocalPrimaryAssetDirectory::new(registry).with_config_covered_type("Map");
        let mut rule = PrimaryAssetTypeInfo::new("Map", "World");
        assert!(!directory.should_scan(&mut rule));
    }
}
