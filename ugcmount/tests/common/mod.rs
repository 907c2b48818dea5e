//! Helpers for the integration tests: real bundles on disk and a provider
//! with fixed installed paths.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use ugcmount::package::{AssetIndex, AssetRecord};
use ugcmount::platform::local::write_archive;
use ugcmount::platform::PluginDescriptor;
use ugcmount::provider::{PackagePathMap, ProviderResult, UgcProvider};
use ugcmount::{PackageId, UgcRegistry};

/// Write `<root>/<name>/` with a descriptor, `archives` archives and a
/// one-asset index. Returns the descriptor path.
pub fn write_bundle(root: &Path, name: &str, engine_version: &str, archives: usize) -> PathBuf {
    let base = root.join(name);
    let content = base.join("Content");
    std::fs::create_dir_all(&content).unwrap();

    let descriptor = PluginDescriptor {
        friendly_name: format!("{name} Pack"),
        created_by: "integration".to_string(),
        category: "UGC".to_string(),
        engine_version: engine_version.to_string(),
        can_contain_content: true,
        explicitly_loaded: true,
        ..PluginDescriptor::default()
    };
    let descriptor_path = base.join(format!("{name}.uplugin"));
    std::fs::write(&descriptor_path, descriptor.to_json_string()).unwrap();

    for i in 0..archives {
        write_archive(&content.join("Paks").join(format!("{name}-{i}.pak"))).unwrap();
    }

    let mut index = AssetIndex::new();
    index.push(AssetRecord::new(
        format!("/{name}/Maps/Arena.Arena"),
        format!("/{name}/Maps/Arena"),
        "World",
    ));
    index.save(&base.join("AssetRegistry.bin")).unwrap();

    descriptor_path
}

/// Provider reporting a fixed set of roots.
pub struct FixedProvider {
    paths: PackagePathMap,
}

impl FixedProvider {
    pub fn new(roots: impl IntoIterator<Item = (PathBuf, Option<PackageId>)>) -> Self {
        Self {
            paths: roots
                .into_iter()
                .map(|(root, id)| (root.to_string_lossy().into_owned(), id))
                .collect(),
        }
    }
}

impl UgcProvider for FixedProvider {
    fn initialize(&self) -> ProviderResult<()> {
        Ok(())
    }

    fn deinitialize(&self) -> ProviderResult<()> {
        Ok(())
    }

    fn is_enabled(&self) -> bool {
        true
    }

    fn installed_paths(&self) -> PackagePathMap {
        self.paths.clone()
    }
}

/// Count packages-changed notifications.
pub fn change_counter(registry: &UgcRegistry) -> Arc<AtomicUsize> {
    let count = Arc::new(AtomicUsize::new(0));
    let clone = count.clone();
    registry.add_packages_changed_handler(move || {
        clone.fetch_add(1, Ordering::SeqCst);
    });
    count
}
