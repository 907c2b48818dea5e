//! Fixtures shared by unit tests.

use std::path::{Path, PathBuf};

use crate::package::{AssetIndex, AssetRecord, PrimaryAssetTypeInfo, UgcMetadata, METADATA_FILE};
use crate::platform::local::{write_archive, LocalHost};
use crate::platform::{PluginDescriptor, PluginManager, PluginRef};

/// Write `<dir>/<name>.uplugin` and return its path.
pub(crate) fn write_descriptor(dir: &Path, name: &str, category: &str, engine_version: &str) -> PathBuf {
    std::fs::create_dir_all(dir).unwrap();
    let descriptor = PluginDescriptor {
        friendly_name: format!("{name} Pack"),
        description: format!("Test content {name}"),
        created_by: "tester".to_string(),
        category: category.to_string(),
        engine_version: engine_version.to_string(),
        can_contain_content: true,
        explicitly_loaded: true,
        ..PluginDescriptor::default()
    };
    let path = dir.join(format!("{name}.uplugin"));
    std::fs::write(&path, descriptor.to_json_string()).unwrap();
    path
}

/// One item asset under `/<name>/Items`.
pub(crate) fn item_index(name: &str) -> AssetIndex {
    let mut index = AssetIndex::new();
    index.push(AssetRecord::new(
        format!("/{name}/Items/Sword.Sword"),
        format!("/{name}/Items/Sword"),
        "ItemDefinition",
    ));
    index
}

/// Metadata with one `Item` scan rule over `/<name>/Items`.
pub(crate) fn item_metadata(name: &str) -> UgcMetadata {
    UgcMetadata {
        unreal_version: "5.3.0".to_string(),
        io_store_enabled: false,
        primary_asset_types_to_scan: vec![
            PrimaryAssetTypeInfo::new("Item", "ItemDefinition").with_directory(format!("/{name}/Items")),
        ],
    }
}

/// Writes a complete bundle directory.
pub(crate) struct BundleBuilder {
    name: String,
    category: String,
    engine_version: String,
    archives: usize,
    asset_index: Option<AssetIndex>,
    metadata: Option<UgcMetadata>,
    shader_archive: bool,
}

impl BundleBuilder {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            category: "UGC".to_string(),
            engine_version: "5.3.0".to_string(),
            archives: 1,
            asset_index: Some(item_index(name)),
            metadata: Some(item_metadata(name)),
            shader_archive: false,
        }
    }

    pub(crate) fn category(mut self, category: &str) -> Self {
        self.category = category.to_string();
        self
    }

    pub(crate) fn engine_version(mut self, engine_version: &str) -> Self {
        self.engine_version = engine_version.to_string();
        self
    }

    pub(crate) fn archives(mut self, count: usize) -> Self {
        self.archives = count;
        self
    }

    pub(crate) fn without_asset_index(mut self) -> Self {
        self.asset_index = None;
        self
    }

    pub(crate) fn metadata(mut self, metadata: Option<UgcMetadata>) -> Self {
        self.metadata = metadata;
        self
    }

    pub(crate) fn shader_archive(mut self) -> Self {
        self.shader_archive = true;
        self
    }

    /// Write the bundle to `<root>/<name>/` and return the descriptor path.
    pub(crate) fn write(&self, root: &Path) -> PathBuf {
        let base = root.join(&self.name);
        let content = base.join("Content");
        std::fs::create_dir_all(&content).unwrap();
        let descriptor = write_descriptor(&base, &self.name, &self.category, &self.engine_version);

        for i in 0..self.archives {
            write_archive(&content.join("Paks").join(format!("{}-{i}.pak", self.name))).unwrap();
        }
        if let Some(index) = &self.asset_index {
            index.save(&base.join("AssetRegistry.bin")).unwrap();
        }
        if let Some(metadata) = &self.metadata {
            std::fs::write(
                content.join(METADATA_FILE),
                serde_json::to_string_pretty(metadata).unwrap(),
            )
            .unwrap();
        }
        if self.shader_archive {
            std::fs::write(
                content.join(format!("ShaderArchive-{}-PCD3D.ushaderbytecode", self.name)),
                b"shaders",
            )
            .unwrap();
        }
        descriptor
    }
}

/// List, discover, mount and register the plugin behind `descriptor`, the
/// way the registry prepares a plugin before constructing its package.
pub(crate) fn prepared_plugin(host: &LocalHost, descriptor: &Path) -> PluginRef {
    assert!(host.plugins.add_to_plugins_list(descriptor));
    host.plugins.refresh_plugins_list();
    let name = descriptor.file_stem().unwrap().to_string_lossy().into_owned();
    let plugin = host.plugins.find_plugin(&name).unwrap();
    host.plugins.mount_newly_created_plugin(&name);
    host.mount_points
        .register(&plugin.mounted_asset_path(), &plugin.content_dir());
    plugin
}
