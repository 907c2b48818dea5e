//! Package metadata asset.
//!
//! Every package may ship a `UgcMetadata` asset at its root describing the
//! engine it was built with, its storage format and the primary asset types
//! the host should scan for.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::naming;

/// Asset name of the metadata object.
pub const METADATA_ASSET_NAME: &str = "UgcMetadata";

/// File the local loader reads the metadata asset from, relative to the
/// package content directory.
pub const METADATA_FILE: &str = "UgcMetadata.json";

/// One primary asset scan rule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrimaryAssetTypeInfo {
    pub primary_asset_type: String,
    pub asset_base_class: String,
    pub has_blueprint_classes: bool,
    pub is_editor_only: bool,
    /// Virtual directories to scan, e.g. `/Red/Items`.
    pub directories: Vec<String>,
}

impl PrimaryAssetTypeInfo {
    pub fn new(primary_asset_type: impl Into<String>, asset_base_class: impl Into<String>) -> Self {
        Self {
            primary_asset_type: primary_asset_type.into(),
            asset_base_class: asset_base_class.into(),
            ..Self::default()
        }
    }

    pub fn with_directory(mut self, directory: impl Into<String>) -> Self {
        self.directories.push(directory.into());
        self
    }
}

/// Metadata shipped with a UGC package.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UgcMetadata {
    pub unreal_version: String,
    pub io_store_enabled: bool,
    pub primary_asset_types_to_scan: Vec<PrimaryAssetTypeInfo>,
}

impl UgcMetadata {
    /// Object name of the metadata asset (`UgcMetadata.UgcMetadata`).
    pub fn default_asset_name() -> String {
        format!("{}.{}", METADATA_ASSET_NAME, METADATA_ASSET_NAME)
    }

    /// Object path of the metadata asset for a package path.
    pub fn object_path_for(package_path: &str) -> String {
        naming::object_path(package_path, METADATA_ASSET_NAME)
    }

    /// Parse metadata from its JSON form.
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Read metadata from a JSON file.
    pub fn load_json(path: &Path) -> std::io::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }

    /// Primary asset type names listed by the scan rules.
    pub fn primary_asset_types(&self) -> Vec<String> {
        self.primary_asset_types_to_scan
            .iter()
            .map(|rule| rule.primary_asset_type.clone())
            .collect()
    }

    pub fn log_values(&self) {
        debug!(
            unreal_version = %self.unreal_version,
            io_store_enabled = self.io_store_enabled,
            rules = self.primary_asset_types_to_scan.len(),
            "UGC metadata"
        );
        for rule in &self.primary_asset_types_to_scan {
            debug!(
                primary_asset_type = %rule.primary_asset_type,
                asset_base_class = %rule.asset_base_class,
                has_blueprint_classes = rule.has_blueprint_classes,
                is_editor_only = rule.is_editor_only,
                directories = ?rule.directories,
                "Primary asset scan rule"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_asset_name() {
        assert_eq!(UgcMetadata::default_asset_name(), "UgcMetadata.UgcMetadata");
        assert_eq!(
            UgcMetadata::object_path_for("/Red"),
            "/Red/UgcMetadata.UgcMetadata"
        );
    }

    #[test]
    fn test_parse_with_missing_fields() {
        let meta = UgcMetadata::from_json_str(r#"{"unreal_version":"5.3.0"}"#).unwrap();
        assert_eq!(meta.unreal_version, "5.3.0");
        assert!(!meta.io_store_enabled);
        assert!(meta.primary_asset_types_to_scan.is_empty());
    }

    #[test]
    fn test_primary_asset_types() {
        let meta = UgcMetadata {
            primary_asset_types_to_scan: vec![
                PrimaryAssetTypeInfo::new("Item", "ItemDefinition").with_directory("/Red/Items"),
                PrimaryAssetTypeInfo::new("Map", "World"),
            ],
            ..UgcMetadata::default()
        };
        assert_eq!(meta.primary_asset_types(), vec!["Item", "Map"]);
    }
}
