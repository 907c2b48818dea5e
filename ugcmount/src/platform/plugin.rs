//! Plugins and the plugin manager.
//!
//! Every UGC package is hosted by a plugin: a directory with a JSON
//! descriptor file (`<Name>.uplugin`) and a `Content/` directory.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::package::naming::{self, CONTENT_DIR};

/// Category tag marking a plugin as UGC.
pub const UGC_CATEGORY: &str = "UGC";

/// Result type for plugin manager operations.
pub type PluginResult<T> = Result<T, PluginError>;

/// Errors reported by the plugin manager.
#[derive(Debug, Error)]
pub enum PluginError {
    #[error("Failed to read descriptor {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse descriptor {path}: {reason}")]
    ParseFailed { path: PathBuf, reason: String },

    #[error("Plugin not found: {0}")]
    NotFound(String),

    #[error("Plugin {0} is not loaded")]
    NotLoaded(String),
}

/// Where a plugin was discovered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PluginOrigin {
    Engine,
    Project,
}

/// Plugin descriptor file contents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct PluginDescriptor {
    pub friendly_name: String,
    pub description: String,
    pub created_by: String,
    pub category: String,
    pub engine_version: String,
    pub version_name: String,
    pub can_contain_content: bool,
    pub explicitly_loaded: bool,
}

impl PluginDescriptor {
    pub fn from_json_str(json: &str, path: &Path) -> PluginResult<Self> {
        serde_json::from_str(json).map_err(|e| PluginError::ParseFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    pub fn load(path: &Path) -> PluginResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| PluginError::ReadFailed {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text, path)
    }

    pub fn to_json_string(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    pub fn is_ugc(&self) -> bool {
        self.category == UGC_CATEGORY
    }
}

/// Handle to a discovered plugin.
pub trait Plugin: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    fn descriptor_file(&self) -> &Path;

    /// Directory containing the descriptor file.
    fn base_dir(&self) -> &Path;

    fn loaded_from(&self) -> PluginOrigin;

    fn descriptor(&self) -> &PluginDescriptor;

    fn is_enabled(&self) -> bool;

    fn content_dir(&self) -> PathBuf {
        self.base_dir().join(CONTENT_DIR)
    }

    /// Virtual root the plugin's content is mounted at, e.g. `/Name/`.
    fn mounted_asset_path(&self) -> String {
        naming::mounted_asset_path(self.name())
    }

    fn can_contain_content(&self) -> bool {
        self.descriptor().can_contain_content
    }
}

/// Shared plugin handle.
pub type PluginRef = Arc<dyn Plugin>;

/// Host plugin manager.
pub trait PluginManager: Send + Sync {
    fn find_plugin(&self, name: &str) -> Option<PluginRef>;

    /// Add the descriptor at `descriptor_file` to the plugin list.
    /// Returns `false` if it could not be added.
    fn add_to_plugins_list(&self, descriptor_file: &Path) -> bool;

    /// Register `dir` as a plugin search path. Returns `false` if already known.
    fn add_plugin_search_path(&self, dir: &Path, refresh: bool) -> bool;

    /// Rebuild the discovered plugin set from the plugin list and search paths.
    fn refresh_plugins_list(&self);

    fn discovered_plugins(&self) -> Vec<PluginRef>;

    /// Enable a freshly discovered plugin. Returns `false` if unknown.
    fn mount_newly_created_plugin(&self, name: &str) -> bool;

    fn remove_from_plugins_list(&self, descriptor_file: &Path) -> PluginResult<()>;

    fn unmount_explicitly_loaded_plugin(&self, name: &str) -> PluginResult<()>;
}
