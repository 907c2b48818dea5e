//! Global asset registry and primary asset directory.

use crate::package::{AssetIndex, PrimaryAssetTypeInfo};

/// The host's global asset index.
pub trait AssetRegistry: Send + Sync {
    /// Merge a package's asset index into the global one.
    fn append_state(&self, state: &AssetIndex);

    /// Remove the entries of a previously appended index.
    fn remove_state(&self, state: &AssetIndex);

    /// Returns `true` while the host is still discovering its own assets.
    fn is_loading_assets(&self) -> bool;
}

/// The host's directory of primary assets, grouped by type.
pub trait PrimaryAssetDirectory: Send + Sync {
    /// Returns `false` if `rule` must not be scanned, e.g. because the host
    /// configuration already covers its type. May fill in runtime data.
    fn should_scan(&self, rule: &mut PrimaryAssetTypeInfo) -> bool;

    /// Register the rule's directories. Returns the number of primary assets
    /// found.
    fn scan_paths(&self, rule: &PrimaryAssetTypeInfo, force_synchronous: bool) -> usize;

    fn remove_scan_paths(&self, rule: &PrimaryAssetTypeInfo);

    fn invalidate(&self);

    /// Rebuild the directory if it was invalidated, or always when `force`.
    fn refresh(&self, force: bool);

    /// Asset object paths registered for `primary_asset_type`.
    fn primary_asset_ids(&self, primary_asset_type: &str) -> Vec<String>;
}
