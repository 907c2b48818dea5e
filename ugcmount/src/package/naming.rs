//! Centralized package naming conventions.
//!
//! This module is the single source of truth for how a UGC package maps onto
//! file names and virtual asset paths:
//! - Mounted asset path (e.g., `/RedBarrels/`)
//! - Package path (e.g., `/RedBarrels`)
//! - Metadata object path (e.g., `/RedBarrels/UgcMetadata.UgcMetadata`)
//!
//! Other modules should use these functions rather than building paths by hand.

use std::path::Path;

/// File extension of mountable archives.
pub const ARCHIVE_EXTENSION: &str = "pak";

/// File extension of plugin descriptors.
pub const DESCRIPTOR_EXTENSION: &str = "uplugin";

/// Name of the per-package asset index file, relative to the package base dir.
pub const ASSET_INDEX_FILE: &str = "AssetRegistry.bin";

/// Name of the content directory inside a package.
pub const CONTENT_DIR: &str = "Content";

/// Mount priority used for every UGC archive.
pub const ARCHIVE_MOUNT_ORDER: u32 = 4;

/// Build the mounted asset path (virtual root) for a package name.
///
/// # Examples
///
/// ```
/// use ugcmount::package::mounted_asset_path;
///
/// assert_eq!(mounted_asset_path("RedBarrels"), "/RedBarrels/");
/// ```
pub fn mounted_asset_path(name: &str) -> String {
    format!("/{}/", name)
}

/// Strip the trailing separator from a mounted asset path.
///
/// # Examples
///
/// ```
/// use ugcmount::package::package_path_from_mount;
///
/// assert_eq!(package_path_from_mount("/RedBarrels/"), "/RedBarrels");
/// assert_eq!(package_path_from_mount("/RedBarrels"), "/RedBarrels");
/// ```
pub fn package_path_from_mount(mounted: &str) -> String {
    mounted.trim_end_matches('/').to_string()
}

/// Build `<package_path>/<AssetName>.<AssetName>` for an asset living at the
/// package root.
///
/// # Examples
///
/// ```
/// use ugcmount::package::object_path;
///
/// assert_eq!(
///     object_path("/RedBarrels", "UgcMetadata"),
///     "/RedBarrels/UgcMetadata.UgcMetadata"
/// );
/// ```
pub fn object_path(package_path: &str, asset_name: &str) -> String {
    format!(
        "{}/{}.{}",
        package_path.trim_end_matches('/'),
        asset_name,
        asset_name
    )
}

/// Strip the `.ObjectName` suffix from an object path.
///
/// # Examples
///
/// ```
/// use ugcmount::package::object_path_to_package_name;
///
/// assert_eq!(
///     object_path_to_package_name("/RedBarrels/UgcMetadata.UgcMetadata"),
///     "/RedBarrels/UgcMetadata"
/// );
/// assert_eq!(object_path_to_package_name("/RedBarrels/Mesh"), "/RedBarrels/Mesh");
/// ```
pub fn object_path_to_package_name(object_path: &str) -> &str {
    let leaf_start = object_path.rfind('/').map(|i| i + 1).unwrap_or(0);
    match object_path[leaf_start..].find('.') {
        Some(dot) => &object_path[..leaf_start + dot],
        None => object_path,
    }
}

/// Returns `true` if `path` equals `dir` or lies beneath it, comparing whole
/// path components.
pub fn is_under_directory(path: &Path, dir: &Path) -> bool {
    path.starts_with(dir)
}

/// Returns `true` if the virtual `path` lies under the virtual root `root`.
///
/// Both are `/`-separated asset paths. `/Red/Mesh` is under `/Red` and
/// `/Red/`, but not under `/Re`.
pub fn is_under_virtual_root(path: &str, root: &str) -> bool {
    let root = root.trim_end_matches('/');
    match path.strip_prefix(root) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}
