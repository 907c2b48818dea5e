//! Per-package asset index (`AssetRegistry.bin`).
//!
//! The file starts with a 4-byte magic and a little-endian `u32` format
//! version, followed by the bincode encoding of [`AssetIndex`].

use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Magic bytes at the start of every asset index file.
pub const ASSET_INDEX_MAGIC: &[u8; 4] = b"UGCI";

/// Current asset index format version.
pub const ASSET_INDEX_VERSION: u32 = 1;

/// Errors raised while reading or writing an asset index.
#[derive(Debug, Error)]
pub enum AssetIndexError {
    #[error("Failed to read asset index {path}: {source}")]
    Io { path: PathBuf, source: io::Error },

    #[error("Not an asset index (bad magic): {0}")]
    BadMagic(PathBuf),

    #[error("Unsupported asset index version {version} in {path}")]
    UnsupportedVersion { path: PathBuf, version: u32 },

    #[error("Failed to decode asset index {path}: {reason}")]
    Decode { path: PathBuf, reason: String },

    #[error("Failed to write asset index {path}: {reason}")]
    Encode { path: PathBuf, reason: String },

    #[error("Asset index {path} lists no {what}")]
    Empty { path: PathBuf, what: &'static str },
}

/// One asset known to the index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssetRecord {
    /// Full object path, e.g. `/Red/Items/Sword.Sword`.
    pub object_path: String,
    /// Package containing the object, e.g. `/Red/Items/Sword`.
    pub package_name: String,
    /// Class name of the asset, e.g. `ItemDefinition`.
    pub asset_class: String,
}

impl AssetRecord {
    pub fn new(
        object_path: impl Into<String>,
        package_name: impl Into<String>,
        asset_class: impl Into<String>,
    ) -> Self {
        Self {
            object_path: object_path.into(),
            package_name: package_name.into(),
            asset_class: asset_class.into(),
        }
    }
}

/// Snapshot of the packages and assets shipped by one UGC package.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetIndex {
    pub packages: Vec<String>,
    pub assets: Vec<AssetRecord>,
}

impl AssetIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an asset, recording its package if not yet listed.
    pub fn push(&mut self, record: AssetRecord) {
        if !self.packages.contains(&record.package_name) {
            self.packages.push(record.package_name.clone());
        }
        self.assets.push(record);
    }

    /// Names of every package in the index.
    pub fn package_names(&self) -> &[String] {
        &self.packages
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty() && self.assets.is_empty()
    }

    /// Load an index from disk.
    pub fn load(path: &Path) -> Result<Self, AssetIndexError> {
        let io_err = |source| AssetIndexError::Io {
            path: path.to_path_buf(),
            source,
        };

        let file = std::fs::File::open(path).map_err(io_err)?;
        let mut reader = BufReader::new(file);

        let mut magic = [0u8; 4];
        reader.read_exact(&mut magic).map_err(io_err)?;
        if &magic != ASSET_INDEX_MAGIC {
            return Err(AssetIndexError::BadMagic(path.to_path_buf()));
        }

        let mut version = [0u8; 4];
        reader.read_exact(&mut version).map_err(io_err)?;
        let version = u32::from_le_bytes(version);
        if version != ASSET_INDEX_VERSION {
            return Err(AssetIndexError::UnsupportedVersion {
                path: path.to_path_buf(),
                version,
            });
        }

        bincode::deserialize_from(reader).map_err(|e| AssetIndexError::Decode {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Load an index and reject one that lists no packages or no assets.
    pub fn load_non_empty(path: &Path) -> Result<Self, AssetIndexError> {
        let index = Self::load(path)?;
        if index.packages.is_empty() {
            return Err(AssetIndexError::Empty {
                path: path.to_path_buf(),
                what: "packages",
            });
        }
        if index.assets.is_empty() {
            return Err(AssetIndexError::Empty {
                path: path.to_path_buf(),
                what: "assets",
            });
        }
        Ok(index)
    }

    /// Save the index to disk.
    pub fn save(&self, path: &Path) -> Result<(), AssetIndexError> {
        let io_err = |source| AssetIndexError::Io {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }

        // Write to temp file first, then rename for atomicity
        let temp_path = path.with_extension("tmp");
        let file = std::fs::File::create(&temp_path).map_err(io_err)?;
        let mut writer = BufWriter::new(file);

        writer.write_all(ASSET_INDEX_MAGIC).map_err(io_err)?;
        writer
            .write_all(&ASSET_INDEX_VERSION.to_le_bytes())
            .map_err(io_err)?;
        bincode::serialize_into(&mut writer, self).map_err(|e| AssetIndexError::Encode {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        writer.flush().map_err(io_err)?;
        drop(writer);

        std::fs::rename(&temp_path, path).map_err(io_err)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample() -> AssetIndex {
        let mut index = AssetIndex::new();
        index.push(AssetRecord::new(
            "/Red/Items/Sword.Sword",
            "/Red/Items/Sword",
            "ItemDefinition",
        ));
        index.push(AssetRecord::new(
            "/Red/Items/Sword.Sword_Icon",
            "/Red/Items/Sword",
            "Texture",
        ));
        index
    }

    #[test]
    fn test_push_dedupes_packages() {
        let index = sample();
        assert_eq!(index.package_names(), &["/Red/Items/Sword".to_string()]);
        assert_eq!(index.assets.len(), 2);
    }

    #[test]
    fn test_save_then_load() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("Red").join("AssetRegistry.bin");

        sample().save(&path).unwrap();

        assert_eq!(AssetIndex::load(&path).unwrap(), sample());
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn test_load_rejects_bad_magic() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("AssetRegistry.bin");
        std::fs::write(&path, b"NOPE\x01\x00\x00\x00").unwrap();

        assert!(matches!(
            AssetIndex::load(&path),
            Err(AssetIndexError::BadMagic(_))
        ));
    }

    #[test]
    fn test_load_rejects_future_version() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("AssetRegistry.bin");
        let mut bytes = ASSET_INDEX_MAGIC.to_vec();
        bytes.extend_from_slice(&9u32.to_le_bytes());
        std::fs::write(&path, bytes).unwrap();

        assert!(matches!(
            AssetIndex::load(&path),
            Err(AssetIndexError::UnsupportedVersion { version: 9, .. })
        ));
    }

    #[test]
    fn test_load_non_empty_rejects_empty_index() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("AssetRegistry.bin");
        AssetIndex::new().save(&path).unwrap();

        assert!(matches!(
            AssetIndex::load_non_empty(&path),
            Err(AssetIndexError::Empty {
                what: "packages",
                ..
            })
        ));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let temp = TempDir::new().unwrap();
        assert!(matches!(
            AssetIndex::load(&temp.path().join("missing.bin")),
            Err(AssetIndexError::Io { .. })
        ));
    }
}
