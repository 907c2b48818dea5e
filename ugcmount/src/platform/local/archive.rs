//! Archive layer over local archive files.

use std::collections::BTreeMap;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::platform::{ArchiveFileSystem, Layer};

/// Magic bytes at the start of every mountable archive.
pub const ARCHIVE_MAGIC: &[u8; 4] = b"UGCA";

/// A mounted archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountRecord {
    pub mount_point: String,
    pub order: u32,
}

/// Records mounts of archive files whose header carries [`ARCHIVE_MAGIC`].
#[derive(Debug, Default)]
pub struct LocalArchiveFileSystem {
    mounts: Mutex<BTreeMap<PathBuf, MountRecord>>,
    lower: Mutex<Option<String>>,
}

impl LocalArchiveFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mount_record(&self, archive: &Path) -> Option<MountRecord> {
        self.mounts.lock().get(archive).cloned()
    }

    /// Type name of the layer this one was last initialised over.
    pub fn lower_layer(&self) -> Option<String> {
        self.lower.lock().clone()
    }

    pub fn mount_count(&self) -> usize {
        self.mounts.lock().len()
    }
}

impl ArchiveFileSystem for LocalArchiveFileSystem {
    fn initialize(&self, lower: &Layer) -> bool {
        *self.lower.lock() = Some(lower.type_name().to_string());
        true
    }

    fn mount(&self, archive: &Path, order: u32, mount_point: &str) -> bool {
        let mut magic = [0u8; 4];
        let header = std::fs::File::open(archive).and_then(|mut f| f.read_exact(&mut magic));
        if let Err(e) = header {
            warn!(archive = %archive.display(), error = %e, "Unable to open archive");
            return false;
        }
        if &magic != ARCHIVE_MAGIC {
            warn!(archive = %archive.display(), "Not a mountable archive");
            return false;
        }

        debug!(archive = %archive.display(), mount_point, order, "Mounted archive");
        self.mounts.lock().insert(
            archive.to_path_buf(),
            MountRecord {
                mount_point: mount_point.to_string(),
                order,
            },
        );
        true
    }

    fn unmount(&self, archive: &Path) -> bool {
        self.mounts.lock().remove(archive).is_some()
    }

    fn mounted_archives(&self) -> Vec<PathBuf> {
        self.mounts.lock().keys().cloned().collect()
    }
}

/// Write a minimal mountable archive to `path`.
pub fn write_archive(path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = std::fs::File::create(path)?;
    file.write_all(ARCHIVE_MAGIC)?;
    file.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_mount_valid_archive() {
        let temp = TempDir::new().unwrap();
        let pak = temp.path().join("Paks/Red.pak");
        write_archive(&pak).unwrap();
        let fs = LocalArchiveFileSystem::new();

        assert!(fs.mount(&pak, 4, "/Red/"));
        assert_eq!(
            fs.mount_record(&pak),
            Some(MountRecord {
                mount_point: "/Red/".to_string(),
                order: 4
            })
        );
        assert!(fs.unmount(&pak));
        assert!(!fs.unmount(&pak));
    }

    #[test]
    fn test_mount_rejects_bad_magic_and_missing_file() {
        let temp = TempDir::new().unwrap();
        let bad = temp.path().join("Bad.pak");
        std::fs::write(&bad, b"ZIP!").unwrap();
        let fs = LocalArchiveFileSystem::new();

        assert!(!fs.mount(&bad, 4, "/Bad/"));
        assert!(!fs.mount(&temp.path().join("missing.pak"), 4, "/Missing/"));
        assert_eq!(fs.mount_count(), 0);
    }
}
