//! Layered platform file system.
//!
//! File access goes through a chain of layers. The bottom layer is always a
//! native [`PlatformFile`]; an archive layer may sit on top of it, serving
//! files from mounted archives before falling through to the layer below.
//!
//! ```text
//! top ──► Archive(ArchiveFileSystem) ──► Native(PhysicalPlatformFile)
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;

/// Type name reported by archive layers.
pub const ARCHIVE_LAYER_TYPE: &str = "ArchiveFile";

/// Type name of [`PhysicalPlatformFile`].
pub const PHYSICAL_LAYER_TYPE: &str = "PhysicalFile";

/// A native file-system layer.
pub trait PlatformFile: Send + Sync {
    fn type_name(&self) -> &str;
}

/// The host operating system's file system.
#[derive(Debug, Default)]
pub struct PhysicalPlatformFile;

impl PlatformFile for PhysicalPlatformFile {
    fn type_name(&self) -> &str {
        PHYSICAL_LAYER_TYPE
    }
}

/// A file-system layer serving files out of mounted archives.
///
/// Implementations must not call back into the [`PlatformFileManager`] from
/// [`initialize`](Self::initialize).
pub trait ArchiveFileSystem: Send + Sync {
    fn type_name(&self) -> &str {
        ARCHIVE_LAYER_TYPE
    }

    /// Attach to the layer below. Returns `false` if the layer is unusable.
    fn initialize(&self, lower: &Layer) -> bool;

    /// Mount `archive` at the virtual `mount_point` with priority `order`.
    fn mount(&self, archive: &Path, order: u32, mount_point: &str) -> bool;

    fn unmount(&self, archive: &Path) -> bool;

    fn mounted_archives(&self) -> Vec<PathBuf>;
}

/// One link in the layer chain.
#[derive(Clone)]
pub enum Layer {
    Native(Arc<dyn PlatformFile>),
    Archive {
        archive: Arc<dyn ArchiveFileSystem>,
        lower: Box<Layer>,
    },
}

impl Layer {
    pub fn type_name(&self) -> &str {
        match self {
            Layer::Native(file) => file.type_name(),
            Layer::Archive { archive, .. } => archive.type_name(),
        }
    }

    pub fn is_archive(&self) -> bool {
        matches!(self, Layer::Archive { .. })
    }

    /// The first archive layer in the chain, searching downward from here.
    pub fn find_archive(&self) -> Option<Arc<dyn ArchiveFileSystem>> {
        match self {
            Layer::Native(_) => None,
            Layer::Archive { archive, .. } => Some(Arc::clone(archive)),
        }
    }

    /// Number of layers from here to the bottom.
    pub fn depth(&self) -> usize {
        match self {
            Layer::Native(_) => 1,
            Layer::Archive { lower, .. } => 1 + lower.depth(),
        }
    }

    /// Returns `true` if both layers are the same object at the top.
    pub fn same_as(&self, other: &Layer) -> bool {
        match (self, other) {
            (Layer::Native(a), Layer::Native(b)) => std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b)),
            (Layer::Archive { archive: a, .. }, Layer::Archive { archive: b, .. }) => {
                std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
            }
            _ => false,
        }
    }
}

impl fmt::Debug for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Layer::Native(file) => write!(f, "{}", file.type_name()),
            Layer::Archive { archive, lower } => write!(f, "{} -> {:?}", archive.type_name(), lower),
        }
    }
}

/// Result of [`PlatformFileManager::acquire_archive_layer`].
pub(crate) enum ArchiveAcquisition {
    /// An archive layer was already installed in the chain.
    AlreadyInstalled(Arc<dyn ArchiveFileSystem>),
    /// The platform archive layer was pushed on top of `previous`.
    Installed {
        archive: Arc<dyn ArchiveFileSystem>,
        previous: Layer,
    },
    /// The platform cannot provide an archive layer.
    Unavailable,
}

/// Process-wide owner of the top file-system layer.
pub struct PlatformFileManager {
    top: Mutex<Layer>,
    archive_impl: Option<Arc<dyn ArchiveFileSystem>>,
}

impl PlatformFileManager {
    /// Manager whose chain is just `native`. `archive_impl` is the platform's
    /// archive layer, installed on demand.
    pub fn new(native: Arc<dyn PlatformFile>, archive_impl: Option<Arc<dyn ArchiveFileSystem>>) -> Self {
        Self {
            top: Mutex::new(Layer::Native(native)),
            archive_impl,
        }
    }

    /// Manager whose chain already has `archive` installed above `native`.
    pub fn with_archive_installed(native: Arc<dyn PlatformFile>, archive: Arc<dyn ArchiveFileSystem>) -> Self {
        let lower = Layer::Native(native);
        archive.initialize(&lower);
        Self {
            top: Mutex::new(Layer::Archive {
                archive: Arc::clone(&archive),
                lower: Box::new(lower),
            }),
            archive_impl: Some(archive),
        }
    }

    pub fn top_level(&self) -> Layer {
        self.top.lock().clone()
    }

    pub fn set_top_level(&self, layer: Layer) {
        *self.top.lock() = layer;
    }

    /// The archive layer currently installed in the chain, if any.
    pub fn find_archive_layer(&self) -> Option<Arc<dyn ArchiveFileSystem>> {
        self.top.lock().find_archive()
    }

    pub fn is_archive_installed(&self) -> bool {
        self.find_archive_layer().is_some()
    }

    /// The platform's archive implementation, installed or not.
    pub fn archive_implementation(&self) -> Option<Arc<dyn ArchiveFileSystem>> {
        self.archive_impl.clone()
    }

    /// Find or install the archive layer under a single lock.
    pub(crate) fn acquire_archive_layer(&self) -> ArchiveAcquisition {
        let mut top = self.top.lock();
        if let Some(archive) = top.find_archive() {
            return ArchiveAcquisition::AlreadyInstalled(archive);
        }
        let Some(archive) = self.archive_impl.clone() else {
            return ArchiveAcquisition::Unavailable;
        };

        let previous = top.clone();
        archive.initialize(&previous);
        *top = Layer::Archive {
            archive: Arc::clone(&archive),
            lower: Box::new(previous.clone()),
        };
        ArchiveAcquisition::Installed { archive, previous }
    }
}

impl fmt::Debug for PlatformFileManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlatformFileManager")
            .field("top", &*self.top.lock())
            .field("has_archive_impl", &self.archive_impl.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::local::LocalArchiveFileSystem;

    #[test]
    fn test_new_manager_has_native_top() {
        let manager = PlatformFileManager::new(Arc::new(PhysicalPlatformFile), None);
        assert_eq!(manager.top_level().type_name(), PHYSICAL_LAYER_TYPE);
        assert!(!manager.is_archive_installed());
        assert!(manager.archive_implementation().is_none());
    }

    #[test]
    fn test_with_archive_installed() {
        let archive = Arc::new(LocalArchiveFileSystem::new());
        let manager = PlatformFileManager::with_archive_installed(Arc::new(PhysicalPlatformFile), archive);

        let top = manager.top_level();
        assert!(top.is_archive());
        assert_eq!(top.depth(), 2);
        assert!(manager.is_archive_installed());
    }

    #[test]
    fn test_acquire_installs_once() {
        let archive = Arc::new(LocalArchiveFileSystem::new());
        let manager = PlatformFileManager::new(Arc::new(PhysicalPlatformFile), Some(archive));

        assert!(matches!(
            manager.acquire_archive_layer(),
            ArchiveAcquisition::Installed { .. }
        ));
        assert!(matches!(
            manager.acquire_archive_layer(),
            ArchiveAcquisition::AlreadyInstalled(_)
        ));
        assert_eq!(manager.top_level().depth(), 2);
    }

    #[test]
    fn test_same_as_compares_identity() {
        let native: Arc<dyn PlatformFile> = Arc::new(PhysicalPlatformFile);
        let a = Layer::Native(Arc::clone(&native));
        let b = Layer::Native(native);
        let c = Layer::Native(Arc::new(PhysicalPlatformFile));
        assert!(a.same_as(&b));
        assert!(!a.same_as(&c));
    }
}
