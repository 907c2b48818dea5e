//! Scoped access to the archive file-system layer.
//!
//! Mounting needs an archive layer in the file-system chain. Runtime builds
//! normally have one installed for their own content; editor builds do not.
//! [`ArchiveMountOverride`] bridges both cases:
//!
//! - If an archive layer is already installed, the override just holds it.
//! - Otherwise it installs the platform's archive layer on top, and restores
//!   the previous top layer when dropped.
//!
//! The platform archive layer is a long-lived object owned by the
//! [`PlatformFileManager`], so archives mounted under one override remain
//! mounted after it is dropped and can be unmounted under a later one.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, error, trace};

use super::file_manager::{ArchiveAcquisition, ArchiveFileSystem, Layer, PlatformFileManager};

/// Guard giving access to an archive layer for its lifetime.
pub struct ArchiveMountOverride {
    manager: Arc<PlatformFileManager>,
    archive: Option<Arc<dyn ArchiveFileSystem>>,
    previous: Option<Layer>,
}

impl ArchiveMountOverride {
    /// Find or install the archive layer.
    ///
    /// If the platform cannot provide one the override is invalid; see
    /// [`is_valid`](Self::is_valid).
    pub fn acquire(manager: &Arc<PlatformFileManager>) -> Self {
        let (archive, previous) = match manager.acquire_archive_layer() {
            ArchiveAcquisition::AlreadyInstalled(archive) => {
                trace!("Archive layer already installed");
                (Some(archive), None)
            }
            ArchiveAcquisition::Installed { archive, previous } => {
                debug!(previous = previous.type_name(), "Installed archive layer override");
                (Some(archive), Some(previous))
            }
            ArchiveAcquisition::Unavailable => {
                error!("Platform cannot provide an archive file system layer");
                (None, None)
            }
        };

        Self {
            manager: Arc::clone(manager),
            archive,
            previous,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.archive.is_some()
    }

    /// Returns `true` if this override installed the layer and will restore
    /// the previous one on drop.
    pub fn is_installed_by_override(&self) -> bool {
        self.previous.is_some()
    }

    /// The archive layer.
    ///
    /// # Panics
    ///
    /// Panics if the override is invalid. Mounting without an archive layer
    /// is a fatal host misconfiguration.
    pub fn archive(&self) -> &dyn ArchiveFileSystem {
        match &self.archive {
            Some(archive) => archive.as_ref(),
            None => panic!("attempted to use an invalid archive file system layer"),
        }
    }

    pub fn mount(&self, archive: &Path, order: u32, mount_point: &str) -> bool {
        self.archive().mount(archive, order, mount_point)
    }

    pub fn unmount(&self, archive: &Path) -> bool {
        self.archive().unmount(archive)
    }
}

impl Drop for ArchiveMountOverride {
    fn drop(&mut self) {
        if let Some(previous) = self.previous.take() {
            debug!(restored = previous.type_name(), "Restoring file system layer");
            self.manager.set_top_level(previous);
        }
    }
}

impl fmt::Debug for ArchiveMountOverride {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArchiveMountOverride")
            .field("valid", &self.is_valid())
            .field("installed", &self.is_installed_by_override())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::file_manager::{PhysicalPlatformFile, PHYSICAL_LAYER_TYPE};
    use crate::platform::local::{write_archive, LocalArchiveFileSystem};
    use tempfile::TempDir;

    fn editor_manager() -> (Arc<PlatformFileManager>, Arc<LocalArchiveFileSystem>) {
        let archive = Arc::new(LocalArchiveFileSystem::new());
        let manager = Arc::new(PlatformFileManager::new(
            Arc::new(PhysicalPlatformFile),
            Some(archive.clone()),
        ));
        (manager, archive)
    }

    #[test]
    fn test_override_installs_and_restores() {
        let (manager, _) = editor_manager();
        let before = manager.top_level();

        {
            let guard = ArchiveMountOverride::acquire(&manager);
            assert!(guard.is_valid());
            assert!(guard.is_installed_by_override());
            assert!(manager.top_level().is_archive());
        }

        let after = manager.top_level();
        assert_eq!(after.type_name(), PHYSICAL_LAYER_TYPE);
        assert!(after.same_as(&before));
    }

    #[test]
    fn test_nested_override_does_not_restore() {
        let (manager, _) = editor_manager();

        let outer = ArchiveMountOverride::acquire(&manager);
        {
            let inner = ArchiveMountOverride::acquire(&manager);
            assert!(!inner.is_installed_by_override());
        }
        assert!(manager.top_level().is_archive());

        drop(outer);
        assert!(!manager.top_level().is_archive());
    }

    #[test]
    fn test_mounts_survive_override_scope() {
        let temp = TempDir::new().unwrap();
        let pak = temp.path().join("Red.pak");
        write_archive(&pak).unwrap();
        let (manager, archive) = editor_manager();

        {
            let guard = ArchiveMountOverride::acquire(&manager);
            assert!(guard.mount(&pak, 4, "/Red/"));
        }
        assert_eq!(archive.mounted_archives(), vec![pak.clone()]);

        let guard = ArchiveMountOverride::acquire(&manager);
        assert!(guard.unmount(&pak));
        assert!(archive.mounted_archives().is_empty());
    }

    #[test]
    fn test_missing_archive_support_is_invalid() {
        let manager = Arc::new(PlatformFileManager::new(Arc::new(PhysicalPlatformFile), None));
        let guard = ArchiveMountOverride::acquire(&manager);
        assert!(!guard.is_valid());
    }

    #[test]
    #[should_panic(expected = "invalid archive file system layer")]
    fn test_invalid_override_panics_on_use() {
        let manager = Arc::new(PlatformFileManager::new(Arc::new(PhysicalPlatformFile), None));
        let guard = ArchiveMountOverride::acquire(&manager);
        guard.mount(Path::new("/nowhere/Red.pak"), 4, "/Red/");
    }
}
