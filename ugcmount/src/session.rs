//! Editor play sessions.
//!
//! Editor builds run on the native file layer. While a play session is
//! active, UGC assets have to stream from their archives, so
//! [`PlaySessionOverride`] keeps an [`ArchiveMountOverride`] alive for the
//! length of the session. Ending the session unmounts every live package
//! before the native layer is restored.

use std::sync::Arc;

use tracing::{info, warn};

use crate::platform::{ArchiveMountOverride, PlatformFileManager};
use crate::registry::UgcRegistry;

/// Holds the archive layer open across an editor play session.
#[derive(Debug)]
pub struct PlaySessionOverride {
    files: Arc<PlatformFileManager>,
    active: Option<ArchiveMountOverride>,
}

impl PlaySessionOverride {
    pub fn new(files: Arc<PlatformFileManager>) -> Self {
        Self { files, active: None }
    }

    /// Whether this session installed the archive layer.
    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Install the archive layer unless one is already in use.
    ///
    /// Returns `true` if this call installed it.
    pub fn begin_play(&mut self) -> bool {
        if self.active.is_some() {
            return false;
        }
        if self.files.is_archive_installed() {
            info!("Archive layer is already in use, no play session override needed");
            return false;
        }

        let layer = ArchiveMountOverride::acquire(&self.files);
        if !layer.is_valid() {
            warn!("No archive layer available, UGC cannot load from archives during play");
            return false;
        }
        warn!("Archive layer is not in use, overriding it so UGC loads from archives during play");
        self.active = Some(layer);
        true
    }

    /// Unmount and remove every live package, then release the override.
    ///
    /// Packages stay as they are when the engine is exiting. Returns the
    /// number of packages unmounted.
    pub fn end_play(&mut self, registry: &mut UgcRegistry) -> usize {
        let unmounted = if registry.services().is_engine_exit_requested() {
            0
        } else {
            registry.unmount_all(true)
        };
        self.active = None;
        unmounted
    }

    /// Bring the override in line with whether a session is playing.
    pub fn refresh(&mut self, is_playing: bool, registry: &mut UgcRegistry) {
        if is_playing {
            self.begin_play();
        } else {
            self.end_play(registry);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UgcSettings;
    use crate::platform::local::LocalHost;
    use crate::platform::{HostEnvironment, PluginManager};
    use crate::registry::LoadOutcome;
    use crate::testing::BundleBuilder;
    use tempfile::TempDir;

    fn editor() -> LocalHost {
        LocalHost::new(HostEnvironment::editor(Default::default()))
    }

    fn load_one(host: &LocalHost, registry: &mut UgcRegistry, root: &std::path::Path) {
        let descriptor = BundleBuilder::new("Red").write(root);
        host.plugins.add_to_plugins_list(&descriptor);
        host.plugins.refresh_plugins_list();
        let plugin = host.plugins.find_plugin("Red").unwrap();
        assert_eq!(registry.load(plugin, None).unwrap(), LoadOutcome::Loaded);
    }

    #[test]
    fn test_play_session_installs_and_restores() {
        let temp = TempDir::new().unwrap();
        let host = editor();
        let mut registry = UgcRegistry::new(host.services.clone(), UgcSettings::default());
        let mut session = PlaySessionOverride::new(host.services.files.clone());

        assert!(session.begin_play());
        assert!(host.services.files.is_archive_installed());
        assert!(!session.begin_play());

        load_one(&host, &mut registry, temp.path());
        assert_eq!(host.archives.mount_count(), 1);

        assert_eq!(session.end_play(&mut registry), 1);
        assert!(!session.is_active());
        assert!(!host.services.files.is_archive_installed());
        assert!(registry.is_empty());
        assert_eq!(host.archives.mount_count(), 0);
    }

    #[test]
    fn test_runtime_host_needs_no_override() {
        let host = LocalHost::new(HostEnvironment::default());
        let mut session = PlaySessionOverride::new(host.services.files.clone());

        assert!(!session.begin_play());
        assert!(!session.is_active());
    }

    #[test]
    fn test_exit_keeps_packages_mounted() {
        let temp = TempDir::new().unwrap();
        let host = editor();
        let mut registry = UgcRegistry::new(host.services.clone(), UgcSettings::default());
        let mut session = PlaySessionOverride::new(host.services.files.clone());
        session.refresh(true, &mut registry);
        load_one(&host, &mut registry, temp.path());

        host.services.request_engine_exit();
        session.refresh(false, &mut registry);

        assert!(!session.is_active());
        assert_eq!(registry.len(), 1);
        assert!(!host.services.files.is_archive_installed());
    }
}
