//! Side-loaded UGC from a local directory.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::{PackagePathMap, ProviderError, ProviderResult, UgcProvider};

/// Directory name used beneath the platform data dir by [`SideloadProvider::default_root`].
const DEFAULT_SIDELOAD_DIR: &str = "ugcmount/sideload";

/// Treats every subdirectory of a base directory as one installed package.
///
/// Side-loaded packages have no identifier.
#[derive(Debug, Clone)]
pub struct SideloadProvider {
    root: PathBuf,
}

impl SideloadProvider {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Provider over the per-user default sideload directory.
    pub fn with_default_root() -> ProviderResult<Self> {
        Self::default_root()
            .map(Self::new)
            .ok_or_else(|| ProviderError::Unavailable("no user data directory".to_string()))
    }

    /// `<data dir>/ugcmount/sideload`, if the platform has a data dir.
    pub fn default_root() -> Option<PathBuf> {
        dirs::data_dir().map(|dir| dir.join(DEFAULT_SIDELOAD_DIR))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl UgcProvider for SideloadProvider {
    fn initialize(&self) -> ProviderResult<()> {
        if self.root.is_dir() {
            info!(root = %self.root.display(), "Sideload provider ready");
        } else {
            warn!(root = %self.root.display(), "Sideload directory does not exist yet");
        }
        Ok(())
    }

    fn deinitialize(&self) -> ProviderResult<()> {
        debug!(root = %self.root.display(), "Sideload provider shut down");
        Ok(())
    }

    fn is_enabled(&self) -> bool {
        true
    }

    fn installed_paths(&self) -> PackagePathMap {
        let mut paths = PackagePathMap::new();
        let Ok(entries) = std::fs::read_dir(&self.root) else {
            debug!(root = %self.root.display(), "Sideload directory unreadable");
            return paths;
        };

        for entry in entries.flatten() {
            let path = entry.path();
            let hidden = entry.file_name().to_string_lossy().starts_with('.');
            if path.is_dir() && !hidden {
                paths.insert(path.to_string_lossy().into_owned(), None);
            }
        }

        paths
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_installed_paths_lists_subdirectories() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir(temp.path().join("Red")).unwrap();
        std::fs::create_dir(temp.path().join("Blue")).unwrap();
        std::fs::create_dir(temp.path().join(".cache")).unwrap();
        std::fs::write(temp.path().join("notes.txt"), b"x").unwrap();

        let provider = SideloadProvider::new(temp.path());
        let paths = provider.installed_paths();

        assert_eq!(paths.len(), 2);
        let red = temp.path().join("Red");
        assert_eq!(paths.get(&red.to_string_lossy()), Some(None));
    }

    #[test]
    fn test_missing_root_is_empty_and_initializes() {
        let temp = TempDir::new().unwrap();
        let provider = SideloadProvider::new(temp.path().join("absent"));

        assert!(provider.initialize().is_ok());
        assert!(provider.is_enabled());
        assert!(provider.installed_paths().is_empty());
    }
}
