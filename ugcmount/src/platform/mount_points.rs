//! Virtual namespace roots.
//!
//! A mount point maps a virtual root such as `/Red/` onto the content
//! directory serving it. The same pair may be registered more than once (the
//! plugin manager and the registry each add one); every registration needs
//! its own unregistration.

use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tracing::trace;

use crate::events::{Handler, HandlerId, Multicast};
use crate::package::naming::is_under_virtual_root;

/// Payload of the dismount notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentPathDismounted {
    pub root: String,
    pub content_path: PathBuf,
}

/// Registry of virtual roots.
#[derive(Debug, Default)]
pub struct MountPointTable {
    entries: Mutex<Vec<(String, PathBuf)>>,
    dismounted: Multicast<ContentPathDismounted>,
}

impl MountPointTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, root: &str, content_path: &Path) {
        trace!(root, content = %content_path.display(), "Registering mount point");
        self.entries
            .lock()
            .push((normalize_root(root), content_path.to_path_buf()));
    }

    /// Remove one registration of `(root, content_path)`.
    ///
    /// Returns `false` if no such registration exists. Fires the dismount
    /// notification when the root's last registration goes away.
    pub fn unregister(&self, root: &str, content_path: &Path) -> bool {
        let root = normalize_root(root);
        let last_gone = {
            let mut entries = self.entries.lock();
            let Some(index) = entries
                .iter()
                .position(|(r, c)| *r == root && c == content_path)
            else {
                return false;
            };
            entries.remove(index);
            !entries.iter().any(|(r, _)| *r == root)
        };

        trace!(root = %root, content = %content_path.display(), "Unregistered mount point");
        if last_gone {
            self.dismounted.broadcast(&ContentPathDismounted {
                root,
                content_path: content_path.to_path_buf(),
            });
        }
        true
    }

    pub fn is_registered(&self, root: &str) -> bool {
        let root = normalize_root(root);
        self.entries.lock().iter().any(|(r, _)| *r == root)
    }

    /// Number of registrations of `root`.
    pub fn registration_count(&self, root: &str) -> usize {
        let root = normalize_root(root);
        self.entries.lock().iter().filter(|(r, _)| *r == root).count()
    }

    pub fn content_path(&self, root: &str) -> Option<PathBuf> {
        let root = normalize_root(root);
        self.entries
            .lock()
            .iter()
            .find(|(r, _)| *r == root)
            .map(|(_, c)| c.clone())
    }

    /// Map a virtual package path, e.g. `/Red/Items/Sword`, to a file path
    /// beneath the matching content directory.
    pub fn resolve(&self, package_path: &str) -> Option<PathBuf> {
        let entries = self.entries.lock();
        let (root, content) = entries
            .iter()
            .filter(|(root, _)| is_under_virtual_root(package_path, root))
            .max_by_key(|(root, _)| root.len())?;

        let relative = package_path[root.len()..].trim_start_matches('/');
        if relative.is_empty() {
            Some(content.clone())
        } else {
            Some(content.join(relative))
        }
    }

    /// Dismount notification list.
    pub fn on_dismounted(&self) -> &Multicast<ContentPathDismounted> {
        &self.dismounted
    }

    /// Silence dismount notifications until the returned guard drops.
    pub fn suspend_dismount_events(&self) -> DismountEventPause<'_> {
        DismountEventPause {
            table: self,
            saved: Some(self.dismounted.take_all()),
        }
    }
}

/// Restores dismount handlers on drop.
pub struct DismountEventPause<'a> {
    table: &'a MountPointTable,
    saved: Option<Vec<(HandlerId, Handler<ContentPathDismounted>)>>,
}

impl Drop for DismountEventPause<'_> {
    fn drop(&mut self) {
        if let Some(saved) = self.saved.take() {
            self.table.dismounted.restore(saved);
        }
    }
}

/// `/Red/` and `/Red` are the same root.
fn normalize_root(root: &str) -> String {
    let trimmed = root.trim_end_matches('/');
    if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    }
}
