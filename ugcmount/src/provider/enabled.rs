//! Per-mod enabled state.

use std::collections::HashSet;

use parking_lot::RwLock;

use crate::package::PackageId;

/// Decides whether individual mods are switched on.
pub trait EnabledStateProvider: Send + Sync {
    fn is_enabled(&self, id: PackageId) -> bool;

    /// Ask for a state change. Returns `true` if the change was accepted.
    fn request_state_change(&self, id: PackageId, enabled: bool) -> bool;
}

/// Enabled-state provider backed by an in-memory set of disabled ids.
///
/// Every mod starts enabled.
#[derive(Debug, Default)]
pub struct InMemoryEnabledState {
    disabled: RwLock<HashSet<PackageId>>,
}

impl InMemoryEnabledState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_disabled(ids: impl IntoIterator<Item = PackageId>) -> Self {
        Self {
            disabled: RwLock::new(ids.into_iter().collect()),
        }
    }
}

impl EnabledStateProvider for InMemoryEnabledState {
    fn is_enabled(&self, id: PackageId) -> bool {
        !self.disabled.read().contains(&id)
    }

    fn request_state_change(&self, id: PackageId, enabled: bool) -> bool {
        if !id.is_set() {
            return false;
        }
        let mut disabled = self.disabled.write();
        if enabled {
            disabled.remove(&id);
        } else {
            disabled.insert(id);
        }
        true
    }
}
