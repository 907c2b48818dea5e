//! Outcomes of registry operations.

use std::fmt;

/// Result of [`UgcRegistry::load`](super::UgcRegistry::load).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The package was mounted and added to the live set.
    Loaded,
    /// The descriptor is already tracked. Nothing changed.
    AlreadyLoaded,
}

/// Result of the unload operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnloadOutcome {
    /// This many packages were torn down and removed.
    Unloaded(usize),
    /// Nothing matched, so nothing was loaded to begin with.
    NotFound,
}

impl UnloadOutcome {
    pub fn count(self) -> usize {
        match self {
            UnloadOutcome::Unloaded(n) => n,
            UnloadOutcome::NotFound => 0,
        }
    }
}

/// Why a refresh did not run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Cooking content or running a commandlet.
    Cooking,
    NoProvider,
    ProviderDisabled,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Cooking => write!(f, "cooking or running a commandlet"),
            SkipReason::NoProvider => write!(f, "no UGC provider is set"),
            SkipReason::ProviderDisabled => write!(f, "UGC provider is not enabled"),
        }
    }
}

/// Counts from one completed refresh pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshSummary {
    /// Packages torn down at the start of the pass.
    pub unloaded: usize,
    /// Packages mounted during the pass.
    pub loaded: usize,
    /// Packages unmounted because their descriptor file disappeared.
    pub unmounted_missing: usize,
}

impl RefreshSummary {
    /// Whether the live set changed during the pass.
    pub fn changed(&self) -> bool {
        self.unloaded > 0 || self.loaded > 0 || self.unmounted_missing > 0
    }
}

/// Result of [`UgcRegistry::refresh`](super::UgcRegistry::refresh).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Skipped(SkipReason),
    Completed(RefreshSummary),
}

impl RefreshOutcome {
    /// The summary, if the pass ran.
    pub fn summary(&self) -> Option<RefreshSummary> {
        match self {
            RefreshOutcome::Completed(summary) => Some(*summary),
            RefreshOutcome::Skipped(_) => None,
        }
    }
}
