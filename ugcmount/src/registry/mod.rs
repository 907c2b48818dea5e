//! The UGC registry.
//!
//! [`UgcRegistry`] owns every live [`UgcPackage`](crate::package::UgcPackage).
//! A refresh pass runs:
//!
//! 1. Skip while cooking, or without an enabled provider
//! 2. Unload every live package
//! 3. List compatible descriptors below each provider path
//! 4. Load every newly discovered, not yet enabled plugin
//! 5. Unmount packages whose descriptor file has disappeared
//! 6. Notify "packages changed" once if anything changed
//!
//! Loading, unloading and unmounting are also available individually.

mod error;
mod features;
mod subsystem;
mod types;

pub use error::{RegistryError, RegistryResult};
pub use features::UgcFeature;
pub use subsystem::UgcRegistry;
pub use types::{LoadOutcome, RefreshOutcome, RefreshSummary, SkipReason, UnloadOutcome};
