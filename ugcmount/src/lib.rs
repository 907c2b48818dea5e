//! ugcmount - Lifecycle management for user generated content packages.
//!
//! This library discovers UGC packages on disk, validates them against the
//! running engine version, mounts their archives into a layered virtual file
//! system, registers their assets and tears all of that down again when the
//! package is removed.
//!
//! # Architecture
//!
//! ```text
//! UgcProvider ──paths──► UgcRegistry ──load──► UgcPackage
//!                          │    ▲                 │
//!                          │    │ events          ├─ ArchiveMountOverride
//!                          ▼    │                 ├─ AssetRegistry
//!                    CompatibilityChecker         └─ PrimaryAssetDirectory
//! ```
//!
//! Every host facility the registry touches sits behind a trait in
//! [`platform`], collected into [`platform::HostServices`]. The
//! [`platform::local`] module implements all of them on top of the local
//! file system.

pub mod compat;
pub mod config;
pub mod events;
pub mod logging;
pub mod package;
pub mod platform;
pub mod provider;
pub mod registry;
pub mod session;

#[cfg(test)]
pub(crate) mod testing;

pub use package::{MountState, PackageId, UgcPackage};
pub use registry::UgcRegistry;

/// Library version, as recorded in the crate manifest.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
