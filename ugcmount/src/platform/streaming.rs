//! Asynchronous loading of package metadata assets.

use std::sync::Arc;

use crate::package::UgcMetadata;

/// In-flight or completed load of one metadata asset.
pub trait LoadHandle: Send {
    /// Block until the load has finished.
    ///
    /// # Panics
    ///
    /// Implementations may block on a synchronous channel receive, which
    /// panics when called from inside an async runtime. Call this from a
    /// plain thread.
    fn wait_until_complete(&mut self);

    /// The loaded asset, once complete. `None` if missing or of the wrong type.
    fn loaded_asset(&self) -> Option<Arc<UgcMetadata>>;

    /// Drop the handle's hold on the asset. Idempotent.
    fn release(&mut self);

    fn is_active(&self) -> bool;
}

/// Host streaming manager.
pub trait StreamableLoader: Send + Sync {
    /// Returns `true` if the package of `object_path` exists.
    fn package_exists(&self, object_path: &str) -> bool;

    fn request_async_load(&self, object_path: &str) -> Option<Box<dyn LoadHandle>>;

    /// Finish every outstanding load.
    fn flush_async_loading(&self);

    /// Evict assets no handle holds any more.
    fn collect_garbage(&self);
}
