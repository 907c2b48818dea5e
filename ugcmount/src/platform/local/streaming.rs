//! Metadata loader reading JSON assets on a worker thread.
//!
//! `/<Root>/<Name>.<Name>` resolves through the [`MountPointTable`] to
//! `<content dir>/<Name>.json`. Loads run on a spawned thread and hand their
//! result back over a `tokio::sync::oneshot` channel; waiting on a handle
//! blocks the caller on that channel with `blocking_recv`, so it must not be
//! called from within a tokio runtime.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::{debug, trace, warn};

use crate::package::naming::object_path_to_package_name;
use crate::package::UgcMetadata;
use crate::platform::{LoadHandle, MountPointTable, StreamableLoader};

type LoadResult = Option<Arc<UgcMetadata>>;

#[derive(Debug, Default)]
struct Resident {
    /// Object path -> (asset, live handle count).
    assets: HashMap<String, (Arc<UgcMetadata>, usize)>,
}

/// Streams metadata assets from package content directories.
#[derive(Debug)]
pub struct LocalStreamableLoader {
    mount_points: Arc<MountPointTable>,
    resident: Arc<Mutex<Resident>>,
    garbage_collections: AtomicUsize,
}

impl LocalStreamableLoader {
    pub fn new(mount_points: Arc<MountPointTable>) -> Self {
        Self {
            mount_points,
            resident: Arc::new(Mutex::new(Resident::default())),
            garbage_collections: AtomicUsize::new(0),
        }
    }

    /// Number of assets currently held in memory.
    pub fn resident_count(&self) -> usize {
        self.resident.lock().assets.len()
    }

    pub fn is_resident(&self, object_path: &str) -> bool {
        self.resident.lock().assets.contains_key(object_path)
    }

    pub fn garbage_collections(&self) -> usize {
        self.garbage_collections.load(Ordering::SeqCst)
    }

    fn resolve_file(&self, object_path: &str) -> Option<PathBuf> {
        let package = object_path_to_package_name(object_path);
        self.mount_points
            .resolve(package)
            .map(|path| path.with_extension("json"))
    }
}

impl StreamableLoader for LocalStreamableLoader {
    fn package_exists(&self, object_path: &str) -> bool {
        self.resolve_file(object_path).is_some_and(|path| path.is_file())
    }

    fn request_async_load(&self, object_path: &str) -> Option<Box<dyn LoadHandle>> {
        let file = self.resolve_file(object_path)?;
        let (sender, receiver) = oneshot::channel::<LoadResult>();

        let spawned = std::thread::Builder::new()
            .name("ugc-metadata-load".to_string())
            .spawn(move || {
                let result = match UgcMetadata::load_json(&file) {
                    Ok(metadata) => Some(Arc::new(metadata)),
                    Err(e) => {
                        warn!(file = %file.display(), error = %e, "Metadata load failed");
                        None
                    }
                };
                let _ = sender.send(result);
            });
        if let Err(e) = spawned {
            warn!(error = %e, "Unable to start metadata load");
            return None;
        }

        trace!(object_path, "Requested metadata load");
        Some(Box::new(LocalLoadHandle {
            object_path: object_path.to_string(),
            receiver: Some(receiver),
            asset: None,
            holding: false,
            resident: Arc::clone(&self.resident),
        }))
    }

    fn flush_async_loading(&self) {
        trace!("Flushed async loading");
    }

    fn collect_garbage(&self) {
        let mut resident = self.resident.lock();
        let before = resident.assets.len();
        resident.assets.retain(|_, (_, holders)| *holders > 0);
        let evicted = before - resident.assets.len();
        self.garbage_collections.fetch_add(1, Ordering::SeqCst);
        debug!(evicted, "Collected garbage");
    }
}

struct LocalLoadHandle {
    object_path: String,
    receiver: Option<oneshot::Receiver<LoadResult>>,
    asset: LoadResult,
    holding: bool,
    resident: Arc<Mutex<Resident>>,
}

impl LoadHandle for LocalLoadHandle {
    fn wait_until_complete(&mut self) {
        let Some(receiver) = self.receiver.take() else {
            return;
        };
        self.asset = receiver.blocking_recv().ok().flatten();
        if let Some(asset) = &self.asset {
            let mut resident = self.resident.lock();
            let entry = resident
                .assets
                .entry(self.object_path.clone())
                .or_insert_with(|| (Arc::clone(asset), 0));
            entry.1 += 1;
            self.holding = true;
        }
    }

    fn loaded_asset(&self) -> Option<Arc<UgcMetadata>> {
        self.asset.clone()
    }

    fn release(&mut self) {
        self.receiver = None;
        self.asset = None;
        if std::mem::take(&mut self.holding) {
            if let Some((_, holders)) = self.resident.lock().assets.get_mut(&self.object_path) {
                *holders = holders.saturating_sub(1);
            }
        }
    }

    fn is_active(&self) -> bool {
        self.receiver.is_some() || self.holding
    }
}

impl Drop for LocalLoadHandle {
    fn drop(&mut self) {
        self.release();
    }
}
