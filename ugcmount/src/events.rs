//! Multicast notifications.
//!
//! [`Multicast`] is a small observer list: handlers are added and removed by
//! [`HandlerId`] and invoked in registration order on every broadcast.
//! Broadcasting iterates over a snapshot, so a handler may add or remove
//! handlers without deadlocking.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::package::PackageId;

/// Identifies a registered handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerId(u64);

pub(crate) type Handler<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// Payload for the "mod enabled state changed" notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnabledStateChange {
    pub id: PackageId,
    pub enabled: bool,
}

/// An ordered list of handlers receiving `&T`.
pub struct Multicast<T> {
    next_id: AtomicU64,
    handlers: Mutex<Vec<(HandlerId, Handler<T>)>>,
}

impl<T> Multicast<T> {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            handlers: Mutex::new(Vec::new()),
        }
    }

    /// Registers a handler and returns its id.
    pub fn add<F>(&self, handler: F) -> HandlerId
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let id = HandlerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.handlers.lock().push((id, Arc::new(handler)));
        id
    }

    /// Removes a handler. Returns `false` if the id was not registered.
    pub fn remove(&self, id: HandlerId) -> bool {
        let mut handlers = self.handlers.lock();
        let before = handlers.len();
        handlers.retain(|(existing, _)| *existing != id);
        handlers.len() != before
    }

    pub fn clear(&self) {
        self.handlers.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.handlers.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.lock().is_empty()
    }

    /// Invokes every handler with `args`.
    pub fn broadcast(&self, args: &T) {
        let snapshot: Vec<Handler<T>> = self
            .handlers
            .lock()
            .iter()
            .map(|(_, handler)| Arc::clone(handler))
            .collect();
        for handler in snapshot {
            handler(args);
        }
    }

    /// Detaches all handlers, for a later [`restore`](Self::restore).
    pub(crate) fn take_all(&self) -> Vec<(HandlerId, Handler<T>)> {
        std::mem::take(&mut *self.handlers.lock())
    }

    /// Reattaches handlers detached by [`take_all`](Self::take_all) ahead of
    /// any registered since.
    pub(crate) fn restore(&self, mut saved: Vec<(HandlerId, Handler<T>)>) {
        let mut handlers = self.handlers.lock();
        saved.append(&mut handlers);
        *handlers = saved;
    }
}

impl<T> Default for Multicast<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Multicast<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Multicast")
            .field("handlers", &self.len())
            .finish()
    }
}
