//! Exported-resource handles.
//!
//! A handle stands for something outside the process that exposes encoded
//! bytes to the user (an object URL, a temp file, a clipboard entry). The
//! provider hands them out and must be told when one is no longer needed;
//! nothing collects them automatically.
//!
//! [`ExportHandle`] owns one such handle and releases it exactly once: either
//! explicitly through [`ExportHandle::release`] or when it is dropped. Storing
//! a new handle over an old one therefore releases the old one.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Opaque id of a resource held by a [`HandleProvider`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandleId(pub u64);

/// Something that can expose bytes to the outside world under an id.
pub trait HandleProvider: Send + Sync {
    fn acquire(&self, bytes: &[u8], mime: &str) -> HandleId;
    fn release(&self, id: HandleId);
}

/// Owned, scoped handle. Released on drop.
pub struct ExportHandle {
    id: HandleId,
    provider: Arc<dyn HandleProvider>,
}

impl ExportHandle {
    pub fn acquire(provider: &Arc<dyn HandleProvider>, bytes: &[u8], mime: &str) -> Self {
        let id = provider.acquire(bytes, mime);
        log::trace!("acquired export handle {} ({} bytes)", id.0, bytes.len());
        Self {
            id,
            provider: Arc::clone(provider),
        }
    }

    pub fn id(&self) -> HandleId {
        self.id
    }

    /// Release now rather than at end of scope.
    pub fn release(self) {
        drop(self);
    }
}

impl Drop for ExportHandle {
    fn drop(&mut self) {
        log::trace!("released export handle {}", self.id.0);
        self.provider.release(self.id);
    }
}

impl std::fmt::Debug for ExportHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExportHandle").field("id", &self.id).finish()
    }
}

/// Process-local provider that keeps exported bytes in memory.
///
/// Also counts acquisitions and releases, and refuses to release an id
/// twice, so leaks and double releases show up in the counters.
#[derive(Default)]
pub struct InMemoryHandles {
    next: AtomicU64,
    live: Mutex<HashMap<HandleId, Vec<u8>>>,
    acquired: AtomicUsize,
    released: AtomicUsize,
}

impl InMemoryHandles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of handles acquired and not yet released.
    pub fn live_count(&self) -> usize {
        self.live.lock().map(|live| live.len()).unwrap_or(0)
    }

    pub fn acquired_count(&self) -> usize {
        self.acquired.load(Ordering::SeqCst)
    }

    pub fn released_count(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }

    /// Bytes behind a live handle.
    pub fn bytes(&self, id: HandleId) -> Option<Vec<u8>> {
        self.live.lock().ok()?.get(&id).cloned()
    }
}

impl HandleProvider for InMemoryHandles {
    fn acquire(&self, bytes: &[u8], _mime: &str) -> HandleId {
        let id = HandleId(self.next.fetch_add(1, Ordering::SeqCst));
        if let Ok(mut live) = self.live.lock() {
            live.insert(id, bytes.to_vec());
        }
        self.acquired.fetch_add(1, Ordering::SeqCst);
        id
    }

    fn release(&self, id: HandleId) {
        let removed = self
            .live
            .lock()
            .map(|mut live| live.remove(&id).is_some())
            .unwrap_or(false);
        if removed {
            self.released.fetch_add(1, Ordering::SeqCst);
        } else {
            log::warn!("release of unknown export handle {}", id.0);
        }
    }
}
