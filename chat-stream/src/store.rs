//! Ordered conversation store shared by the controller and the view.
//!
//! Entries are appended, then mutated in place by index. Each append hands
//! out an [`EntryHandle`] stamped with the store's clear generation; a write
//! through a handle from before the last [`ResultStore::clear`] is a no-op,
//! even when a newer entry now occupies the same index.

use tokio::sync::{RwLock, broadcast};
use tracing::{debug, trace};

use crate::entry::ResultEntry;

/// Capacity of the change-notification channel.
const EVENT_CAPACITY: usize = 256;

/// Stable address of one entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntryHandle {
    generation: u64,
    index: usize,
}

impl EntryHandle {
    /// Position assigned at submission time.
    pub fn index(&self) -> usize {
        self.index
    }
}

/// Change notifications; readers re-read the store on receipt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreEvent {
    Appended(usize),
    Updated(usize),
    Cleared,
}

#[derive(Default)]
struct Inner {
    generation: u64,
    entries: Vec<ResultEntry>,
}

/// The Result Entry Store.
///
/// Every mutation holds the write lock for the whole read-modify-write, so a
/// single entry never observes interleaved updates and readers never see a
/// half-applied one.
pub struct ResultStore {
    inner: RwLock<Inner>,
    events: broadcast::Sender<StoreEvent>,
}

impl Default for ResultStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultStore {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: RwLock::new(Inner::default()),
            events,
        }
    }

    /// Subscribes to change notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    /// Adds `entry` at the end and returns its handle.
    pub async fn append(&self, entry: ResultEntry) -> EntryHandle {
        let mut inner = self.inner.write().await;
        let index = inner.entries.len();
        inner.entries.push(entry);
        let handle = EntryHandle {
            generation: inner.generation,
            index,
        };
        drop(inner);

        trace!(index, "entry appended");
        self.notify(StoreEvent::Appended(index));
        handle
    }

    /// Applies `mutation` to the entry behind `handle`.
    ///
    /// Returns `false` (and does nothing) when the entry no longer exists,
    /// which is expected after a concurrent clear.
    pub async fn update_at<F>(&self, handle: EntryHandle, mutation: F) -> bool
    where
        F: FnOnce(&mut ResultEntry),
    {
        let mut inner = self.inner.write().await;
        if inner.generation != handle.generation {
            debug!(index = handle.index, "update skipped: store cleared since submission");
            return false;
        }
        let Some(entry) = inner.entries.get_mut(handle.index) else {
            debug!(index = handle.index, "update skipped: index out of range");
            return false;
        };
        mutation(entry);
        drop(inner);

        self.notify(StoreEvent::Updated(handle.index));
        true
    }

    /// Applies `mutation` to the first entry matching `pred`; returns its index.
    pub async fn update_where<P, F>(&self, pred: P, mutation: F) -> Option<usize>
    where
        P: Fn(&ResultEntry) -> bool,
        F: FnOnce(&mut ResultEntry),
    {
        let mut inner = self.inner.write().await;
        let index = inner.entries.iter().position(pred)?;
        mutation(&mut inner.entries[index]);
        drop(inner);

        self.notify(StoreEvent::Updated(index));
        Some(index)
    }

    /// Snapshot of the entry at `index`.
    pub async fn at(&self, index: usize) -> Option<ResultEntry> {
        self.inner.read().await.entries.get(index).cloned()
    }

    /// Snapshot of every entry, in order.
    pub async fn all(&self) -> Vec<ResultEntry> {
        self.inner.read().await.entries.clone()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Empties the store; open sessions keep running but can no longer write.
    pub async fn clear(&self) {
        let mut inner = self.inner.write().await;
        inner.entries.clear();
        inner.generation += 1;
        let generation = inner.generation;
        drop(inner);

        debug!(generation, "store cleared");
        self.notify(StoreEvent::Cleared);
    }

    fn notify(&self, event: StoreEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}
