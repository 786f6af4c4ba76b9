use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::change::{ChangeEvent, Subscription};
use crate::error::{StoreError, StoreResult};
use crate::query::Query;
use crate::record::{Record, Versioned};
use crate::RecordStore;

/// In-process store of one record kind.
///
/// Serves as the store of record when no remote backend is configured and as
/// the collaborator double in tests. Query results keep insertion order.
/// Nothing here is a cache of another store, so [`RecordStore::clear`] keeps
/// every record.
pub struct MemoryStore<R> {
    inner: Mutex<Inner<R>>,
    writes: AtomicUsize,
    clears: AtomicUsize,
}

struct Inner<R> {
    records: Vec<Versioned<R>>,
    subscribers: Vec<mpsc::UnboundedSender<ChangeEvent<R>>>,
    synced: bool,
}

impl<R: Record> MemoryStore<R> {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                records: Vec::new(),
                subscribers: Vec::new(),
                synced: false,
            }),
            writes: AtomicUsize::new(0),
            clears: AtomicUsize::new(0),
        }
    }

    /// A replica preloaded with `records` at version 1 and already synced.
    /// Seeding does not count as a write.
    pub fn with_records(records: impl IntoIterator<Item = R>) -> Self {
        let store = Self::new();
        {
            let mut inner = store.lock();
            inner.records = records.into_iter().map(|r| Versioned::new(r, 1)).collect();
            inner.synced = true;
        }
        store
    }

    /// Signal that the initial sync of this kind has completed.
    pub fn mark_synced(&self) {
        let mut inner = self.lock();
        if inner.synced {
            return;
        }
        inner.synced = true;
        inner.emit(ChangeEvent::Synced);
        tracing::debug!(kind = R::KIND, "replica synced");
    }

    pub fn is_synced(&self) -> bool {
        self.lock().synced
    }

    /// Number of insert/update/delete calls that changed the replica.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Number of times the local state was asked to clear.
    pub fn clears(&self) -> usize {
        self.clears.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn snapshot(&self) -> Vec<Versioned<R>> {
        self.lock().records.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner<R>> {
        // A poisoned lock only means a test panicked mid-write; the data is
        // still usable.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl<R: Record> Default for MemoryStore<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Clone> Inner<R> {
    fn emit(&mut self, event: ChangeEvent<R>) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }
}

#[async_trait]
impl<R: Record> RecordStore<R> for MemoryStore<R> {
    async fn query(&self, query: &Query<R::Field>) -> StoreResult<Vec<Versioned<R>>> {
        let inner = self.lock();
        Ok(inner
            .records
            .iter()
            .filter(|v| query.matches(&v.record))
            .cloned()
            .collect())
    }

    async fn get(&self, id: Uuid) -> StoreResult<Option<Versioned<R>>> {
        let inner = self.lock();
        Ok(inner.records.iter().find(|v| v.record.id() == id).cloned())
    }

    async fn insert(&self, record: R) -> StoreResult<Versioned<R>> {
        let mut inner = self.lock();
        let id = record.id();
        if inner.records.iter().any(|v| v.record.id() == id) {
            return Err(StoreError::AlreadyExists { kind: R::KIND, id });
        }

        let stored = Versioned::new(record, 1);
        inner.records.push(stored.clone());
        inner.emit(ChangeEvent::Created(stored.clone()));
        self.writes.fetch_add(1, Ordering::SeqCst);

        tracing::debug!(kind = R::KIND, id = %id, "record inserted");
        Ok(stored)
    }

    async fn update(&self, record: R, expected_version: u64) -> StoreResult<Versioned<R>> {
        let mut inner = self.lock();
        let id = record.id();
        let slot = inner
            .records
            .iter_mut()
            .find(|v| v.record.id() == id)
            .ok_or(StoreError::NotFound { kind: R::KIND, id })?;

        if slot.version != expected_version {
            return Err(StoreError::VersionConflict {
                kind: R::KIND,
                id,
                expected: expected_version,
                actual: Some(slot.version),
            });
        }

        *slot = Versioned::new(record, expected_version + 1);
        let stored = slot.clone();
        inner.emit(ChangeEvent::Updated(stored.clone()));
        self.writes.fetch_add(1, Ordering::SeqCst);

        tracing::debug!(kind = R::KIND, id = %id, version = stored.version, "record updated");
        Ok(stored)
    }

    async fn delete(&self, id: Uuid) -> StoreResult<bool> {
        let mut inner = self.lock();
        let Some(pos) = inner.records.iter().position(|v| v.record.id() == id) else {
            return Ok(false);
        };

        let removed = inner.records.remove(pos);
        inner.emit(ChangeEvent::Deleted(removed));
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(true)
    }

    async fn clear(&self) -> StoreResult<()> {
        self.clears.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(kind = R::KIND, kept = self.len(), "no replica to clear, records kept");
        Ok(())
    }

    async fn observe(&self) -> StoreResult<Subscription<R>> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut inner = self.lock();
        if inner.synced {
            let _ = tx.send(ChangeEvent::Synced);
        }
        inner.subscribers.push(tx);
        Ok(Subscription::new(rx))
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}
