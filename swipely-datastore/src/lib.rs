//! Client-side view of the managed record store.
//!
//! Records are addressed by kind and id, read back as [`Versioned`] snapshots
//! and filtered with explicit [`Query`] values. Change notifications arrive
//! through a [`Subscription`] that is released when dropped.

pub mod change;
pub mod error;
pub mod memory;
pub mod query;
pub mod record;
pub mod remote;

use async_trait::async_trait;
use uuid::Uuid;

pub use change::{ChangeEvent, OpType, Subscription};
pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use query::{Op, Query, Value};
pub use record::{Record, Versioned};
pub use remote::{RemoteConfig, RemoteStore};

/// Typed access to one record kind.
#[async_trait]
pub trait RecordStore<R: Record>: Send + Sync {
    async fn query(&self, query: &Query<R::Field>) -> StoreResult<Vec<Versioned<R>>>;

    async fn get(&self, id: Uuid) -> StoreResult<Option<Versioned<R>>>;

    async fn insert(&self, record: R) -> StoreResult<Versioned<R>>;

    /// Replace a record, failing with [`StoreError::VersionConflict`] when the
    /// stored version is no longer `expected_version`.
    async fn update(&self, record: R, expected_version: u64) -> StoreResult<Versioned<R>>;

    async fn delete(&self, id: Uuid) -> StoreResult<bool>;

    /// Drop the locally cached replica. Records held by the store of record
    /// are never deleted.
    async fn clear(&self) -> StoreResult<()>;

    async fn observe(&self) -> StoreResult<Subscription<R>>;

    async fn ping(&self) -> StoreResult<()>;
}
