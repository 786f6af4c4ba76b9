use std::sync::Arc;

use swipely_datastore::{MemoryStore, RecordStore, StoreResult};

use crate::models::{MatchRecord, Profile};

/// Handle to the record kinds the client works with. Built once at startup
/// and passed down through [`crate::AppState`].
#[derive(Clone)]
pub struct DataStore {
    pub profiles: Arc<dyn RecordStore<Profile>>,
    pub matches: Arc<dyn RecordStore<MatchRecord>>,
}

impl DataStore {
    pub fn new(
        profiles: Arc<dyn RecordStore<Profile>>,
        matches: Arc<dyn RecordStore<MatchRecord>>,
    ) -> Self {
        Self { profiles, matches }
    }

    /// In-process stores with nothing to sync.
    pub fn memory() -> Self {
        let profiles = MemoryStore::<Profile>::new();
        profiles.mark_synced();
        let matches = MemoryStore::<MatchRecord>::new();
        matches.mark_synced();
        Self::new(Arc::new(profiles), Arc::new(matches))
    }

    /// Drop every locally cached record. With the in-process backend there is
    /// no cache and all records stay.
    pub async fn clear(&self) -> StoreResult<()> {
        self.profiles.clear().await?;
        self.matches.clear().await?;
        Ok(())
    }

    pub async fn ping(&self) -> StoreResult<()> {
        self.profiles.ping().await
    }
}
