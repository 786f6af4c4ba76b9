use std::fmt::Debug;
use std::ops::Deref;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::query::Value;

/// A record kind persisted by the managed store.
pub trait Record: Serialize + DeserializeOwned + Clone + Debug + Send + Sync + 'static {
    /// Queryable fields of this kind.
    type Field: Copy + Debug + PartialEq + Serialize + Send + Sync + 'static;

    /// Kind name used in URLs and change-feed routing keys.
    const KIND: &'static str;

    fn id(&self) -> Uuid;

    /// Current value of `field`, used to evaluate queries locally.
    fn field(&self, field: Self::Field) -> Value;
}

/// A record snapshot together with the store version it was read at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Versioned<R> {
    pub record: R,
    pub version: u64,
}

impl<R> Versioned<R> {
    pub fn new(record: R, version: u64) -> Self {
        Self { record, version }
    }

    pub fn into_inner(self) -> R {
        self.record
    }
}

impl<R> Deref for Versioned<R> {
    type Target = R;

    fn deref(&self) -> &R {
        &self.record
    }
}
