use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::AbortHandle;

use crate::record::{Record, Versioned};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OpType {
    Insert,
    Update,
    Delete,
}

/// A change notification for one record kind.
#[derive(Debug, Clone, PartialEq)]
pub enum ChangeEvent<R> {
    Created(Versioned<R>),
    Updated(Versioned<R>),
    Deleted(Versioned<R>),
    /// The initial sync of this kind has completed. Delivered at most once
    /// per subscription.
    Synced,
}

impl<R: Record> ChangeEvent<R> {
    pub fn kind(&self) -> &'static str {
        R::KIND
    }

    pub fn op(&self) -> Option<OpType> {
        match self {
            ChangeEvent::Created(_) => Some(OpType::Insert),
            ChangeEvent::Updated(_) => Some(OpType::Update),
            ChangeEvent::Deleted(_) => Some(OpType::Delete),
            ChangeEvent::Synced => None,
        }
    }

    pub fn element(&self) -> Option<&Versioned<R>> {
        match self {
            ChangeEvent::Created(r) | ChangeEvent::Updated(r) | ChangeEvent::Deleted(r) => Some(r),
            ChangeEvent::Synced => None,
        }
    }
}

/// Live stream of [`ChangeEvent`]s.
///
/// Dropping the subscription (or calling [`Subscription::unsubscribe`])
/// releases it: the receiving side closes and any forwarding task is aborted.
pub struct Subscription<R> {
    rx: mpsc::UnboundedReceiver<ChangeEvent<R>>,
    task: Option<AbortHandle>,
}

impl<R> Subscription<R> {
    pub fn new(rx: mpsc::UnboundedReceiver<ChangeEvent<R>>) -> Self {
        Self { rx, task: None }
    }

    pub fn with_task(rx: mpsc::UnboundedReceiver<ChangeEvent<R>>, task: AbortHandle) -> Self {
        Self { rx, task: Some(task) }
    }

    /// Wait for the next change. `None` once the source has gone away.
    pub async fn next(&mut self) -> Option<ChangeEvent<R>> {
        self.rx.recv().await
    }

    pub fn try_next(&mut self) -> Option<ChangeEvent<R>> {
        self.rx.try_recv().ok()
    }

    pub fn unsubscribe(self) {}
}

impl<R> Drop for Subscription<R> {
    fn drop(&mut self) {
        self.rx.close();
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
