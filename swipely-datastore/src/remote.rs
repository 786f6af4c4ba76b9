use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use futures_lite::StreamExt;
use reqwest::{Response, StatusCode};
use serde::Serialize;
use swipely_shared::clients::rabbitmq::RabbitMQClient;
use swipely_shared::types::event::{routing_keys, Event};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::change::{ChangeEvent, Subscription};
use crate::error::{StoreError, StoreResult};
use crate::query::Query;
use crate::record::{Record, Versioned};
use crate::RecordStore;

#[derive(Debug, Clone)]
pub struct RemoteConfig {
    pub base_url: String,
    pub api_key: String,
}

/// REST client for one record kind of the managed store, with an optional
/// AMQP change feed and a local replica of every record it has seen.
///
/// Reads always go to the backend and refresh the replica; the replica is
/// kept current between reads by the change feed while a subscription is
/// alive.
///
/// Cheap to clone.
#[derive(Clone)]
pub struct RemoteStore<R> {
    inner: Arc<Inner<R>>,
}

struct Inner<R> {
    http: reqwest::Client,
    config: RemoteConfig,
    feed: Option<RabbitMQClient>,
    replica: DashMap<Uuid, Versioned<R>>,
}

#[derive(Serialize)]
struct QueryBody<'a, F> {
    #[serde(rename = "where")]
    filter: &'a Query<F>,
}

impl<R: Record> RemoteStore<R> {
    pub fn new(http: reqwest::Client, config: RemoteConfig, feed: Option<RabbitMQClient>) -> Self {
        Self {
            inner: Arc::new(Inner {
                http,
                config,
                feed,
                replica: DashMap::new(),
            }),
        }
    }

    fn collection_url(&self) -> String {
        format!("{}/records/{}", self.inner.config.base_url.trim_end_matches('/'), R::KIND)
    }

    fn record_url(&self, id: Uuid) -> String {
        format!("{}/{id}", self.collection_url())
    }

    fn remember(&self, stored: &Versioned<R>) {
        self.inner.replica.insert(stored.record.id(), stored.clone());
    }

    pub fn cached(&self, id: Uuid) -> Option<Versioned<R>> {
        self.inner.replica.get(&id).map(|entry| entry.value().clone())
    }

    pub fn cached_len(&self) -> usize {
        self.inner.replica.len()
    }

    async fn decode<T: serde::de::DeserializeOwned>(resp: Response) -> StoreResult<T> {
        resp.json::<T>().await.map_err(|e| StoreError::Decode {
            kind: R::KIND,
            message: e.to_string(),
        })
    }

    fn unexpected(resp: &Response) -> StoreError {
        let path = resp.url().path();
        StoreError::Unavailable(format!("{} {path} returned {}", R::KIND, resp.status()))
    }

    /// Translate one change-feed delivery into a typed event.
    fn decode_change(routing_key: &str, payload: &[u8]) -> StoreResult<Option<ChangeEvent<R>>> {
        let Some(action) = routing_keys::action_of(routing_key) else {
            return Ok(None);
        };
        if action == routing_keys::ACTION_SYNCED {
            return Ok(Some(ChangeEvent::Synced));
        }

        let event: Event<Versioned<R>> =
            serde_json::from_slice(payload).map_err(|e| StoreError::Decode {
                kind: R::KIND,
                message: e.to_string(),
            })?;

        Ok(match action {
            routing_keys::ACTION_CREATED => Some(ChangeEvent::Created(event.data)),
            routing_keys::ACTION_UPDATED => Some(ChangeEvent::Updated(event.data)),
            routing_keys::ACTION_DELETED => Some(ChangeEvent::Deleted(event.data)),
            _ => None,
        })
    }

    fn apply(&self, event: &ChangeEvent<R>) {
        match event {
            ChangeEvent::Created(v) | ChangeEvent::Updated(v) => self.remember(v),
            ChangeEvent::Deleted(v) => {
                self.inner.replica.remove(&v.record.id());
            }
            ChangeEvent::Synced => {}
        }
    }
}

#[async_trait]
impl<R: Record> RecordStore<R> for RemoteStore<R> {
    async fn query(&self, query: &Query<R::Field>) -> StoreResult<Vec<Versioned<R>>> {
        let resp = self
            .inner
            .http
            .post(format!("{}/query", self.collection_url()))
            .bearer_auth(&self.inner.config.api_key)
            .json(&QueryBody { filter: query })
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(Self::unexpected(&resp));
        }

        let records: Vec<Versioned<R>> = Self::decode(resp).await?;
        for stored in &records {
            self.remember(stored);
        }
        tracing::debug!(kind = R::KIND, count = records.len(), "query completed");
        Ok(records)
    }

    async fn get(&self, id: Uuid) -> StoreResult<Option<Versioned<R>>> {
        let resp = self
            .inner
            .http
            .get(self.record_url(id))
            .bearer_auth(&self.inner.config.api_key)
            .send()
            .await?;

        match resp.status() {
            StatusCode::NOT_FOUND => {
                self.inner.replica.remove(&id);
                Ok(None)
            }
            s if s.is_success() => {
                let stored: Versioned<R> = Self::decode(resp).await?;
                self.remember(&stored);
                Ok(Some(stored))
            }
            _ => Err(Self::unexpected(&resp)),
        }
    }

    async fn insert(&self, record: R) -> StoreResult<Versioned<R>> {
        let id = record.id();
        let resp = self
            .inner
            .http
            .post(self.collection_url())
            .bearer_auth(&self.inner.config.api_key)
            .json(&record)
            .send()
            .await?;

        match resp.status() {
            StatusCode::CONFLICT => Err(StoreError::AlreadyExists { kind: R::KIND, id }),
            s if s.is_success() => {
                let stored: Versioned<R> = Self::decode(resp).await?;
                self.remember(&stored);
                Ok(stored)
            }
            _ => Err(Self::unexpected(&resp)),
        }
    }

    async fn update(&self, record: R, expected_version: u64) -> StoreResult<Versioned<R>> {
        let id = record.id();
        let resp = self
            .inner
            .http
            .put(self.record_url(id))
            .bearer_auth(&self.inner.config.api_key)
            .header(reqwest::header::IF_MATCH, expected_version.to_string())
            .json(&record)
            .send()
            .await?;

        match resp.status() {
            StatusCode::NOT_FOUND => Err(StoreError::NotFound { kind: R::KIND, id }),
            StatusCode::CONFLICT | StatusCode::PRECONDITION_FAILED => {
                self.inner.replica.remove(&id);
                Err(StoreError::VersionConflict {
                    kind: R::KIND,
                    id,
                    expected: expected_version,
                    actual: None,
                })
            }
            s if s.is_success() => {
                let stored: Versioned<R> = Self::decode(resp).await?;
                self.remember(&stored);
                Ok(stored)
            }
            _ => Err(Self::unexpected(&resp)),
        }
    }

    async fn delete(&self, id: Uuid) -> StoreResult<bool> {
        let resp = self
            .inner
            .http
            .delete(self.record_url(id))
            .bearer_auth(&self.inner.config.api_key)
            .send()
            .await?;

        self.inner.replica.remove(&id);
        match resp.status() {
            StatusCode::NOT_FOUND => Ok(false),
            s if s.is_success() => Ok(true),
            _ => Err(Self::unexpected(&resp)),
        }
    }

    async fn clear(&self) -> StoreResult<()> {
        let dropped = self.inner.replica.len();
        self.inner.replica.clear();
        tracing::debug!(kind = R::KIND, dropped, "replica cleared");
        Ok(())
    }

    /// Prime the replica with every record of this kind, announce
    /// [`ChangeEvent::Synced`], then forward the change feed if one is
    /// configured.
    async fn observe(&self) -> StoreResult<Subscription<R>> {
        let consumer = match &self.inner.feed {
            Some(feed) => {
                let pattern = routing_keys::kind_pattern(R::KIND);
                Some(feed.subscribe(&[pattern.as_str()]).await?)
            }
            None => None,
        };

        let (tx, rx) = mpsc::unbounded_channel();
        let store = self.clone();

        let task = tokio::spawn(async move {
            match store.query(&Query::All).await {
                Ok(records) => {
                    tracing::info!(kind = R::KIND, count = records.len(), "initial sync complete");
                    if tx.send(ChangeEvent::Synced).is_err() {
                        return;
                    }
                }
                Err(e) => {
                    tracing::error!(kind = R::KIND, error = %e, "initial sync failed");
                    return;
                }
            }

            let Some(mut consumer) = consumer else {
                return;
            };

            while let Some(delivery) = consumer.next().await {
                let delivery = match delivery {
                    Ok(d) => d,
                    Err(e) => {
                        tracing::error!(kind = R::KIND, error = %e, "change feed consumer error");
                        break;
                    }
                };

                match Self::decode_change(delivery.routing_key.as_str(), &delivery.data) {
                    // The initial sync was already announced by the priming query
                    Ok(Some(ChangeEvent::Synced)) => {}
                    Ok(Some(event)) => {
                        store.apply(&event);
                        if tx.send(event).is_err() {
                            break;
                        }
                    }
                    Ok(None) => {
                        tracing::debug!(
                            routing_key = delivery.routing_key.as_str(),
                            "ignoring change notification"
                        );
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "failed to decode change notification");
                    }
                }
            }

            tracing::debug!(kind = R::KIND, "change feed forwarding stopped");
        });

        Ok(Subscription::with_task(rx, task.abort_handle()))
    }

    async fn ping(&self) -> StoreResult<()> {
        let url = format!("{}/health", self.inner.config.base_url.trim_end_matches('/'));
        let resp = self.inner.http.get(url).send().await?;
        if resp.status().is_success() {
            Ok(())
        } else {
            Err(Self::unexpected(&resp))
        }
    }
}
