use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Envelope wrapping every change notification published by the managed
/// backend on its AMQP change feed.
///
/// Routing key format: `swipely.datastore.{kind}.{action}`
/// Example: `swipely.datastore.match.updated`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event<T> {
    pub id: Uuid,
    pub source: String,
    pub event_type: String,
    pub timestamp: DateTime<Utc>,
    pub correlation_id: Option<Uuid>,
    pub data: T,
}

impl<T> Event<T> {
    pub fn new(source: impl Into<String>, event_type: impl Into<String>, data: T) -> Self {
        Self {
            id: Uuid::now_v7(),
            source: source.into(),
            event_type: event_type.into(),
            timestamp: Utc::now(),
            correlation_id: None,
            data,
        }
    }
}

/// Change-feed routing keys
pub mod routing_keys {
    pub const DATASTORE_EXCHANGE: &str = "swipely.datastore";

    pub const ACTION_CREATED: &str = "created";
    pub const ACTION_UPDATED: &str = "updated";
    pub const ACTION_DELETED: &str = "deleted";
    pub const ACTION_SYNCED: &str = "synced";

    /// `swipely.datastore.{kind}.{action}`
    pub fn change_key(kind: &str, action: &str) -> String {
        format!("{DATASTORE_EXCHANGE}.{kind}.{action}")
    }

    /// Binding pattern matching every action for one record kind.
    pub fn kind_pattern(kind: &str) -> String {
        format!("{DATASTORE_EXCHANGE}.{kind}.*")
    }

    /// Extract the action segment from a routing key.
    pub fn action_of(routing_key: &str) -> Option<&str> {
        routing_key
            .strip_prefix(DATASTORE_EXCHANGE)?
            .strip_prefix('.')?
            .rsplit('.')
            .next()
    }
}

#[cfg(test)]
mod tests {
    use super::routing_keys::*;
    use super::*;

    #[test]
    fn change_keys() {
        assert_eq!(change_key("match", ACTION_UPDATED), "swipely.datastore.match.updated");
        assert_eq!(kind_pattern("profile"), "swipely.datastore.profile.*");
        assert_eq!(action_of("swipely.datastore.profile.synced"), Some("synced"));
        assert_eq!(action_of("other.exchange.profile.synced"), None);
    }

    #[test]
    fn envelope_json() {
        let evt = Event::new("datastore", "match.updated", serde_json::json!({ "is_match": true }));
        let json = serde_json::to_value(&evt).unwrap();
        assert_eq!(json["event_type"], "match.updated");
        assert_eq!(json["data"]["is_match"], true);
        assert!(json["correlation_id"].is_null());
    }
}
