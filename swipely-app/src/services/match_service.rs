use metrics::counter;
use serde::Serialize;
use uuid::Uuid;

use swipely_datastore::{Query, RecordStore, StoreError};
use swipely_shared::errors::{AppError, AppResult, ErrorCode};

use crate::models::{MatchField, MatchRecord, Profile};
use crate::services::deck::Direction;

/// Result of handling one swipe signal.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", content = "record", rename_all = "snake_case")]
pub enum SwipeOutcome {
    /// A record from me to the candidate already exists; nothing written.
    AlreadySwiped,
    /// The candidate had swiped right on me; their record is now confirmed.
    Matched(MatchRecord),
    /// First right swipe between the two; a pending record was created.
    Pending(MatchRecord),
    /// Left swipe. Not persisted.
    Passed,
    /// No candidate on screen or no profile of my own.
    Ignored,
}

impl SwipeOutcome {
    fn label(&self) -> &'static str {
        match self {
            SwipeOutcome::AlreadySwiped => "already_swiped",
            SwipeOutcome::Matched(_) => "matched",
            SwipeOutcome::Pending(_) => "pending",
            SwipeOutcome::Passed => "passed",
            SwipeOutcome::Ignored => "ignored",
        }
    }
}

fn directed(from: Uuid, to: Uuid) -> Query<MatchField> {
    Query::eq(MatchField::User1Id, from).and(Query::eq(MatchField::User2Id, to))
}

/// Handle a swipe on `candidate` by the profile `me`.
pub async fn on_swipe(
    store: &dyn RecordStore<MatchRecord>,
    direction: Direction,
    candidate: Option<&Profile>,
    me: Option<Uuid>,
) -> AppResult<SwipeOutcome> {
    counter!("swipes_total", "direction" => direction.as_str()).increment(1);

    let (Some(candidate), Some(me)) = (candidate, me) else {
        tracing::debug!(direction = direction.as_str(), "swipe ignored, nothing to reconcile");
        return Ok(SwipeOutcome::Ignored);
    };

    let outcome = match direction {
        Direction::Left => {
            tracing::info!(me = %me, candidate = %candidate.id, "swiped left");
            SwipeOutcome::Passed
        }
        Direction::Right => reconcile(store, me, candidate.id).await?,
    };

    counter!("matches_total", "outcome" => outcome.label()).increment(1);
    Ok(outcome)
}

/// Mutual-swipe detection for a right swipe from `me` on `candidate`.
///
/// The lookups and the write are separate store calls. The confirm step is
/// written against the version it was read at, so a concurrent change to
/// that record surfaces as [`ErrorCode::MatchConflict`].
pub async fn reconcile(
    store: &dyn RecordStore<MatchRecord>,
    me: Uuid,
    candidate: Uuid,
) -> AppResult<SwipeOutcome> {
    if !store.query(&directed(me, candidate)).await?.is_empty() {
        tracing::info!(me = %me, candidate = %candidate, "already swiped");
        return Ok(SwipeOutcome::AlreadySwiped);
    }

    if let Some(theirs) = store.query(&directed(candidate, me)).await?.into_iter().next() {
        let version = theirs.version;
        let mut record = theirs.into_inner();
        record.is_match = true;

        let confirmed = store.update(record, version).await.map_err(|e| match e {
            StoreError::VersionConflict { .. } => {
                tracing::warn!(me = %me, candidate = %candidate, "match changed while confirming");
                AppError::new(ErrorCode::MatchConflict, e.to_string())
            }
            other => other.into(),
        })?;

        tracing::info!(match_id = %confirmed.id, me = %me, candidate = %candidate, "it's a match");
        return Ok(SwipeOutcome::Matched(confirmed.into_inner()));
    }

    let created = store.insert(MatchRecord::pending(me, candidate)).await?;
    tracing::info!(match_id = %created.id, me = %me, candidate = %candidate, "match pending");
    Ok(SwipeOutcome::Pending(created.into_inner()))
}
