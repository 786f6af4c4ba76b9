use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::response::sse::{Event as SseEvent, KeepAlive, Sse};
use axum::Json;
use futures::Stream;

use swipely_shared::errors::{AppError, AppResult, ErrorCode};
use swipely_shared::types::auth::AuthUser;
use swipely_shared::types::ApiResponse;

use crate::events::match_feed;
use crate::services::feed_service::{self, MatchCard};
use crate::services::profile_service;
use crate::AppState;

// --- GET /matches ---

pub async fn list_matches(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<Vec<MatchCard>>>> {
    let me = profile_service::find_by_sub(state.store.profiles.as_ref(), &user.sub).await?;
    let Some(me) = me else {
        return Ok(Json(ApiResponse::ok(Vec::new())));
    };

    let cards = feed_service::match_cards(&state.store, me.id).await?;
    Ok(Json(ApiResponse::ok(cards)))
}

// --- GET /matches/live ---

/// SSE stream of matches that become mutual while the client is connected.
/// The store subscription lives as long as the stream and is released when
/// the client disconnects.
pub async fn live_matches(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Sse<impl Stream<Item = Result<SseEvent, Infallible>>>> {
    let me = profile_service::find_by_sub(state.store.profiles.as_ref(), &user.sub)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::ProfileNotFound, "create a profile first"))?
        .id;

    let mut subscription = state.store.matches.observe().await?;
    tracing::info!(profile_id = %me, "live match listener connected");

    let stream = async_stream::stream! {
        while let Some(event) = subscription.next().await {
            let Some(record) = match_feed::new_match_for(&event, me) else {
                continue;
            };

            let json = match serde_json::to_string(record) {
                Ok(j) => j,
                Err(e) => {
                    tracing::warn!(error = %e, "failed to serialize match");
                    continue;
                }
            };

            yield Ok(SseEvent::default()
                .event("match")
                .id(record.id.to_string())
                .data(json));
        }
        tracing::info!(profile_id = %me, "match change feed ended");
    };

    Ok(Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("heartbeat"),
    ))
}
