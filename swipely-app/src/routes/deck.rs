use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use swipely_shared::errors::AppResult;
use swipely_shared::types::auth::AuthUser;
use swipely_shared::types::ApiResponse;

use crate::models::Profile;
use crate::services::deck::{DeckView, Direction, Swiped};
use crate::services::match_service::{self, SwipeOutcome};
use crate::services::{feed_service, profile_service};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct DeckResponse {
    /// Whether the gesture was applied. Gestures on an empty deck or during
    /// a release animation are dropped.
    pub accepted: bool,
    pub deck: DeckView<Profile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub swipe: Option<SwipeResult>,
}

#[derive(Debug, Serialize)]
pub struct SwipeResult {
    pub direction: Direction,
    pub profile_id: Option<Uuid>,
    pub result: SwipeOutcome,
}

#[derive(Debug, Deserialize)]
pub struct DragRequest {
    pub translation_x: f64,
}

#[derive(Debug, Deserialize)]
pub struct ReleaseRequest {
    pub velocity_x: f64,
}

fn respond(
    accepted: bool,
    deck: DeckView<Profile>,
    swipe: Option<SwipeResult>,
) -> Json<ApiResponse<DeckResponse>> {
    Json(ApiResponse::ok(DeckResponse { accepted, deck, swipe }))
}

/// Query candidates for `sub` and put them on the deck.
pub(crate) async fn load_feed(state: &AppState, sub: &str) -> AppResult<()> {
    let candidates = match profile_service::find_by_sub(state.store.profiles.as_ref(), sub).await? {
        Some(me) => feed_service::load_candidates(&state.store, &me).await?,
        None => {
            tracing::warn!(sub = %sub, "no profile yet, deck left empty");
            Vec::new()
        }
    };

    let session = state.sessions.get(sub);
    let mut session = session.lock().await;
    session.deck.load(candidates);
    session.feed_loaded = true;
    Ok(())
}

/// Run the reconciliation for a swipe signal on `candidate`.
pub(crate) async fn handle_swipe(
    state: &AppState,
    sub: &str,
    direction: Direction,
    candidate: Option<Profile>,
) -> AppResult<SwipeResult> {
    let me = profile_service::find_by_sub(state.store.profiles.as_ref(), sub)
        .await?
        .map(|v| v.id);
    let matches = state.store.matches.as_ref();
    let result = match_service::on_swipe(matches, direction, candidate.as_ref(), me).await?;

    Ok(SwipeResult {
        direction,
        profile_id: candidate.map(|c| c.id),
        result,
    })
}

// --- GET /deck ---

pub async fn get_deck(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<DeckResponse>>> {
    state.ensure_profiles_synced()?;

    let loaded = state.sessions.get(&user.sub).lock().await.feed_loaded;
    if !loaded {
        load_feed(&state, &user.sub).await?;
    }

    let view = state.sessions.get(&user.sub).lock().await.deck.view();
    Ok(respond(true, view, None))
}

// --- POST /deck/reload ---

pub async fn reload(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<DeckResponse>>> {
    state.ensure_profiles_synced()?;
    load_feed(&state, &user.sub).await?;

    let view = state.sessions.get(&user.sub).lock().await.deck.view();
    Ok(respond(true, view, None))
}

// --- POST /deck/drag/start ---

pub async fn begin_drag(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<DeckResponse>>> {
    state.ensure_profiles_synced()?;

    let session = state.sessions.get(&user.sub);
    let mut session = session.lock().await;
    let accepted = session.deck.begin_drag();
    Ok(respond(accepted, session.deck.view(), None))
}

// --- POST /deck/drag ---

pub async fn drag(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<DragRequest>,
) -> AppResult<Json<ApiResponse<DeckResponse>>> {
    state.ensure_profiles_synced()?;

    let session = state.sessions.get(&user.sub);
    let mut session = session.lock().await;
    let accepted = session.deck.drag(req.translation_x);
    Ok(respond(accepted, session.deck.view(), None))
}

// --- POST /deck/release ---

pub async fn release(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<ReleaseRequest>,
) -> AppResult<Json<ApiResponse<DeckResponse>>> {
    state.ensure_profiles_synced()?;

    let session = state.sessions.get(&user.sub);
    let mut session = session.lock().await;
    let phase = session.deck.release(req.velocity_x);
    if let Some(phase) = phase {
        tracing::debug!(sub = %user.sub, velocity = req.velocity_x, ?phase, "card released");
    }
    Ok(respond(phase.is_some(), session.deck.view(), None))
}

// --- POST /deck/settle ---

/// The release animation finished. A completed fling advances the deck and
/// fires the swipe signal exactly once.
pub async fn settle(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<DeckResponse>>> {
    state.ensure_profiles_synced()?;

    let (swiped, view) = {
        let session = state.sessions.get(&user.sub);
        let mut session = session.lock().await;
        let swiped = session.deck.settle();
        (swiped, session.deck.view())
    };

    let swipe = match swiped {
        Some(Swiped { direction, item }) => {
            Some(handle_swipe(&state, &user.sub, direction, Some(item)).await?)
        }
        None => None,
    };

    Ok(respond(true, view, swipe))
}

// --- POST /deck/skip ---

pub async fn skip(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<DeckResponse>>> {
    state.ensure_profiles_synced()?;

    let session = state.sessions.get(&user.sub);
    let mut session = session.lock().await;
    let accepted = session.deck.skip();
    Ok(respond(accepted, session.deck.view(), None))
}
