use axum::extract::State;
use axum::Json;
use std::sync::Arc;

use swipely_shared::errors::AppResult;
use swipely_shared::types::auth::AuthUser;
use swipely_shared::types::ApiResponse;

use crate::routes::deck::{handle_swipe, SwipeResult};
use crate::services::deck::Direction;
use crate::AppState;

async fn swipe_current(
    state: &AppState,
    user: &AuthUser,
    direction: Direction,
) -> AppResult<SwipeResult> {
    state.ensure_profiles_synced()?;

    let current = state.sessions.get(&user.sub).lock().await.deck.current().cloned();
    handle_swipe(state, &user.sub, direction, current).await
}

/// Like button: right swipe on the card on screen without advancing.
pub async fn swipe_right(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<SwipeResult>>> {
    let result = swipe_current(&state, &user, Direction::Right).await?;
    Ok(Json(ApiResponse::ok(result)))
}

pub async fn swipe_left(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<SwipeResult>>> {
    let result = swipe_current(&state, &user, Direction::Left).await?;
    Ok(Json(ApiResponse::ok(result)))
}
