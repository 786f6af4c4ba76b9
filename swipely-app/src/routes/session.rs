use axum::extract::State;
use axum::Json;
use std::sync::Arc;

use swipely_shared::errors::AppResult;
use swipely_shared::types::auth::AuthUser;
use swipely_shared::types::ApiResponse;

use crate::services::profile_service;
use crate::AppState;

// --- POST /sign-out ---

pub async fn sign_out(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<()>>> {
    profile_service::sign_out(&state.store, state.auth.as_ref(), &user).await?;
    state.sessions.remove(&user.sub);
    Ok(Json(ApiResponse::ok_with_message((), "signed out")))
}
