use axum::extract::{Multipart, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use swipely_datastore::Versioned;
use swipely_shared::errors::{AppError, AppResult, ErrorCode};
use swipely_shared::types::auth::AuthUser;
use swipely_shared::types::ApiResponse;

use crate::models::{Profile, ProfileDraft};
use crate::services::media::{PermissionStatus, StagedImage};
use crate::services::profile_service::{self, EditorState};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct StagedImageResponse {
    pub content_type: String,
    pub bytes: usize,
}

impl From<&StagedImage> for StagedImageResponse {
    fn from(img: &StagedImage) -> Self {
        Self {
            content_type: img.content_type.clone(),
            bytes: img.len(),
        }
    }
}

async fn stage(state: &AppState, sub: &str, image: StagedImage) -> StagedImageResponse {
    let response = StagedImageResponse::from(&image);
    state.sessions.get(sub).lock().await.staged_image = Some(image);
    tracing::info!(
        sub = %sub,
        content_type = %response.content_type,
        bytes = response.bytes,
        "profile image staged"
    );
    response
}

// --- GET /me ---

pub async fn get_profile(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<EditorState>>> {
    state.ensure_profiles_synced()?;

    let mut editor = profile_service::load_editor(state.store.profiles.as_ref(), &user.sub).await?;
    editor.has_staged_image = state.sessions.get(&user.sub).lock().await.staged_image.is_some();
    Ok(Json(ApiResponse::ok(editor)))
}

// --- PUT /me ---

pub async fn save_profile(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(draft): Json<ProfileDraft>,
) -> AppResult<Json<ApiResponse<Versioned<Profile>>>> {
    state.ensure_profiles_synced()?;

    let staged = state.sessions.get(&user.sub).lock().await.staged_image.clone();
    let saved = profile_service::save_profile(
        state.store.profiles.as_ref(),
        state.storage.as_ref(),
        &user.sub,
        draft,
        staged,
        &state.config.default_avatar_url,
    )
    .await?;

    {
        let session = state.sessions.get(&user.sub);
        let mut session = session.lock().await;
        session.staged_image = None;
        // Gender or preference may have changed, or the profile is new
        session.feed_loaded = false;
    }
    Ok(Json(ApiResponse::ok_with_message(saved, "profile saved")))
}

// --- POST /me/image ---

pub async fn upload_image(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> AppResult<Json<ApiResponse<StagedImageResponse>>> {
    let field = multipart
        .next_field()
        .await
        .map_err(|e| AppError::bad_request(format!("failed to read multipart: {e}")))?
        .ok_or_else(|| AppError::bad_request("no file provided"))?;

    let content_type = field
        .content_type()
        .unwrap_or("application/octet-stream")
        .to_string();

    let data = field
        .bytes()
        .await
        .map_err(|e| {
            AppError::new(ErrorCode::PayloadTooLarge, format!("failed to read file data: {e}"))
        })?;

    let image = StagedImage::new(&content_type, data.to_vec())?;
    let response = stage(&state, &user.sub, image).await;
    Ok(Json(ApiResponse::ok(response)))
}

// --- POST /me/image/library ---

#[derive(Debug, Deserialize)]
pub struct LibraryPickRequest {
    pub file_name: String,
}

pub async fn pick_from_library(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<LibraryPickRequest>,
) -> AppResult<Json<ApiResponse<StagedImageResponse>>> {
    if state.media.request_permission().await == PermissionStatus::Denied {
        tracing::warn!(sub = %user.sub, "media library permission denied");
        return Err(AppError::new(
            ErrorCode::MediaPermissionDenied,
            "media library permission denied",
        ));
    }

    let image = state.media.pick(&req.file_name).await?;
    let response = stage(&state, &user.sub, image).await;
    Ok(Json(ApiResponse::ok(response)))
}
