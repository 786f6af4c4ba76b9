pub mod config;
pub mod events;
pub mod models;
pub mod routes;
pub mod services;
pub mod store;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use swipely_shared::errors::{AppError, AppResult, ErrorCode};
use swipely_shared::middleware::{metrics_middleware, TokenVerifier};
use swipely_shared::types::auth::AuthUser;

use config::AppConfig;
use services::auth_service::Authenticator;
use services::media::{MediaLibrary, MAX_IMAGE_BYTES};
use services::session::Sessions;
use services::storage::ObjectStorage;
use store::DataStore;

pub struct AppState {
    pub config: AppConfig,
    pub store: DataStore,
    pub auth: Arc<dyn Authenticator>,
    pub storage: Arc<dyn ObjectStorage>,
    pub media: Arc<dyn MediaLibrary>,
    pub sessions: Sessions,
    /// Set once the Profile kind has finished its initial sync.
    pub profiles_synced: AtomicBool,
    pub metrics_handle: PrometheusHandle,
}

impl AppState {
    pub fn ensure_profiles_synced(&self) -> AppResult<()> {
        if self.profiles_synced.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(AppError::new(ErrorCode::ServiceUnavailable, "profiles still syncing"))
        }
    }
}

#[async_trait::async_trait]
impl TokenVerifier for AppState {
    async fn verify_token(&self, token: &str) -> Result<AuthUser, AppError> {
        self.auth.current_identity(token).await
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/metrics", get(routes::health::metrics))
        // Home
        .route("/deck", get(routes::deck::get_deck))
        .route("/deck/reload", post(routes::deck::reload))
        .route("/deck/drag/start", post(routes::deck::begin_drag))
        .route("/deck/drag", post(routes::deck::drag))
        .route("/deck/release", post(routes::deck::release))
        .route("/deck/settle", post(routes::deck::settle))
        .route("/deck/skip", post(routes::deck::skip))
        .route("/swipes/right", post(routes::swipes::swipe_right))
        .route("/swipes/left", post(routes::swipes::swipe_left))
        // Matches
        .route("/matches", get(routes::matches::list_matches))
        .route("/matches/live", get(routes::matches::live_matches))
        // Profile
        .route("/me", get(routes::profile::get_profile).put(routes::profile::save_profile))
        .route(
            "/me/image",
            post(routes::profile::upload_image)
                .layer(DefaultBodyLimit::max(MAX_IMAGE_BYTES + 64 * 1024)),
        )
        .route("/me/image/library", post(routes::profile::pick_from_library))
        .route("/sign-out", post(routes::session::sign_out))
        .layer(axum::middleware::from_fn(metrics_middleware))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use services::auth_service::JwtAuthenticator;
    use services::media::DirectoryLibrary;
    use services::storage::MemoryStorage;
    use swipely_shared::middleware::issue_jwt;
    use swipely_shared::types::auth::Claims;

    pub const SECRET: &str = "test-secret";

    /// State over `store` with the sync gate still closed.
    pub fn state_with(store: DataStore) -> Arc<AppState> {
        let config = AppConfig {
            jwt_secret: SECRET.into(),
            ..AppConfig::default()
        };
        Arc::new(AppState {
            store,
            auth: Arc::new(JwtAuthenticator::new(SECRET)),
            storage: Arc::new(MemoryStorage::new(config.s3_public_url.clone())),
            media: Arc::new(DirectoryLibrary::new(std::env::temp_dir().join("swipely-no-library"))),
            sessions: Sessions::new(config.screen_width),
            profiles_synced: AtomicBool::new(false),
            metrics_handle: PrometheusBuilder::new().build_recorder().handle(),
            config,
        })
    }

    /// State over `store` with profiles already synced.
    pub fn synced_state(store: DataStore) -> Arc<AppState> {
        let state = state_with(store);
        state.profiles_synced.store(true, Ordering::SeqCst);
        state
    }

    pub fn token(sub: &str) -> String {
        issue_jwt(&Claims::new(sub, 3600), SECRET).unwrap()
    }
}
