use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use swipely_shared::{HealthCheck, HealthResponse, HealthStatus};

use crate::AppState;

/// Health check probing the record store, object storage and the initial
/// profile sync.
pub async fn health_check(State(state): State<Arc<AppState>>) -> Response {
    let datastore = match state.store.ping().await {
        Ok(()) => HealthCheck::healthy("datastore"),
        Err(e) => HealthCheck::failing("datastore", HealthStatus::Unhealthy, e.to_string()),
    };

    let storage = if state.storage.is_reachable().await {
        HealthCheck::healthy("storage")
    } else {
        HealthCheck::failing("storage", HealthStatus::Degraded, "bucket unreachable")
    };

    let synced = if state.profiles_synced.load(Ordering::SeqCst) {
        HealthCheck::healthy("profiles_synced")
    } else {
        HealthCheck::failing("profiles_synced", HealthStatus::Degraded, "initial sync in progress")
    };

    let response = HealthResponse::new(
        "swipely-app",
        env!("CARGO_PKG_VERSION"),
        vec![datastore, storage, synced],
    );

    let status = match response.status {
        HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status, Json(response)).into_response()
}

/// Returns Prometheus metrics.
pub async fn metrics(State(state): State<Arc<AppState>>) -> String {
    state.metrics_handle.render()
}
