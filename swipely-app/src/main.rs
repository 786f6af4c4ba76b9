use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use swipely_app::config::{AppConfig, StoreBackend};
use swipely_app::models::{MatchRecord, Profile};
use swipely_app::services::auth_service::JwtAuthenticator;
use swipely_app::services::media::DirectoryLibrary;
use swipely_app::services::session::Sessions;
use swipely_app::services::storage::{MemoryStorage, ObjectStorage, S3Storage};
use swipely_app::store::DataStore;
use swipely_app::{events, router, AppState};
use swipely_datastore::{RemoteConfig, RemoteStore};
use swipely_shared::clients::rabbitmq::RabbitMQClient;
use swipely_shared::clients::s3::S3Client;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    swipely_shared::middleware::init_tracing("swipely-app");

    let config = AppConfig::load()?;
    let port = config.port;

    let metrics_handle = swipely_shared::middleware::init_metrics()?;

    let (store, storage): (DataStore, Arc<dyn ObjectStorage>) = match config.store_backend {
        StoreBackend::Memory => {
            tracing::info!("using in-process record store");
            let storage: Arc<dyn ObjectStorage> =
                Arc::new(MemoryStorage::new(config.s3_public_url.clone()));
            (DataStore::memory(), storage)
        }
        StoreBackend::Remote => {
            let http = reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()?;
            let remote = RemoteConfig {
                base_url: config.datastore_url.clone(),
                api_key: config.datastore_api_key.clone(),
            };
            let feed = RabbitMQClient::connect(&config.rabbitmq_url).await?;
            tracing::info!(url = %config.datastore_url, "using managed record store");

            let profiles =
                RemoteStore::<Profile>::new(http.clone(), remote.clone(), Some(feed.clone()));
            let matches = RemoteStore::<MatchRecord>::new(http, remote, Some(feed));
            let store = DataStore::new(Arc::new(profiles), Arc::new(matches));

            let s3 = S3Client::new(
                &config.s3_endpoint,
                &config.s3_access_key,
                &config.s3_secret_key,
                &config.s3_bucket,
                &config.s3_public_url,
            )
            .await;
            let storage: Arc<dyn ObjectStorage> = Arc::new(S3Storage::new(s3));
            (store, storage)
        }
    };

    let state = Arc::new(AppState {
        auth: Arc::new(JwtAuthenticator::new(config.jwt_secret.clone())),
        media: Arc::new(DirectoryLibrary::new(config.media_dir.clone())),
        sessions: Sessions::new(config.screen_width),
        profiles_synced: AtomicBool::new(false),
        store,
        storage,
        metrics_handle,
        config,
    });

    // Home and profile screens stay in loading state until profiles sync
    let gate_state = state.clone();
    tokio::spawn(async move {
        if let Err(e) = events::sync_gate::follow_profiles(gate_state).await {
            tracing::error!(error = %e, "profile follower failed");
        }
    });

    let app = router(state);

    let addr = format!("0.0.0.0:{port}");
    tracing::info!(addr = %addr, "swipely-app starting");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
