use std::sync::atomic::Ordering;
use std::sync::Arc;

use swipely_datastore::ChangeEvent;

use crate::AppState;

/// Hold the home feed and editor until the Profile kind finishes its
/// initial sync, then keep following profile changes so the replica stays
/// current for the life of the process.
pub async fn follow_profiles(state: Arc<AppState>) -> anyhow::Result<()> {
    let mut subscription = state.store.profiles.observe().await?;
    tracing::info!("waiting for profile sync");

    while let Some(event) = subscription.next().await {
        match event {
            ChangeEvent::Synced => {
                state.profiles_synced.store(true, Ordering::SeqCst);
                tracing::info!("model synced");
            }
            other => {
                if let Some(changed) = other.element() {
                    tracing::debug!(profile_id = %changed.id, op = ?other.op(), "profile changed");
                }
            }
        }
    }

    if state.profiles_synced.load(Ordering::SeqCst) {
        tracing::warn!("profile change feed closed");
    } else {
        tracing::warn!("profile change feed closed before initial sync");
    }
    Ok(())
}
