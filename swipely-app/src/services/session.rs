use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;

use crate::models::Profile;
use crate::services::deck::SwipeDeck;
use crate::services::media::StagedImage;

/// Per-user screen state kept between requests.
pub struct UserSession {
    pub deck: SwipeDeck<Profile>,
    pub feed_loaded: bool,
    pub staged_image: Option<StagedImage>,
}

impl UserSession {
    pub fn new(screen_width: f64) -> Self {
        Self {
            deck: SwipeDeck::new(screen_width),
            feed_loaded: false,
            staged_image: None,
        }
    }
}

/// Sessions keyed by authentication subject. Each entry is locked only
/// while reading or mutating local state, never across a store call.
pub struct Sessions {
    screen_width: f64,
    inner: DashMap<String, Arc<Mutex<UserSession>>>,
}

impl Sessions {
    pub fn new(screen_width: f64) -> Self {
        Self {
            screen_width,
            inner: DashMap::new(),
        }
    }

    pub fn get(&self, sub: &str) -> Arc<Mutex<UserSession>> {
        self.inner
            .entry(sub.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(UserSession::new(self.screen_width))))
            .clone()
    }

    pub fn remove(&self, sub: &str) -> bool {
        self.inner.remove(sub).is_some()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
