use swipely_shared::errors::{AppError, ErrorCode};
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: Uuid },

    #[error("{kind} {id} already exists")]
    AlreadyExists { kind: &'static str, id: Uuid },

    #[error("{kind} {id} changed since it was read (expected version {expected})")]
    VersionConflict {
        kind: &'static str,
        id: Uuid,
        expected: u64,
        actual: Option<u64>,
    },

    #[error("record store unavailable: {0}")]
    Unavailable(String),

    #[error("failed to decode {kind}: {message}")]
    Decode { kind: &'static str, message: String },

    #[error("change feed error: {0}")]
    Subscription(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl From<reqwest::Error> for StoreError {
    fn from(e: reqwest::Error) -> Self {
        StoreError::Unavailable(e.to_string())
    }
}

impl From<lapin::Error> for StoreError {
    fn from(e: lapin::Error) -> Self {
        StoreError::Subscription(e.to_string())
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match &e {
            StoreError::NotFound { .. } => AppError::new(ErrorCode::RecordNotFound, e.to_string()),
            StoreError::AlreadyExists { .. } | StoreError::VersionConflict { .. } => {
                AppError::new(ErrorCode::VersionConflict, e.to_string())
            }
            StoreError::Unavailable(_) | StoreError::Subscription(_) => {
                AppError::new(ErrorCode::StoreUnavailable, e.to_string())
            }
            StoreError::Decode { .. } => AppError::internal(e.to_string()),
        }
    }
}
