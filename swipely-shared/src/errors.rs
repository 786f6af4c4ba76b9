use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::types::ApiErrorResponse;

/// Application error codes following the pattern E{area}{sequence}
///
/// Ranges:
/// - E0xxx: Shared/infrastructure errors
/// - E1xxx: Auth/session errors
/// - E2xxx: Profile errors
/// - E3xxx: Swipe/match errors
/// - E4xxx: Datastore errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    // Shared (E0xxx)
    InternalError,
    NotFound,
    Unauthorized,
    BadRequest,
    ServiceUnavailable,
    PayloadTooLarge,

    // Auth (E1xxx)
    TokenExpired,
    TokenInvalid,
    SessionRevoked,

    // Profile (E2xxx)
    ProfileNotFound,
    InvalidGender,
    InvalidProfile,
    PhotoUploadFailed,
    MediaPermissionDenied,
    UnsupportedImage,

    // Match (E3xxx)
    MatchConflict,

    // Datastore (E4xxx)
    StoreUnavailable,
    VersionConflict,
    RecordNotFound,
}

impl ErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            // Shared
            Self::InternalError => "E0001",
            Self::NotFound => "E0003",
            Self::Unauthorized => "E0004",
            Self::BadRequest => "E0006",
            Self::ServiceUnavailable => "E0007",
            Self::PayloadTooLarge => "E0008",

            // Auth
            Self::TokenExpired => "E1001",
            Self::TokenInvalid => "E1002",
            Self::SessionRevoked => "E1003",

            // Profile
            Self::ProfileNotFound => "E2001",
            Self::InvalidGender => "E2002",
            Self::InvalidProfile => "E2003",
            Self::PhotoUploadFailed => "E2004",
            Self::MediaPermissionDenied => "E2005",
            Self::UnsupportedImage => "E2006",

            // Match
            Self::MatchConflict => "E3002",

            // Datastore
            Self::StoreUnavailable => "E4001",
            Self::VersionConflict => "E4002",
            Self::RecordNotFound => "E4003",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ServiceUnavailable | Self::StoreUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::BadRequest
            | Self::InvalidGender
            | Self::InvalidProfile
            | Self::UnsupportedImage => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::NotFound | Self::ProfileNotFound | Self::RecordNotFound => StatusCode::NOT_FOUND,
            Self::Unauthorized | Self::TokenExpired | Self::TokenInvalid
            | Self::SessionRevoked => StatusCode::UNAUTHORIZED,
            Self::MediaPermissionDenied => StatusCode::FORBIDDEN,
            Self::MatchConflict | Self::VersionConflict => StatusCode::CONFLICT,
            Self::PhotoUploadFailed => StatusCode::BAD_GATEWAY,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{message}")]
    Known {
        code: ErrorCode,
        message: String,
        details: Option<serde_json::Value>,
    },

    #[error("internal server error")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Known {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(
        code: ErrorCode,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self::Known {
            code,
            message: message.into(),
            details: Some(details),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::BadRequest, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    /// The error code carried by this error, if it is a known one.
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Known { code, .. } => *code,
            AppError::Internal(_) => ErrorCode::InternalError,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_response) = match &self {
            AppError::Known { code, message, details } => {
                let status = code.status_code();
                if status.is_server_error() {
                    tracing::error!(code = code.code(), "{message}");
                } else {
                    tracing::warn!(code = code.code(), "{message}");
                }
                (status, ApiErrorResponse::new(code.code(), message, details.clone()))
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "internal server error");
                let code = ErrorCode::InternalError.code();
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiErrorResponse::new(code, "internal server error", None),
                )
            }
        };

        (status, Json(error_response)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(err: AppError) -> serde_json::Value {
        let response = err.into_response();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn known_error_envelope() {
        let value = body_json(AppError::new(ErrorCode::ProfileNotFound, "profile not found")).await;

        assert_eq!(value["success"], false);
        assert_eq!(value["error"]["code"], "E2001");
        assert_eq!(value["error"]["message"], "profile not found");
        assert!(value["error"].get("details").is_none());
    }

    #[tokio::test]
    async fn details_are_rendered() {
        let err = AppError::with_details(
            ErrorCode::InvalidProfile,
            "profile is incomplete",
            serde_json::json!({ "fields": ["bio"] }),
        );
        let value = body_json(err).await;

        assert_eq!(value["error"]["code"], "E2003");
        assert_eq!(value["error"]["details"]["fields"][0], "bio");
    }

    #[test]
    fn status_codes() {
        assert_eq!(ErrorCode::ServiceUnavailable.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(ErrorCode::MatchConflict.status_code(), StatusCode::CONFLICT);
        assert_eq!(ErrorCode::SessionRevoked.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ErrorCode::InvalidProfile.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn internal_maps_to_generic_code() {
        let err = AppError::from(anyhow::anyhow!("boom"));
        assert_eq!(err.code(), ErrorCode::InternalError);
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
