use async_trait::async_trait;
use dashmap::DashMap;
use uuid::Uuid;

use swipely_shared::errors::{AppError, AppResult, ErrorCode};
use swipely_shared::middleware::validate_jwt;
use swipely_shared::types::auth::AuthUser;

/// The managed auth service as seen by the client.
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Resolve a session token to the signed-in identity.
    async fn current_identity(&self, token: &str) -> AppResult<AuthUser>;

    /// Terminate the session the user is signed in with.
    async fn sign_out(&self, user: &AuthUser) -> AppResult<()>;
}

/// Verifies HS256 session tokens issued by the auth service and remembers
/// sessions terminated from this client.
pub struct JwtAuthenticator {
    secret: String,
    revoked: DashMap<Uuid, String>,
}

impl JwtAuthenticator {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            revoked: DashMap::new(),
        }
    }

    pub fn is_revoked(&self, token_id: Uuid) -> bool {
        self.revoked.contains_key(&token_id)
    }
}

#[async_trait]
impl Authenticator for JwtAuthenticator {
    async fn current_identity(&self, token: &str) -> AppResult<AuthUser> {
        let claims = validate_jwt(token, &self.secret)?;
        if self.is_revoked(claims.jti) {
            return Err(AppError::new(ErrorCode::SessionRevoked, "session has been signed out"));
        }
        Ok(AuthUser::from_claims(claims, token))
    }

    async fn sign_out(&self, user: &AuthUser) -> AppResult<()> {
        self.revoked.insert(user.token_id, user.sub.clone());
        tracing::info!(sub = %user.sub, token_id = %user.token_id, "session terminated");
        Ok(())
    }
}
