use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Session token claims issued by the managed auth service.
///
/// `sub` is the stable authentication subject a profile is bound to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
    pub jti: Uuid,
}

impl Claims {
    pub fn new(sub: impl Into<String>, duration_secs: i64) -> Self {
        let now = Utc::now().timestamp();
        Self {
            sub: sub.into(),
            iat: now,
            exp: now + duration_secs,
            jti: Uuid::now_v7(),
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() > self.exp
    }
}

/// The authenticated identity attached to a request.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub sub: String,
    pub token_id: Uuid,
    pub token: String,
}

impl AuthUser {
    pub fn from_claims(claims: Claims, token: impl Into<String>) -> Self {
        Self {
            sub: claims.sub,
            token_id: claims.jti,
            token: token.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_claims_are_not_expired() {
        let claims = Claims::new("sub-1", 3600);
        assert!(!claims.is_expired());
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn negative_duration_is_expired() {
        let claims = Claims::new("sub-1", -10);
        assert!(claims.is_expired());
    }
}
