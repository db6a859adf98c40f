use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use hvacdesk_core::{TenantId, UserId};

use crate::SessionUser;

/// JWT claims model (transport-agnostic).
///
/// Timestamps are seconds since the Unix epoch, as issued by the hosted
/// authentication service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Subject / user identifier.
    pub sub: UserId,

    /// Tenant (company) the user belongs to, when the profile is linked to one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<TenantId>,

    /// Issued-at timestamp.
    pub iat: i64,

    /// Expiration timestamp.
    pub exp: i64,
}

impl JwtClaims {
    pub fn new(user: SessionUser, issued_at: DateTime<Utc>, expires_at: DateTime<Utc>) -> Self {
        Self {
            sub: user.user_id,
            tenant_id: user.tenant_id,
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        }
    }

    pub fn session_user(&self) -> SessionUser {
        SessionUser {
            user_id: self.sub,
            tenant_id: self.tenant_id,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenValidationError {
    #[error("token has expired")]
    Expired,

    #[error("token not yet valid (iat is in the future)")]
    NotYetValid,

    #[error("invalid token time window (exp <= iat)")]
    InvalidTimeWindow,
}

/// Deterministically validate JWT claims.
///
/// Note: this validates the *claims* only. Signature verification lives in
/// [`crate::jwt`].
pub fn validate_claims(claims: &JwtClaims, now: DateTime<Utc>) -> Result<(), TokenValidationError> {
    let now = now.timestamp();
    if claims.exp <= claims.iat {
        return Err(TokenValidationError::InvalidTimeWindow);
    }
    if now < claims.iat {
        return Err(TokenValidationError::NotYetValid);
    }
    if now >= claims.exp {
        return Err(TokenValidationError::Expired);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn claims(issued_at: DateTime<Utc>, ttl: Duration) -> JwtClaims {
        JwtClaims::new(
            SessionUser::new(UserId::new(), TenantId::new()),
            issued_at,
            issued_at + ttl,
        )
    }

    #[test]
    fn accepts_claims_inside_window() {
        let now = Utc::now();
        assert!(validate_claims(&claims(now, Duration::minutes(5)), now).is_ok());
    }

    #[test]
    fn rejects_expired_and_future_tokens() {
        let now = Utc::now();
        let c = claims(now - Duration::minutes(10), Duration::minutes(5));
        assert_eq!(validate_claims(&c, now), Err(TokenValidationError::Expired));

        let c = claims(now + Duration::minutes(10), Duration::minutes(5));
        assert_eq!(validate_claims(&c, now), Err(TokenValidationError::NotYetValid));
    }

    #[test]
    fn rejects_inverted_window() {
        let now = Utc::now();
        let c = claims(now, Duration::minutes(-1));
        assert_eq!(validate_claims(&c, now), Err(TokenValidationError::InvalidTimeWindow));
    }
}
