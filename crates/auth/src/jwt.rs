//! HS256 bearer token verification.

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};

use crate::{AuthError, JwtClaims, SessionUser, validate_claims};

/// Verifies a bearer token and yields the session user it was issued for.
pub trait JwtValidator: Send + Sync {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<SessionUser, AuthError>;
}

/// Shared-secret (HS256) validator.
pub struct Hs256JwtValidator {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl Hs256JwtValidator {
    pub fn new(secret: Vec<u8>) -> Self {
        Self {
            encoding: EncodingKey::from_secret(&secret),
            decoding: DecodingKey::from_secret(&secret),
        }
    }

    /// Sign claims with the same secret (dev tooling and tests).
    pub fn issue(&self, claims: &JwtClaims) -> Result<String, AuthError> {
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))
    }
}

impl JwtValidator for Hs256JwtValidator {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<SessionUser, AuthError> {
        // Time checks use the injected clock in `validate_claims`.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;

        let data = jsonwebtoken::decode::<JwtClaims>(token, &self.decoding, &validation)
            .map_err(|e| {
                tracing::debug!(error = %e, "bearer token rejected");
                AuthError::InvalidToken(e.to_string())
            })?;

        validate_claims(&data.claims, now).map_err(|e| {
            tracing::debug!(error = %e, user_id = %data.claims.sub, "token claims rejected");
            AuthError::InvalidToken(e.to_string())
        })?;

        Ok(data.claims.session_user())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use hvacdesk_core::{TenantId, UserId};

    #[test]
    fn issued_token_validates_to_same_user() {
        let validator = Hs256JwtValidator::new(b"secret".to_vec());
        let user = SessionUser::new(UserId::new(), TenantId::new());
        let now = Utc::now();
        let token = validator
            .issue(&JwtClaims::new(user, now, now + Duration::minutes(5)))
            .unwrap();

        assert_eq!(validator.validate(&token, now).unwrap(), user);
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let issuer = Hs256JwtValidator::new(b"one".to_vec());
        let verifier = Hs256JwtValidator::new(b"two".to_vec());
        let now = Utc::now();
        let token = issuer
            .issue(&JwtClaims::new(
                SessionUser::without_tenant(UserId::new()),
                now,
                now + Duration::minutes(5),
            ))
            .unwrap();

        assert!(matches!(
            verifier.validate(&token, now),
            Err(AuthError::InvalidToken(_))
        ));
    }
}
