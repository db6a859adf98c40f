use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use tracing::debug;

use hvacdesk_auth::{AuthError, JwtValidator, RequestContext, StaticAuthenticator};

use crate::app::errors::json_error;

#[derive(Clone)]
pub struct AuthState {
    pub jwt: Arc<dyn JwtValidator>,
}

/// Resolve the bearer token into a [`RequestContext`] request extension.
///
/// Missing/invalid tokens and users without a tenant are rejected with 401.
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let ctx = match authenticate(&state, req.headers()) {
        Ok(ctx) => ctx,
        Err(e) => {
            debug!(error = %e, "request rejected");
            return json_error(StatusCode::UNAUTHORIZED, "unauthorized", e.to_string());
        }
    };

    req.extensions_mut().insert(ctx);
    next.run(req).await
}

fn authenticate(state: &AuthState, headers: &HeaderMap) -> Result<RequestContext, AuthError> {
    let token = extract_bearer(headers).ok_or(AuthError::NotAuthenticated)?;
    let user = state.jwt.validate(token, Utc::now())?;
    RequestContext::resolve(&StaticAuthenticator::signed_in(user))
}

fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    let header = headers.get(axum::http::header::AUTHORIZATION)?;
    let token = header.to_str().ok()?.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        return None;
    }
    Some(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use chrono::Duration;
    use hvacdesk_auth::{Hs256JwtValidator, JwtClaims, SessionUser};
    use hvacdesk_core::{TenantId, UserId};

    fn state() -> (AuthState, Arc<Hs256JwtValidator>) {
        let jwt = Arc::new(Hs256JwtValidator::new(b"test-secret".to_vec()));
        (AuthState { jwt: jwt.clone() }, jwt)
    }

    fn bearer(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
        );
        headers
    }

    #[test]
    fn valid_token_resolves_tenant_and_actor() {
        let (state, jwt) = state();
        let user = SessionUser::new(UserId::new(), TenantId::new());
        let now = Utc::now();
        let token = jwt
            .issue(&JwtClaims::new(user, now, now + Duration::minutes(5)))
            .unwrap();

        let ctx = authenticate(&state, &bearer(&token)).unwrap();
        assert_eq!(ctx.tenant_id(), user.tenant_id.unwrap());
        assert_eq!(ctx.actor_id(), user.user_id);
    }

    #[test]
    fn user_without_tenant_is_rejected() {
        let (state, jwt) = state();
        let user = SessionUser::without_tenant(UserId::new());
        let now = Utc::now();
        let token = jwt
            .issue(&JwtClaims::new(user, now, now + Duration::minutes(5)))
            .unwrap();

        assert_eq!(
            authenticate(&state, &bearer(&token)).unwrap_err(),
            AuthError::TenantUnresolved(user.user_id)
        );
    }

    #[test]
    fn missing_or_malformed_header_is_not_authenticated() {
        let (state, _) = state();
        assert_eq!(
            authenticate(&state, &HeaderMap::new()).unwrap_err(),
            AuthError::NotAuthenticated
        );
        assert!(matches!(
            authenticate(&state, &bearer("garbage")).unwrap_err(),
            AuthError::InvalidToken(_)
        ));
    }
}
