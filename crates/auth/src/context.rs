//! Explicit per-request context.

use thiserror::Error;

use hvacdesk_core::{TenantId, UserId};

use crate::{Authenticator, SessionUser};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("not authenticated")]
    NotAuthenticated,

    #[error("tenant could not be resolved for user {0}")]
    TenantUnresolved(UserId),

    #[error("invalid token: {0}")]
    InvalidToken(String),
}

/// Tenant + actor for one catalog/ledger/quote operation.
///
/// Every service operation takes this explicitly. It can only be built from a
/// session user with a resolved tenant, so holding one proves authentication.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct RequestContext {
    tenant_id: TenantId,
    actor_id: UserId,
}

impl RequestContext {
    pub fn new(tenant_id: TenantId, actor_id: UserId) -> Self {
        Self { tenant_id, actor_id }
    }

    /// Resolve the context from the authentication collaborator.
    pub fn resolve(auth: &dyn Authenticator) -> Result<Self, AuthError> {
        Self::from_session(auth.current_user())
    }

    pub fn from_session(user: Option<SessionUser>) -> Result<Self, AuthError> {
        let user = user.ok_or(AuthError::NotAuthenticated)?;
        let tenant_id = user
            .tenant_id
            .ok_or(AuthError::TenantUnresolved(user.user_id))?;
        Ok(Self::new(tenant_id, user.user_id))
    }

    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    pub fn actor_id(&self) -> UserId {
        self.actor_id
    }
}
