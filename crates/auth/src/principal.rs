use serde::{Deserialize, Serialize};

use hvacdesk_core::{TenantId, UserId};

/// The authenticated user as reported by the authentication collaborator.
///
/// A user may be authenticated without a resolvable tenant (e.g. a profile
/// that was never linked to a company); such users cannot touch tenant data.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionUser {
    pub user_id: UserId,
    pub tenant_id: Option<TenantId>,
}

impl SessionUser {
    pub fn new(user_id: UserId, tenant_id: TenantId) -> Self {
        Self {
            user_id,
            tenant_id: Some(tenant_id),
        }
    }

    /// A user whose tenant could not be resolved.
    pub fn without_tenant(user_id: UserId) -> Self {
        Self {
            user_id,
            tenant_id: None,
        }
    }
}
