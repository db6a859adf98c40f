//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// Every persisted record (stock items, ledger movements, quotes) is owned by
/// exactly one tenant, so the tenant is part of the identity contract.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;

    /// Returns the owning tenant.
    fn tenant_id(&self) -> crate::TenantId;
}
