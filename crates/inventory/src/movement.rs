use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use hvacdesk_core::{DomainError, DomainResult, Entity, EntityId, TenantId, UserId};

use crate::StockItemId;

/// Ledger entry identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MovementId(pub EntityId);

impl MovementId {
    pub fn new(id: EntityId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for MovementId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Direction of a stock movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovementKind {
    Entry,
    Exit,
}

impl MovementKind {
    /// Signed effect on the on-hand quantity.
    pub fn delta(self, quantity: Decimal) -> Decimal {
        match self {
            MovementKind::Entry => quantity,
            MovementKind::Exit => -quantity,
        }
    }

    /// Balance after applying `quantity` in this direction to `current`.
    ///
    /// Fails instead of overflowing when the result leaves the decimal range.
    pub fn apply(self, current: Decimal, quantity: Decimal) -> DomainResult<Decimal> {
        current
            .checked_add(self.delta(quantity))
            .ok_or_else(quantity_out_of_range)
    }

    pub fn default_reason(self) -> &'static str {
        match self {
            MovementKind::Entry => "Manual Entry",
            MovementKind::Exit => "Manual Exit",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MovementKind::Entry => "entry",
            MovementKind::Exit => "exit",
        }
    }
}

pub fn quantity_out_of_range() -> DomainError {
    DomainError::validation("quantity out of range")
}

/// Request to record a movement against one item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementRequest {
    pub item_id: StockItemId,
    pub kind: MovementKind,
    pub quantity: Decimal,
    #[serde(default)]
    pub reason: Option<String>,
}

impl MovementRequest {
    pub fn entry(item_id: StockItemId, quantity: Decimal) -> Self {
        Self {
            item_id,
            kind: MovementKind::Entry,
            quantity,
            reason: None,
        }
    }

    pub fn exit(item_id: StockItemId, quantity: Decimal) -> Self {
        Self {
            item_id,
            kind: MovementKind::Exit,
            quantity,
            reason: None,
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Quantities must be strictly positive; the direction carries the sign.
    pub fn validate(&self) -> DomainResult<()> {
        if self.quantity <= Decimal::ZERO {
            return Err(DomainError::validation(format!(
                "movement quantity must be positive (got {})",
                self.quantity
            )));
        }
        Ok(())
    }

    /// Validate and stamp the actor, producing the row to append to the ledger.
    pub fn into_attributes(self, actor_id: UserId) -> DomainResult<MovementAttributes> {
        self.validate()?;
        let reason = match self.reason {
            Some(r) if !r.trim().is_empty() => r.trim().to_string(),
            _ => self.kind.default_reason().to_string(),
        };
        Ok(MovementAttributes {
            item_id: self.item_id,
            kind: self.kind,
            quantity: self.quantity,
            reason,
            actor_id,
        })
    }
}

/// Stored payload of a ledger row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementAttributes {
    pub item_id: StockItemId,
    pub kind: MovementKind,
    pub quantity: Decimal,
    pub reason: String,
    pub actor_id: UserId,
}

/// Append-only ledger entry. Created once, never updated or deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StockMovement {
    id: MovementId,
    tenant_id: TenantId,
    #[serde(flatten)]
    attributes: MovementAttributes,
    created_at: DateTime<Utc>,
}

impl StockMovement {
    pub fn hydrate(
        id: MovementId,
        tenant_id: TenantId,
        attributes: MovementAttributes,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            tenant_id,
            attributes,
            created_at,
        }
    }

    pub fn id_typed(&self) -> MovementId {
        self.id
    }

    pub fn item_id(&self) -> StockItemId {
        self.attributes.item_id
    }

    pub fn kind(&self) -> MovementKind {
        self.attributes.kind
    }

    pub fn quantity(&self) -> Decimal {
        self.attributes.quantity
    }

    pub fn reason(&self) -> &str {
        &self.attributes.reason
    }

    pub fn actor_id(&self) -> UserId {
        self.attributes.actor_id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Signed effect of this entry on the item's balance.
    pub fn delta(&self) -> Decimal {
        self.attributes.kind.delta(self.attributes.quantity)
    }
}

impl Entity for StockMovement {
    type Id = MovementId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item_id() -> StockItemId {
        StockItemId::new(EntityId::new())
    }

    #[test]
    fn non_positive_quantities_are_rejected() {
        for q in [Decimal::ZERO, Decimal::from(-3), Decimal::new(-1, 2)] {
            let err = MovementRequest::entry(item_id(), q).validate().unwrap_err();
            assert!(matches!(err, DomainError::Validation(msg) if msg.contains("positive")));
        }
    }

    #[test]
    fn blank_reason_falls_back_to_direction_default() {
        let actor = UserId::new();
        let entry = MovementRequest::entry(item_id(), Decimal::ONE)
            .with_reason("  ")
            .into_attributes(actor)
            .unwrap();
        assert_eq!(entry.reason, "Manual Entry");

        let exit = MovementRequest::exit(item_id(), Decimal::ONE)
            .into_attributes(actor)
            .unwrap();
        assert_eq!(exit.reason, "Manual Exit");
        assert_eq!(exit.actor_id, actor);
    }

    #[test]
    fn explicit_reason_is_kept_trimmed() {
        let attrs = MovementRequest::exit(item_id(), Decimal::from(2))
            .with_reason("  used on job #42 ")
            .into_attributes(UserId::new())
            .unwrap();
        assert_eq!(attrs.reason, "used on job #42");
    }

    #[test]
    fn apply_adds_entries_and_subtracts_exits() {
        let ten = Decimal::from(10);
        assert_eq!(MovementKind::Entry.apply(ten, Decimal::from(5)), Ok(Decimal::from(15)));
        assert_eq!(MovementKind::Exit.apply(ten, Decimal::from(20)), Ok(Decimal::from(-10)));
        assert_eq!(MovementKind::Exit.apply(ten, Decimal::new(25, 1)), Ok(Decimal::new(75, 1)));
    }

    #[test]
    fn apply_rejects_balances_outside_decimal_range() {
        assert_eq!(
            MovementKind::Entry.apply(Decimal::MAX, Decimal::ONE),
            Err(quantity_out_of_range())
        );
        assert_eq!(
            MovementKind::Exit.apply(Decimal::MIN, Decimal::ONE),
            Err(quantity_out_of_range())
        );
        assert_eq!(MovementKind::Exit.apply(Decimal::MAX, Decimal::MAX), Ok(Decimal::ZERO));
    }
}
