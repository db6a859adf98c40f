use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use hvacdesk_core::{DomainError, DomainResult, Entity, EntityId, TenantId};

/// Unit of measure used when the operator leaves it blank.
pub const DEFAULT_UNIT: &str = "un";

/// Stock item identifier (tenant-scoped via the owning record's tenant).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StockItemId(pub EntityId);

impl StockItemId {
    pub fn new(id: EntityId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for StockItemId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl core::str::FromStr for StockItemId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

/// The client-owned part of a stock item row.
///
/// This is exactly what gets stored in the backend's row payload; identity,
/// tenant, version and timestamps are server metadata and live outside it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockItemAttributes {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub unit: String,
    pub unit_cost: Decimal,
    pub sale_price: Decimal,
    pub quantity_on_hand: Decimal,
    pub minimum_quantity: Decimal,
}

/// Catalog record: item metadata plus the running on-hand quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StockItem {
    id: StockItemId,
    tenant_id: TenantId,
    #[serde(flatten)]
    attributes: StockItemAttributes,
    version: u64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl StockItem {
    /// Rebuild an item from a stored row.
    pub fn hydrate(
        id: StockItemId,
        tenant_id: TenantId,
        attributes: StockItemAttributes,
        version: u64,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            tenant_id,
            attributes,
            version,
            created_at,
            updated_at,
        }
    }

    pub fn id_typed(&self) -> StockItemId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.attributes.name
    }

    pub fn description(&self) -> Option<&str> {
        self.attributes.description.as_deref()
    }

    pub fn unit(&self) -> &str {
        &self.attributes.unit
    }

    pub fn unit_cost(&self) -> Decimal {
        self.attributes.unit_cost
    }

    pub fn sale_price(&self) -> Decimal {
        self.attributes.sale_price
    }

    pub fn quantity_on_hand(&self) -> Decimal {
        self.attributes.quantity_on_hand
    }

    pub fn minimum_quantity(&self) -> Decimal {
        self.attributes.minimum_quantity
    }

    pub fn attributes(&self) -> &StockItemAttributes {
        &self.attributes
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// At or below the minimum threshold.
    pub fn is_low_stock(&self) -> bool {
        self.attributes.quantity_on_hand <= self.attributes.minimum_quantity
    }

    /// Cost value of the stock actually on the shelf (negative balances count as zero).
    ///
    /// Saturates at `Decimal::MAX` rather than overflowing.
    pub fn stock_value(&self) -> Decimal {
        self.attributes
            .quantity_on_hand
            .max(Decimal::ZERO)
            .checked_mul(self.attributes.unit_cost)
            .unwrap_or(Decimal::MAX)
    }
}

impl Entity for StockItem {
    type Id = StockItemId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }
}

/// Input for creating a catalog item.
///
/// There is deliberately no id, tenant or timestamp field: those are assigned
/// by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ItemDraft {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub unit_cost: Decimal,
    #[serde(default)]
    pub sale_price: Decimal,
    /// Opening balance; later changes go through the movement ledger only.
    #[serde(default)]
    pub initial_quantity: Decimal,
    #[serde(default)]
    pub minimum_quantity: Decimal,
}

impl ItemDraft {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Validate and normalize into the stored attribute set.
    pub fn into_attributes(self) -> DomainResult<StockItemAttributes> {
        let name = validate_name(&self.name)?;
        let unit = match self.unit {
            Some(u) if !u.trim().is_empty() => u.trim().to_string(),
            _ => DEFAULT_UNIT.to_string(),
        };
        ensure_non_negative("unit_cost", self.unit_cost)?;
        ensure_non_negative("sale_price", self.sale_price)?;
        ensure_non_negative("minimum_quantity", self.minimum_quantity)?;

        Ok(StockItemAttributes {
            name,
            description: normalize_description(self.description),
            unit,
            unit_cost: self.unit_cost,
            sale_price: self.sale_price,
            quantity_on_hand: self.initial_quantity,
            minimum_quantity: self.minimum_quantity,
        })
    }
}

pub(crate) fn validate_name(name: &str) -> DomainResult<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation("name cannot be empty"));
    }
    Ok(trimmed.to_string())
}

pub(crate) fn ensure_non_negative(field: &str, value: Decimal) -> DomainResult<()> {
    if value < Decimal::ZERO {
        return Err(DomainError::validation(format!("{field} cannot be negative")));
    }
    Ok(())
}

pub(crate) fn normalize_description(description: Option<String>) -> Option<String> {
    description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(quantity: i64, minimum: i64) -> StockItem {
        let attrs = ItemDraft {
            initial_quantity: Decimal::from(quantity),
            minimum_quantity: Decimal::from(minimum),
            unit_cost: Decimal::from(4),
            ..ItemDraft::named("Filter X")
        }
        .into_attributes()
        .unwrap();
        let now = Utc::now();
        StockItem::hydrate(
            StockItemId::new(EntityId::new()),
            TenantId::new(),
            attrs,
            1,
            now,
            now,
        )
    }

    #[test]
    fn empty_or_blank_name_is_rejected() {
        for name in ["", "   ", "\t\n"] {
            let err = ItemDraft::named(name).into_attributes().unwrap_err();
            assert_eq!(err, DomainError::validation("name cannot be empty"));
        }
    }

    #[test]
    fn draft_defaults_unit_and_trims_fields() {
        let attrs = ItemDraft {
            description: Some("   ".to_string()),
            unit: Some(" ".to_string()),
            ..ItemDraft::named("  Capacitor 35uF  ")
        }
        .into_attributes()
        .unwrap();

        assert_eq!(attrs.name, "Capacitor 35uF");
        assert_eq!(attrs.unit, DEFAULT_UNIT);
        assert_eq!(attrs.description, None);
    }

    #[test]
    fn negative_money_is_rejected() {
        let err = ItemDraft {
            sale_price: Decimal::from(-1),
            ..ItemDraft::named("Gas R410A")
        }
        .into_attributes()
        .unwrap_err();
        assert!(matches!(err, DomainError::Validation(msg) if msg.contains("sale_price")));
    }

    #[test]
    fn negative_opening_balance_is_allowed() {
        let attrs = ItemDraft {
            initial_quantity: Decimal::from(-2),
            ..ItemDraft::named("Copper pipe")
        }
        .into_attributes()
        .unwrap();
        assert_eq!(attrs.quantity_on_hand, Decimal::from(-2));
    }

    #[test]
    fn low_stock_is_inclusive_of_the_threshold() {
        assert!(item(5, 5).is_low_stock());
        assert!(item(-5, 5).is_low_stock());
        assert!(!item(15, 5).is_low_stock());
    }

    #[test]
    fn stock_value_ignores_negative_balances() {
        assert_eq!(item(3, 0).stock_value(), Decimal::from(12));
        assert_eq!(item(-3, 0).stock_value(), Decimal::ZERO);
    }

    #[test]
    fn stock_value_saturates_instead_of_overflowing() {
        let attrs = ItemDraft {
            initial_quantity: Decimal::MAX,
            unit_cost: Decimal::from(2),
            ..ItemDraft::named("Filter X")
        }
        .into_attributes()
        .unwrap();
        let now = Utc::now();
        let huge = StockItem::hydrate(
            StockItemId::new(EntityId::new()),
            TenantId::new(),
            attrs,
            1,
            now,
            now,
        );
        assert_eq!(huge.stock_value(), Decimal::MAX);
    }

    #[test]
    fn item_serializes_flat() {
        let json = serde_json::to_value(item(1, 0)).unwrap();
        assert_eq!(json["name"], "Filter X");
        assert_eq!(json["unit"], DEFAULT_UNIT);
        assert!(json.get("attributes").is_none());
    }
}
