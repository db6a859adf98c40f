//! Typed partial update for catalog metadata.
//!
//! Only the fields listed here are editable. Identity, tenant, timestamps and
//! the on-hand quantity have no representation, so a patch can never carry them.

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

use hvacdesk_core::{DomainError, DomainResult};

use crate::item::{ensure_non_negative, normalize_description, validate_name};

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ItemPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// `Some(None)` clears the description; `None` leaves it untouched.
    #[serde(
        default,
        deserialize_with = "present_or_null",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<Option<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_cost: Option<Decimal>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sale_price: Option<Decimal>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum_quantity: Option<Decimal>,
}

impl ItemPatch {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    pub fn rename(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Validate and normalize the provided fields.
    pub fn normalized(self) -> DomainResult<Self> {
        let name = self.name.as_deref().map(validate_name).transpose()?;
        let unit = match self.unit {
            Some(u) if u.trim().is_empty() => {
                return Err(DomainError::validation("unit cannot be empty"));
            }
            Some(u) => Some(u.trim().to_string()),
            None => None,
        };
        if let Some(v) = self.unit_cost {
            ensure_non_negative("unit_cost", v)?;
        }
        if let Some(v) = self.sale_price {
            ensure_non_negative("sale_price", v)?;
        }
        if let Some(v) = self.minimum_quantity {
            ensure_non_negative("minimum_quantity", v)?;
        }

        Ok(Self {
            name,
            description: self.description.map(normalize_description),
            unit,
            unit_cost: self.unit_cost,
            sale_price: self.sale_price,
            minimum_quantity: self.minimum_quantity,
        })
    }
}

fn present_or_null<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}
