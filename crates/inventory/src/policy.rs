//! Balance rules applied when a movement is recorded.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use hvacdesk_core::{DomainError, DomainResult};

use crate::MovementKind;

/// Stock policy for a deployment.
///
/// `allow_negative` defaults to `true`: exits may overdraw an item, which is
/// then surfaced only through the low-stock flag. Setting it to `false`
/// rejects exits that would take the balance below zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryPolicy {
    pub allow_negative: bool,
}

impl Default for InventoryPolicy {
    fn default() -> Self {
        Self { allow_negative: true }
    }
}

impl InventoryPolicy {
    pub fn strict() -> Self {
        Self { allow_negative: false }
    }

    /// Lowest balance a write may produce, if any.
    pub fn floor(&self) -> Option<Decimal> {
        if self.allow_negative {
            None
        } else {
            Some(Decimal::ZERO)
        }
    }

    /// Compute the balance after a movement, enforcing the floor and the
    /// decimal range.
    pub fn next_balance(
        &self,
        current: Decimal,
        kind: MovementKind,
        quantity: Decimal,
    ) -> DomainResult<Decimal> {
        let next = kind.apply(current, quantity)?;
        match self.floor() {
            Some(floor) if next < floor => Err(insufficient_stock(current, quantity)),
            _ => Ok(next),
        }
    }
}

pub fn insufficient_stock(current: Decimal, requested: Decimal) -> DomainError {
    DomainError::validation(format!(
        "insufficient stock: {current} on hand, {requested} requested"
    ))
}

/// How the ledger writes the new balance back to the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BalanceStrategy {
    /// Read the quantity, compute, overwrite. Not safe under concurrent
    /// movements on the same item (lost update); kept for compatibility.
    ReadModifyWrite,
    /// Single backend-side increment/decrement.
    #[default]
    AtomicIncrement,
    /// Read with version, compare-and-set, re-read and retry on conflict.
    OptimisticVersion { max_retries: u32 },
}

impl BalanceStrategy {
    pub fn name(&self) -> &'static str {
        match self {
            BalanceStrategy::ReadModifyWrite => "read-modify-write",
            BalanceStrategy::AtomicIncrement => "atomic",
            BalanceStrategy::OptimisticVersion { .. } => "optimistic",
        }
    }
}
