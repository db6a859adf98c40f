//! Dashboard summary across inventory and quotes.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Serialize;

use hvacdesk_auth::RequestContext;
use hvacdesk_inventory::{StockItem, StockMovement};
use hvacdesk_quotes::{Quote, QuoteStatus};

use crate::backend::DataBackend;
use crate::error::ServiceResult;
use crate::inventory::{MovementLedger, StockCatalog};
use crate::quotes::QuoteBook;

pub const RECENT_MOVEMENTS: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub item_count: usize,
    pub low_stock_count: usize,
    pub low_stock_items: Vec<String>,
    /// Σ max(quantity, 0) × unit_cost.
    /// Capped at `Decimal::MAX`, like `approved_total`.
    pub stock_value: Decimal,
    pub quotes_by_status: BTreeMap<&'static str, usize>,
    pub approved_total: Decimal,
    pub recent_movements: Vec<StockMovement>,
}

/// Read-only view composed from the catalog, ledger and quote book.
#[derive(Debug, Clone)]
pub struct Dashboard<B> {
    catalog: StockCatalog<B>,
    ledger: MovementLedger<B>,
    quotes: QuoteBook<B>,
}

impl<B> Dashboard<B>
where
    B: DataBackend + Clone,
{
    pub fn new(catalog: StockCatalog<B>, ledger: MovementLedger<B>, quotes: QuoteBook<B>) -> Self {
        Self {
            catalog,
            ledger,
            quotes,
        }
    }

    pub fn summary(&self, ctx: &RequestContext) -> ServiceResult<DashboardSummary> {
        let items = self.catalog.list(ctx)?;
        let low: Vec<&StockItem> = items.iter().filter(|i| i.is_low_stock()).collect();

        let quotes = self.quotes.list(ctx)?;
        let mut quotes_by_status: BTreeMap<&'static str, usize> =
            QuoteStatus::ALL.iter().map(|s| (s.as_str(), 0)).collect();
        for quote in &quotes {
            *quotes_by_status.entry(quote.status().as_str()).or_default() += 1;
        }
        let approved_total = capped_sum(
            quotes
                .iter()
                .filter(|q| q.status() == QuoteStatus::Approved)
                .map(Quote::total),
        );

        Ok(DashboardSummary {
            item_count: items.len(),
            low_stock_count: low.len(),
            low_stock_items: low.iter().map(|i| i.name().to_string()).collect(),
            stock_value: capped_sum(items.iter().map(StockItem::stock_value)),
            quotes_by_status,
            approved_total,
            recent_movements: self.ledger.recent(ctx, RECENT_MOVEMENTS)?,
        })
    }
}

/// Sum of non-negative amounts, capped at `Decimal::MAX`.
fn capped_sum(amounts: impl IntoIterator<Item = Decimal>) -> Decimal {
    amounts
        .into_iter()
        .try_fold(Decimal::ZERO, |acc, amount| acc.checked_add(amount))
        .unwrap_or(Decimal::MAX)
}
