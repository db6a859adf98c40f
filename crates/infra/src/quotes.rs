//! Quote book service.
//!
//! Quotes read the stock catalog to price lines; they never touch balances.

use rust_decimal::Decimal;
use serde_json::Value as JsonValue;
use tracing::{info, instrument};

use hvacdesk_auth::RequestContext;
use hvacdesk_core::ExpectedVersion;
use hvacdesk_inventory::StockItemId;
use hvacdesk_quotes::{Quote, QuoteAttributes, QuoteDraft, QuoteId, QuoteLine, QuotePatch, QuoteStatus};

use crate::backend::{BackendError, Collection, DataBackend, Query, Record, Row, encode};
use crate::error::{ServiceError, ServiceResult};
use crate::inventory::StockCatalog;

const ENTITY: &str = "quote";

#[derive(Debug, Clone)]
pub struct QuoteBook<B> {
    backend: B,
    catalog: StockCatalog<B>,
}

impl<B> QuoteBook<B>
where
    B: DataBackend + Clone,
{
    pub fn new(backend: B) -> Self {
        Self {
            catalog: StockCatalog::new(backend.clone()),
            backend,
        }
    }

    /// All quotes, newest first.
    pub fn list(&self, ctx: &RequestContext) -> ServiceResult<Vec<Quote>> {
        self.backend
            .select(ctx.tenant_id(), Collection::Quotes, &Query::all().newest_first())
            .map_err(|e| ServiceError::from_backend(ENTITY, e))?
            .iter()
            .map(|r| hydrate_quote(r).map_err(ServiceError::from))
            .collect()
    }

    pub fn get(&self, ctx: &RequestContext, id: QuoteId) -> ServiceResult<Quote> {
        let record = self
            .backend
            .get(ctx.tenant_id(), Collection::Quotes, id.0)
            .map_err(|e| ServiceError::from_backend(ENTITY, e))?
            .ok_or(ServiceError::NotFound(ENTITY))?;
        Ok(hydrate_quote(&record)?)
    }

    #[instrument(skip(self, ctx, draft), fields(tenant_id = %ctx.tenant_id()))]
    pub fn create(&self, ctx: &RequestContext, draft: QuoteDraft) -> ServiceResult<Quote> {
        let attributes = draft.into_attributes(ctx.actor_id())?;
        let record = self
            .backend
            .insert(ctx.tenant_id(), Collection::Quotes, encode(&attributes)?)
            .map_err(|e| ServiceError::from_backend(ENTITY, e))?;
        let quote = hydrate_quote(&record)?;
        info!(quote_id = %quote.id_typed(), total = %quote.total(), "quote created");
        Ok(quote)
    }

    /// Edit an open quote. Closed quotes reject every edit.
    #[instrument(skip(self, ctx, patch), fields(tenant_id = %ctx.tenant_id(), quote_id = %id))]
    pub fn update(&self, ctx: &RequestContext, id: QuoteId, patch: QuotePatch) -> ServiceResult<Quote> {
        let patch = patch.normalized()?;
        let current = self.get(ctx, id)?;
        current.ensure_editable()?;
        if patch.is_empty() {
            return Ok(current);
        }
        let quote = self.write(ctx, &current, encode(&patch)?)?;
        info!("quote updated");
        Ok(quote)
    }

    /// Move a quote along its lifecycle.
    #[instrument(skip(self, ctx), fields(tenant_id = %ctx.tenant_id(), quote_id = %id))]
    pub fn transition(
        &self,
        ctx: &RequestContext,
        id: QuoteId,
        next: QuoteStatus,
    ) -> ServiceResult<Quote> {
        let current = self.get(ctx, id)?;
        current.check_transition(next)?;
        let mut row = Row::new();
        row.insert("status".to_string(), JsonValue::String(next.as_str().to_string()));
        let quote = self.write(ctx, &current, row)?;
        info!(from = current.status().as_str(), to = next.as_str(), "quote status changed");
        Ok(quote)
    }

    #[instrument(skip(self, ctx), fields(tenant_id = %ctx.tenant_id(), quote_id = %id))]
    pub fn delete(&self, ctx: &RequestContext, id: QuoteId) -> ServiceResult<()> {
        self.backend
            .delete(ctx.tenant_id(), Collection::Quotes, id.0)
            .map_err(|e| ServiceError::from_backend(ENTITY, e))?;
        info!("quote deleted");
        Ok(())
    }

    /// Price a line from a catalog item at its current sale price.
    pub fn line_from_catalog(
        &self,
        ctx: &RequestContext,
        item_id: StockItemId,
        quantity: Decimal,
    ) -> ServiceResult<QuoteLine> {
        if quantity <= Decimal::ZERO {
            return Err(ServiceError::validation("quantity must be positive"));
        }
        let item = self.catalog.get(ctx, item_id)?;
        Ok(QuoteLine::from_stock_item(&item, quantity))
    }

    /// Write against the version that was validated, so a concurrent status
    /// change surfaces as a conflict instead of being overwritten.
    fn write(&self, ctx: &RequestContext, current: &Quote, row: Row) -> ServiceResult<Quote> {
        let record = self
            .backend
            .update(
                ctx.tenant_id(),
                Collection::Quotes,
                current.id_typed().0,
                row,
                ExpectedVersion::Exact(current.version()),
            )
            .map_err(|e| ServiceError::from_backend(ENTITY, e))?;
        Ok(hydrate_quote(&record)?)
    }
}

fn hydrate_quote(record: &Record) -> Result<Quote, BackendError> {
    let attributes: QuoteAttributes = record.decode()?;
    Ok(Quote::hydrate(
        QuoteId::new(record.id),
        record.tenant_id,
        attributes,
        record.version,
        record.created_at,
        record.updated_at,
    ))
}
