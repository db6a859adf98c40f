//! Stock catalog service.

use rust_decimal::Decimal;
use serde_json::Value as JsonValue;
use tracing::{debug, info, instrument};

use hvacdesk_auth::RequestContext;
use hvacdesk_core::ExpectedVersion;
use hvacdesk_inventory::{ItemDraft, ItemPatch, StockItem, StockItemAttributes, StockItemId};

use crate::backend::{
    BackendError, Collection, DataBackend, Direction, Increment, Query, Record, Row, encode,
};
use crate::error::{ServiceError, ServiceResult};

pub(crate) const ENTITY: &str = "stock item";
pub(crate) const QUANTITY_FIELD: &str = "quantity_on_hand";

/// Catalog of stock items for the request's tenant.
///
/// Metadata edits go through [`StockCatalog::update`]; the on-hand quantity
/// is written only by the movement ledger.
#[derive(Debug, Clone)]
pub struct StockCatalog<B> {
    backend: B,
}

impl<B> StockCatalog<B>
where
    B: DataBackend,
{
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// All items, ordered by name (case-insensitive).
    pub fn list(&self, ctx: &RequestContext) -> ServiceResult<Vec<StockItem>> {
        let query = Query::all().order_by("name", Direction::Asc);
        self.backend
            .select(ctx.tenant_id(), Collection::StockItems, &query)
            .map_err(|e| ServiceError::from_backend(ENTITY, e))?
            .iter()
            .map(|r| hydrate_item(r).map_err(ServiceError::from))
            .collect()
    }

    pub fn get(&self, ctx: &RequestContext, id: StockItemId) -> ServiceResult<StockItem> {
        let record = self
            .backend
            .get(ctx.tenant_id(), Collection::StockItems, id.0)
            .map_err(|e| ServiceError::from_backend(ENTITY, e))?
            .ok_or(ServiceError::NotFound(ENTITY))?;
        Ok(hydrate_item(&record)?)
    }

    /// Items at or below their minimum, in name order.
    pub fn low_stock(&self, ctx: &RequestContext) -> ServiceResult<Vec<StockItem>> {
        Ok(self
            .list(ctx)?
            .into_iter()
            .filter(StockItem::is_low_stock)
            .collect())
    }

    #[instrument(skip(self, draft), fields(tenant_id = %ctx.tenant_id()))]
    pub fn create(&self, ctx: &RequestContext, draft: ItemDraft) -> ServiceResult<StockItem> {
        let attributes = draft.into_attributes()?;
        let row = encode(&attributes)?;
        let record = self
            .backend
            .insert(ctx.tenant_id(), Collection::StockItems, row)
            .map_err(|e| ServiceError::from_backend(ENTITY, e))?;
        let item = hydrate_item(&record)?;
        info!(item_id = %item.id_typed(), name = item.name(), "stock item created");
        Ok(item)
    }

    /// Apply a metadata patch. An empty patch returns the current item.
    #[instrument(skip(self, patch), fields(tenant_id = %ctx.tenant_id(), item_id = %id))]
    pub fn update(
        &self,
        ctx: &RequestContext,
        id: StockItemId,
        patch: ItemPatch,
    ) -> ServiceResult<StockItem> {
        let patch = patch.normalized()?;
        if patch.is_empty() {
            return self.get(ctx, id);
        }
        let row = encode(&patch)?;
        let record = self
            .backend
            .update(ctx.tenant_id(), Collection::StockItems, id.0, row, ExpectedVersion::Any)
            .map_err(|e| ServiceError::from_backend(ENTITY, e))?;
        info!("stock item updated");
        Ok(hydrate_item(&record)?)
    }

    #[instrument(skip(self), fields(tenant_id = %ctx.tenant_id(), item_id = %id))]
    pub fn delete(&self, ctx: &RequestContext, id: StockItemId) -> ServiceResult<()> {
        self.backend
            .delete(ctx.tenant_id(), Collection::StockItems, id.0)
            .map_err(|e| ServiceError::from_backend(ENTITY, e))?;
        info!("stock item deleted");
        Ok(())
    }

    /// Overwrite the on-hand quantity (ledger apply step only).
    pub(crate) fn set_quantity(
        &self,
        ctx: &RequestContext,
        id: StockItemId,
        quantity: Decimal,
        expected: ExpectedVersion,
    ) -> ServiceResult<StockItem> {
        let mut row = Row::new();
        row.insert(QUANTITY_FIELD.to_string(), JsonValue::String(quantity.to_string()));
        let record = self
            .backend
            .update(ctx.tenant_id(), Collection::StockItems, id.0, row, expected)
            .map_err(|e| ServiceError::from_backend(ENTITY, e))?;
        debug!(item_id = %id, %quantity, ?expected, "quantity overwritten");
        Ok(hydrate_item(&record)?)
    }

    /// Add a signed delta to the on-hand quantity in one backend step.
    ///
    /// Returns the raw backend error so the caller can translate a floor
    /// violation with the context it has.
    pub(crate) fn add_quantity(
        &self,
        ctx: &RequestContext,
        id: StockItemId,
        delta: Decimal,
        floor: Option<Decimal>,
    ) -> Result<StockItem, BackendError> {
        let op = Increment::new(QUANTITY_FIELD, delta).with_floor(floor);
        let record = self
            .backend
            .increment(ctx.tenant_id(), Collection::StockItems, id.0, &op)?;
        debug!(item_id = %id, %delta, "quantity incremented");
        hydrate_item(&record)
    }
}

pub(crate) fn hydrate_item(record: &Record) -> Result<StockItem, BackendError> {
    let attributes: StockItemAttributes = record.decode()?;
    Ok(StockItem::hydrate(
        StockItemId::new(record.id),
        record.tenant_id,
        attributes,
        record.version,
        record.created_at,
        record.updated_at,
    ))
}
