//! Movement ledger: append a movement, then apply it to the item's balance.
//!
//! The two writes are not transactional. If the balance step fails after the
//! movement row was stored, the row stays and the error is returned; nothing
//! reconciles the two afterwards.

use tracing::{info, instrument, warn};

use hvacdesk_auth::RequestContext;
use hvacdesk_core::ExpectedVersion;
use hvacdesk_inventory::policy::insufficient_stock;
use hvacdesk_inventory::{
    BalanceStrategy, InventoryPolicy, MovementAttributes, MovementId, MovementKind,
    MovementRequest, StockItem, StockItemId, StockMovement, quantity_out_of_range,
};

use super::catalog::{self, StockCatalog};
use crate::backend::{BackendError, Collection, DataBackend, Query, Record, encode};
use crate::error::{ServiceError, ServiceResult};

const ENTITY: &str = "stock movement";

#[derive(Debug, Clone)]
pub struct MovementLedger<B> {
    catalog: StockCatalog<B>,
    policy: InventoryPolicy,
    strategy: BalanceStrategy,
}

impl<B> MovementLedger<B>
where
    B: DataBackend,
{
    pub fn new(backend: B, policy: InventoryPolicy, strategy: BalanceStrategy) -> Self {
        Self {
            catalog: StockCatalog::new(backend),
            policy,
            strategy,
        }
    }

    pub fn catalog(&self) -> &StockCatalog<B> {
        &self.catalog
    }

    pub fn policy(&self) -> InventoryPolicy {
        self.policy
    }

    pub fn strategy(&self) -> BalanceStrategy {
        self.strategy
    }

    /// Record a stock entry or exit and update the item's on-hand quantity.
    #[instrument(
        skip(self, ctx, request),
        fields(
            tenant_id = %ctx.tenant_id(),
            item_id = %request.item_id,
            kind = request.kind.as_str(),
            strategy = self.strategy.name()
        )
    )]
    pub fn record(
        &self,
        ctx: &RequestContext,
        request: MovementRequest,
    ) -> ServiceResult<StockMovement> {
        let attributes = request.into_attributes(ctx.actor_id())?;
        let item = self.catalog.get(ctx, attributes.item_id)?;
        // Checked before the insert so a rejected exit leaves no ledger row.
        self.policy
            .next_balance(item.quantity_on_hand(), attributes.kind, attributes.quantity)?;

        let record = self
            .backend()
            .insert(ctx.tenant_id(), Collection::StockMovements, encode(&attributes)?)
            .map_err(|e| ServiceError::from_backend(ENTITY, e))?;
        let movement = hydrate_movement(&record)?;

        match self.apply_balance(ctx, &item, &movement) {
            Ok(updated) => {
                info!(
                    movement_id = %movement.id_typed(),
                    quantity = %movement.quantity(),
                    balance = %updated.quantity_on_hand(),
                    "stock movement recorded"
                );
                Ok(movement)
            }
            Err(err) => {
                warn!(
                    movement_id = %movement.id_typed(),
                    error = %err,
                    "movement stored but balance update failed"
                );
                Err(err)
            }
        }
    }

    /// Movements of one item, newest first.
    pub fn history(
        &self,
        ctx: &RequestContext,
        item_id: StockItemId,
    ) -> ServiceResult<Vec<StockMovement>> {
        let query = Query::all()
            .eq("item_id", item_id.to_string())
            .newest_first();
        self.select(ctx, &query)
    }

    /// Latest movements across all items, newest first.
    pub fn recent(&self, ctx: &RequestContext, limit: usize) -> ServiceResult<Vec<StockMovement>> {
        self.select(ctx, &Query::all().newest_first().limit(limit))
    }

    fn backend(&self) -> &B {
        self.catalog.backend()
    }

    fn select(&self, ctx: &RequestContext, query: &Query) -> ServiceResult<Vec<StockMovement>> {
        self.backend()
            .select(ctx.tenant_id(), Collection::StockMovements, query)
            .map_err(|e| ServiceError::from_backend(ENTITY, e))?
            .iter()
            .map(|r| hydrate_movement(r).map_err(ServiceError::from))
            .collect()
    }

    fn apply_balance(
        &self,
        ctx: &RequestContext,
        item: &StockItem,
        movement: &StockMovement,
    ) -> ServiceResult<StockItem> {
        let id = movement.item_id();
        match self.strategy {
            BalanceStrategy::ReadModifyWrite => {
                let current = self.catalog.get(ctx, id)?;
                let next = self.policy.next_balance(
                    current.quantity_on_hand(),
                    movement.kind(),
                    movement.quantity(),
                )?;
                self.catalog.set_quantity(ctx, id, next, ExpectedVersion::Any)
            }
            BalanceStrategy::AtomicIncrement => self
                .catalog
                .add_quantity(ctx, id, movement.delta(), self.policy.floor())
                .map_err(|e| match e {
                    // Only an exit can cross the floor; anything else left the decimal range.
                    BackendError::Constraint(_) => match (movement.kind(), self.policy.floor()) {
                        (MovementKind::Exit, Some(_)) => {
                            insufficient_stock(item.quantity_on_hand(), movement.quantity()).into()
                        }
                        _ => quantity_out_of_range().into(),
                    },
                    other => ServiceError::from_backend(catalog::ENTITY, other),
                }),
            BalanceStrategy::OptimisticVersion { max_retries } => {
                let attempts = max_retries.saturating_add(1);
                for attempt in 1..=attempts {
                    let current = self.catalog.get(ctx, id)?;
                    let next = self.policy.next_balance(
                        current.quantity_on_hand(),
                        movement.kind(),
                        movement.quantity(),
                    )?;
                    let expected = ExpectedVersion::Exact(current.version());
                    match self.catalog.set_quantity(ctx, id, next, expected) {
                        Err(ServiceError::Conflict(reason)) => {
                            warn!(attempt, %reason, "balance write conflicted; re-reading");
                        }
                        other => return other,
                    }
                }
                Err(ServiceError::Conflict(format!(
                    "balance of stock item {id} kept changing; gave up after {attempts} attempts"
                )))
            }
        }
    }
}

fn hydrate_movement(record: &Record) -> Result<StockMovement, BackendError> {
    let attributes: MovementAttributes = record.decode()?;
    Ok(StockMovement::hydrate(
        MovementId::new(record.id),
        record.tenant_id,
        attributes,
        record.created_at,
    ))
}
