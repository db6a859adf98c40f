//! Inventory domain module.
//!
//! Stock catalog records, the append-only movement ledger entries and the
//! balance arithmetic that links them. Pure domain logic (no IO, no HTTP, no
//! storage); persistence lives in `hvacdesk-infra`.

pub mod item;
pub mod movement;
pub mod patch;
pub mod policy;

pub use item::{DEFAULT_UNIT, ItemDraft, StockItem, StockItemAttributes, StockItemId};
pub use movement::{
    MovementAttributes, MovementId, MovementKind, MovementRequest, StockMovement,
    quantity_out_of_range,
};
pub use patch::ItemPatch;
pub use policy::{BalanceStrategy, InventoryPolicy};
