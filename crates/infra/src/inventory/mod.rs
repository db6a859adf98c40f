//! Stock catalog and movement ledger services.

pub mod catalog;
pub mod ledger;

pub use catalog::StockCatalog;
pub use ledger::MovementLedger;
