//! Infrastructure layer: data backends, services, config.

pub mod backend;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod inventory;
pub mod quotes;

pub use backend::{BackendError, DataBackend, InMemoryBackend, PostgresBackend};
pub use config::{AppConfig, ConfigError};
pub use dashboard::{Dashboard, DashboardSummary};
pub use error::{ServiceError, ServiceResult};
pub use inventory::{MovementLedger, StockCatalog};
pub use quotes::QuoteBook;
