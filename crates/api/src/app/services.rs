use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use hvacdesk_infra::backend::BackendError;
use hvacdesk_infra::{
    AppConfig, Dashboard, DataBackend, InMemoryBackend, MovementLedger, PostgresBackend,
    QuoteBook, ServiceError, ServiceResult, StockCatalog,
};
use hvacdesk_inventory::{BalanceStrategy, InventoryPolicy};

/// Backend handle shared by every service.
pub type SharedBackend = Arc<dyn DataBackend>;

/// Application services shared by all handlers.
///
/// All services are synchronous; handlers run them through [`blocking`].
#[derive(Clone)]
pub struct AppServices {
    pub catalog: StockCatalog<SharedBackend>,
    pub ledger: MovementLedger<SharedBackend>,
    pub quotes: QuoteBook<SharedBackend>,
    pub dashboard: Dashboard<SharedBackend>,
}

impl AppServices {
    pub fn new(backend: SharedBackend, policy: InventoryPolicy, strategy: BalanceStrategy) -> Self {
        let catalog = StockCatalog::new(Arc::clone(&backend));
        let ledger = MovementLedger::new(Arc::clone(&backend), policy, strategy);
        let quotes = QuoteBook::new(backend);
        let dashboard = Dashboard::new(catalog.clone(), ledger.clone(), quotes.clone());
        Self {
            catalog,
            ledger,
            quotes,
            dashboard,
        }
    }

    /// Services over a fresh in-memory backend (dev/tests).
    pub fn in_memory(policy: InventoryPolicy, strategy: BalanceStrategy) -> Self {
        Self::new(Arc::new(InMemoryBackend::new()), policy, strategy)
    }
}

/// Wire services from configuration: Postgres when `DATABASE_URL` is set,
/// otherwise in-memory.
pub async fn build_services(config: &AppConfig) -> anyhow::Result<AppServices> {
    let backend: SharedBackend = match &config.database_url {
        Some(url) => {
            let pg = PostgresBackend::connect(url)
                .await
                .context("failed to connect to Postgres")?;
            pg.migrate().await.context("failed to create schema")?;
            info!("using postgres backend");
            Arc::new(pg)
        }
        None => {
            info!("DATABASE_URL not set; using in-memory backend");
            Arc::new(InMemoryBackend::new())
        }
    };

    info!(
        allow_negative = config.policy.allow_negative,
        strategy = config.strategy.name(),
        "inventory policy"
    );
    Ok(AppServices::new(backend, config.policy, config.strategy))
}

/// Run a synchronous service call on the blocking pool.
pub async fn blocking<T, F>(f: F) -> ServiceResult<T>
where
    F: FnOnce() -> ServiceResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.map_err(|e| {
        ServiceError::Backend(BackendError::Unavailable(format!("worker task failed: {e}")))
    })?
}
