use anyhow::Context;

use hvacdesk_api::app::{build_app, services};
use hvacdesk_infra::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    hvacdesk_observability::init();

    let config = AppConfig::from_env().context("invalid configuration")?;
    let services = services::build_services(&config).await?;
    let app = build_app(config.jwt_secret.clone(), services);

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
