use std::sync::Arc;

use anyhow::Context;

use pbac_api::app::{AppServices, build_app};
use pbac_infra::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("failed to load configuration")?;
    pbac_observability::init(&config.log_filter);

    let services = AppServices::from_config(&config).await?;
    let app = build_app(Arc::new(services));

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
