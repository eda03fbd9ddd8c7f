use anyhow::Context;

use storegate_infra::GatewayConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    storegate_observability::init();

    let config = GatewayConfig::from_env().context("invalid configuration")?;
    tracing::info!(config = ?config, "configuration loaded");

    let app = storegate_api::app::build_app(&config);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
