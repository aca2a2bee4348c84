use anyhow::Context;

use taskgate_api::config::{GatewayConfig, RECOMMENDED_SECRET_LEN};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    taskgate_observability::init();

    let config = GatewayConfig::from_env().context("invalid gateway configuration")?;
    if config.has_weak_secret() {
        tracing::warn!(
            len = config.jwt_secret.len(),
            recommended = RECOMMENDED_SECRET_LEN,
            "JWT_SECRET is shorter than recommended"
        );
    }
    tracing::debug!(?config, "configuration loaded");

    let app = taskgate_api::app::build_app(&config).await?;

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
