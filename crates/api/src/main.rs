use anyhow::Context;

use board_api::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Refuse to start without a usable signing key and TTLs.
    let config = AppConfig::from_env().context("invalid configuration")?;
    board_observability::init(config.log_format);

    let app = board_api::app::build_app(&config).await?;

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
