use anyhow::Context;

use inkworks_api::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    inkworks_observability::init();

    let config = AppConfig::load().context("loading configuration")?;
    let app = inkworks_api::app::build_app(&config)
        .await
        .context("building application")?;

    let addr = config.server.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, app).await?;
    Ok(())
}
