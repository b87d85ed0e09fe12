use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use trafficcmp_core::config::Config;
use trafficcmp_server::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Structured JSON logging. Level controlled via RUST_LOG env var.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("trafficcmp=info".parse()?),
        )
        .json()
        .init();

    let cfg = Config::from_env().map_err(|e| anyhow::anyhow!(e))?;

    std::fs::create_dir_all(&cfg.upload_dir)?;

    let addr = format!("0.0.0.0:{}", cfg.port);
    info!(
        port = cfg.port,
        upload_dir = %cfg.upload_dir.display(),
        max_upload_bytes = cfg.max_upload_bytes,
        "trafficcmp listening on {}",
        addr
    );

    let state = Arc::new(AppState::new(cfg));
    let app = trafficcmp_server::app::build_app(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            info!("Shutdown signal received");
        })
        .await?;

    Ok(())
}
