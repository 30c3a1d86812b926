use std::sync::Arc;
use order_relay::{startup::build_router, AppConfig, AppState};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("order_relay=info,tower_http=info")),
        )
        .init();

    if config.service_account_json.is_none() {
        tracing::warn!("FIREBASE_SERVICE_ACCOUNT_JSON not set, order requests will fail until it is");
    }

    let address = config.bind_address();
    let app = build_router(Arc::new(AppState::new(config)));

    let listener = tokio::net::TcpListener::bind(&address).await.map_err(|e| {
        tracing::error!("Failed to bind {}: {}", address, e);
        anyhow::anyhow!("Failed to bind to address {}: {}", address, e)
    })?;

    tracing::info!("order-relay listening on {}", address);
    axum::serve(listener, app).await?;

    Ok(())
}
