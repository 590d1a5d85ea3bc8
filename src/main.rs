use std::env;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use docchat::config::{Config, LogFormat};
use docchat::services::{ModelCatalog, OpenRouterClient};
use docchat::{create_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Logging comes up before the config so its loading is traced.
    init_tracing(LogFormat::from_env());

    let config = Config::from_env()?;

    tracing::info!("Starting Document Chat Assistant");
    tracing::info!("Default model: {}", config.default_model);
    tracing::info!("API key: {}", config.api_key_hint());
    tracing::info!(
        "Upload limits: {}MB per file, {}MB total",
        config.max_file_size_mb,
        config.max_total_upload_mb
    );

    let client = Arc::new(OpenRouterClient::from_config(&config)?);
    let catalog = ModelCatalog::load(client.as_ref(), config.default_model.clone()).await;
    tracing::info!("Model catalog: {} models, current {}", catalog.models().len(), catalog.current());

    // PORT wins over SERVER_PORT for hosted environments
    let port = env::var("PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(config.server_port);
    let addr = format!("{}:{}", config.server_host, port);

    let app = create_router(AppState::new(config, client, catalog));

    tracing::info!("Server listening on http://{}", addr);

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "docchat=debug,tower_http=debug,axum::rejection=trace".into());
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_target(false))
            .init(),
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().with_target(false))
            .init(),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
