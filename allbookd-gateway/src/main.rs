//! allbookd-gateway - Catalog gateway for the AllBookd web app
//!
//! Serves merged bestseller lists (cached per category) and proxies catalog
//! lookups so upstream API keys stay on the server.

use std::path::PathBuf;

use allbookd_common::config::{load_toml_config_or_default, ConfigOverrides, GatewayConfig};
use allbookd_gateway::{build_router, AppState};
use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for allbookd-gateway
#[derive(Parser, Debug)]
#[command(name = "allbookd-gateway")]
#[command(about = "Bestseller aggregation and catalog proxy for AllBookd")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, env = "ALLBOOKD_PORT")]
    port: Option<u16>,

    /// Address to bind
    #[arg(long, env = "ALLBOOKD_BIND_ADDRESS")]
    bind_address: Option<String>,

    /// TOML config file (default: <config dir>/allbookd/config.toml)
    #[arg(short, long, env = "ALLBOOKD_CONFIG")]
    config: Option<PathBuf>,

    /// Ranking API base URL
    #[arg(long, env = "ALLBOOKD_RANKING_BASE_URL")]
    ranking_base_url: Option<String>,

    /// Catalog API base URL
    #[arg(long, env = "ALLBOOKD_CATALOG_BASE_URL")]
    catalog_base_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "allbookd_gateway=info,allbookd_common=info,tower_http=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting AllBookd gateway v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let args = Args::parse();

    let toml_config = load_toml_config_or_default(args.config.as_deref())?;
    let overrides = ConfigOverrides {
        port: args.port,
        bind_address: args.bind_address,
        ranking_base_url: args.ranking_base_url,
        catalog_base_url: args.catalog_base_url,
    };
    let config = GatewayConfig::resolve(overrides, &toml_config)?;

    info!("Ranking API: {}", config.ranking_base_url);
    info!("Catalog API: {}", config.catalog_base_url);
    info!(
        "Cache TTL: {}s, enrichment concurrency: {}, enrichment timeout: {}ms",
        config.cache_ttl.as_secs(),
        config.enrichment_concurrency,
        config.enrichment_timeout.as_millis()
    );

    let state = AppState::from_config(&config).context("Failed to initialize upstream clients")?;
    let app = build_router(state);

    let address = config.listen_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind to {}", address))?;
    info!("Listening on http://{}", address);
    info!("Health check: http://{}/health", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
