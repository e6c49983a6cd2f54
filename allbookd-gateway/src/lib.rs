//! allbookd-gateway library
//!
//! Server-side catalog gateway for the AllBookd web app:
//! - `GET /bestsellers` - ranking list merged with catalog metadata, cached per category
//! - `GET /book/:id` - single catalog volume proxy
//! - `GET /books` - free-text catalog search proxy
//! - `GET /health`

pub mod api;
pub mod error;
pub mod models;
pub mod services;

pub use crate::error::{ApiError, ApiResult};

use allbookd_common::config::GatewayConfig;
use axum::http::Method;
use axum::Router;
use chrono::{DateTime, Utc};
use services::{
    BestsellerCache, BestsellerService, CatalogClient, CatalogSource, EnrichmentFanout,
    RankingClient, RankingSource, UpstreamError,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Bestseller pipeline, including its cache
    pub bestsellers: Arc<BestsellerService>,
    /// Catalog upstream for the proxy routes
    pub catalog: Arc<dyn CatalogSource>,
    /// Service startup timestamp for uptime reporting
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    /// Wire the pipeline around the given upstreams
    pub fn new(
        ranking: Arc<dyn RankingSource>,
        catalog: Arc<dyn CatalogSource>,
        config: &GatewayConfig,
    ) -> Self {
        let enrichment = EnrichmentFanout::new(
            Arc::clone(&catalog),
            config.enrichment_concurrency,
            config.enrichment_timeout,
        );
        let bestsellers = BestsellerService::new(
            ranking,
            enrichment,
            BestsellerCache::new(config.cache_ttl),
            config.default_category.clone(),
        );

        Self {
            bestsellers: Arc::new(bestsellers),
            catalog,
            startup_time: Utc::now(),
        }
    }

    /// Build state with real HTTP clients for both upstreams
    pub fn from_config(config: &GatewayConfig) -> Result<Self, UpstreamError> {
        let ranking = RankingClient::new(
            config.ranking_base_url.clone(),
            config.ranking_api_key.clone(),
            config.upstream_timeout,
        )?;
        let catalog = CatalogClient::new(
            config.catalog_base_url.clone(),
            config.catalog_api_key.clone(),
            config.upstream_timeout,
        )?;

        Ok(Self::new(Arc::new(ranking), Arc::new(catalog), config))
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    // UI is served from a different origin
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_origin(Any)
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        .merge(api::bestseller_routes())
        .merge(api::catalog_routes())
        .merge(api::health_routes())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
