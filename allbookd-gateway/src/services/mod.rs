//! Upstream clients and the bestseller pipeline
//!
//! # Pipeline
//! 1. **bestseller_cache** - per-category TTL cache with refresh de-duplication
//! 2. **ranking_client** - fetch the ranked list for a category
//! 3. **enrichment** - concurrent per-item catalog lookups, isolated failures
//! 4. **bestsellers** - cache check, fetch, fan-out, positional merge, cache write
//!
//! The upstreams sit behind [`RankingSource`] and [`CatalogSource`] so the
//! pipeline can be driven by mocks in tests.

pub mod bestseller_cache;
pub mod bestsellers;
pub mod catalog_client;
pub mod enrichment;
pub mod ranking_client;

pub use bestseller_cache::{BestsellerCache, CacheEntry};
pub use bestsellers::{BestsellerError, BestsellerService};
pub use catalog_client::CatalogClient;
pub use enrichment::{EnrichmentError, EnrichmentFanout, EnrichmentOutcome};
pub use ranking_client::RankingClient;

use crate::models::{CatalogVolume, RankedItem, VolumeQuery, VolumeSearchPage};
use async_trait::async_trait;
use thiserror::Error;

/// Errors talking to either upstream
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("API key is not set")]
    MissingApiKey,

    #[error("Invalid upstream URL: {0}")]
    InvalidUrl(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Upstream returned {status}: {reason}")]
    Status { status: u16, reason: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Malformed payload: {0}")]
    MalformedPayload(String),
}

impl UpstreamError {
    /// Map a non-success response status
    pub(crate) fn from_status(status: reqwest::StatusCode) -> Self {
        Self::Status {
            status: status.as_u16(),
            reason: status
                .canonical_reason()
                .unwrap_or("Unknown status")
                .to_string(),
        }
    }
}

/// Source of ranked bestseller lists
#[async_trait]
pub trait RankingSource: Send + Sync {
    /// Current ranked list for `category`, in rank order
    async fn fetch_list(&self, category: &str) -> Result<Vec<RankedItem>, UpstreamError>;
}

/// Source of catalog volume metadata
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Whether an API key is configured
    fn has_api_key(&self) -> bool;

    /// First volume matching `isbn`, or `None` when the catalog has no match
    ///
    /// Does not require an API key up front; a missing key is sent empty.
    async fn lookup_isbn(&self, isbn: &str) -> Result<Option<CatalogVolume>, UpstreamError>;

    /// Raw volume record by catalog id. Fails with
    /// [`UpstreamError::MissingApiKey`] when no key is configured.
    async fn get_volume(&self, id: &str) -> Result<serde_json::Value, UpstreamError>;

    /// Free-text search. Fails with [`UpstreamError::MissingApiKey`] when no
    /// key is configured.
    async fn search_volumes(&self, query: &VolumeQuery) -> Result<VolumeSearchPage, UpstreamError>;
}
