//! Enrichment fan-out
//!
//! Looks up every ranked item in the catalog concurrently, keyed by its
//! ISBN. Lookups are isolated from each other: a failure, timeout or empty
//! result for one item never fails or delays another. Outcomes come back in
//! input order so the merge can zip them positionally.
//!
//! Concurrency is capped at `concurrency` in-flight lookups and each lookup
//! runs under its own deadline.

use super::{CatalogSource, UpstreamError};
use crate::models::{CatalogVolume, RankedItem};
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Why a single lookup produced no enrichment
#[derive(Debug, Error)]
pub enum EnrichmentError {
    #[error("Catalog lookup failed: {0}")]
    Upstream(#[from] UpstreamError),

    #[error("Catalog lookup timed out after {0:?}")]
    Timeout(Duration),
}

/// Result of enriching one ranked item
#[derive(Debug)]
pub enum EnrichmentOutcome {
    /// Item carried no ISBN; no lookup was made
    NoLookupKey,
    /// First catalog match
    Resolved(CatalogVolume),
    /// Catalog answered with zero matches
    NotFound,
    /// Lookup errored or timed out
    Failed(EnrichmentError),
}

impl EnrichmentOutcome {
    pub fn has_lookup_key(&self) -> bool {
        !matches!(self, EnrichmentOutcome::NoLookupKey)
    }

    /// The matched volume, if any
    pub fn into_volume(self) -> Option<CatalogVolume> {
        match self {
            EnrichmentOutcome::Resolved(volume) => Some(volume),
            _ => None,
        }
    }
}

/// Bounded, order-preserving catalog fan-out
pub struct EnrichmentFanout {
    catalog: Arc<dyn CatalogSource>,
    concurrency: usize,
    timeout: Duration,
}

impl EnrichmentFanout {
    pub fn new(catalog: Arc<dyn CatalogSource>, concurrency: usize, timeout: Duration) -> Self {
        Self {
            catalog,
            concurrency: concurrency.max(1),
            timeout,
        }
    }

    /// Enrich all items; `result[i]` belongs to `items[i]`
    pub async fn enrich_all(&self, items: &[RankedItem]) -> Vec<EnrichmentOutcome> {
        let lookups: Vec<_> = items.iter().map(|item| self.enrich_one(item)).collect();

        stream::iter(lookups)
            .buffered(self.concurrency)
            .collect()
            .await
    }

    async fn enrich_one(&self, item: &RankedItem) -> EnrichmentOutcome {
        let Some(isbn) = item.lookup_key() else {
            debug!(title = ?item.title(), "No ISBN, skipping catalog lookup");
            return EnrichmentOutcome::NoLookupKey;
        };

        match tokio::time::timeout(self.timeout, self.catalog.lookup_isbn(isbn)).await {
            Ok(Ok(Some(volume))) => EnrichmentOutcome::Resolved(volume),
            Ok(Ok(None)) => {
                debug!(isbn = %isbn, title = ?item.title(), "No catalog match");
                EnrichmentOutcome::NotFound
            }
            Ok(Err(e)) => {
                warn!(
                    isbn = %isbn,
                    title = ?item.title(),
                    error = %e,
                    "Catalog lookup failed"
                );
                EnrichmentOutcome::Failed(e.into())
            }
            Err(_) => {
                warn!(
                    isbn = %isbn,
                    title = ?item.title(),
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Catalog lookup timed out"
                );
                EnrichmentOutcome::Failed(EnrichmentError::Timeout(self.timeout))
            }
        }
    }
}
