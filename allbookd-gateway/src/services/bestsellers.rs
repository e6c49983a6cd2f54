//! Bestseller aggregation pipeline
//!
//! cache lookup → ranking fetch → enrichment fan-out → positional merge →
//! cache write.
//!
//! Only a ranking failure fails the request. Items without an ISBN are
//! dropped from the output; items whose lookup failed or found nothing are
//! kept with `enrichment: null`. A failed refresh never touches the cache.
//!
//! Concurrent misses for one category join a single in-flight refresh and
//! all receive its result, failure included. The refresh leaves the
//! in-flight map when it completes, so the next miss starts a new one.

use super::{
    BestsellerCache, EnrichmentFanout, EnrichmentOutcome, RankingSource, UpstreamError,
};
use crate::models::{MergedResult, RankedItem};
use futures::future::{BoxFuture, FutureExt, Shared};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, error, info};

/// Request-level pipeline failure
#[derive(Debug, Error)]
pub enum BestsellerError {
    #[error("Failed to fetch bestseller list: {0}")]
    UpstreamUnavailable(#[source] Arc<UpstreamError>),
}

type RefreshResult = Result<Arc<Vec<MergedResult>>, Arc<UpstreamError>>;
type InFlightRefresh = Shared<BoxFuture<'static, RefreshResult>>;

/// Bestseller aggregation service, shared through `AppState`
pub struct BestsellerService {
    ranking: Arc<dyn RankingSource>,
    enrichment: Arc<EnrichmentFanout>,
    cache: Arc<BestsellerCache>,
    in_flight: Arc<Mutex<HashMap<String, InFlightRefresh>>>,
    default_category: String,
}

impl BestsellerService {
    pub fn new(
        ranking: Arc<dyn RankingSource>,
        enrichment: EnrichmentFanout,
        cache: BestsellerCache,
        default_category: impl Into<String>,
    ) -> Self {
        Self {
            ranking,
            enrichment: Arc::new(enrichment),
            cache: Arc::new(cache),
            in_flight: Arc::new(Mutex::new(HashMap::new())),
            default_category: default_category.into(),
        }
    }

    pub fn cache(&self) -> &BestsellerCache {
        &self.cache
    }

    /// Requested category, or the default when absent or blank
    pub fn resolve_category(&self, requested: Option<&str>) -> String {
        requested
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(self.default_category.as_str())
            .to_string()
    }

    /// Merged list for `category`, served from cache while fresh
    pub async fn get_bestsellers(
        &self,
        category: &str,
    ) -> Result<Arc<Vec<MergedResult>>, BestsellerError> {
        if let Some(entry) = self.cache.lookup(category).await {
            info!(category = %category, "Serving bestsellers from cache");
            return Ok(entry.payload);
        }

        let refresh = {
            let mut in_flight = self.in_flight.lock().await;
            match in_flight.get(category) {
                Some(running) => {
                    debug!(category = %category, "Joining in-flight refresh");
                    running.clone()
                }
                None => {
                    // A refresh stores before leaving the map, so this
                    // re-check cannot miss one that just finished
                    if let Some(entry) = self.cache.lookup(category).await {
                        return Ok(entry.payload);
                    }

                    let refresh = self.start_refresh(category);
                    in_flight.insert(category.to_string(), refresh.clone());
                    refresh
                }
            }
        };

        refresh.await.map_err(BestsellerError::UpstreamUnavailable)
    }

    fn start_refresh(&self, category: &str) -> InFlightRefresh {
        let ranking = Arc::clone(&self.ranking);
        let enrichment = Arc::clone(&self.enrichment);
        let cache = Arc::clone(&self.cache);
        let in_flight = Arc::clone(&self.in_flight);
        let category = category.to_string();

        async move {
            let result = refresh(ranking.as_ref(), &enrichment, &cache, &category).await;
            in_flight.lock().await.remove(&category);
            result
        }
        .boxed()
        .shared()
    }
}

async fn refresh(
    ranking: &dyn RankingSource,
    enrichment: &EnrichmentFanout,
    cache: &BestsellerCache,
    category: &str,
) -> RefreshResult {
    let items = ranking.fetch_list(category).await.map_err(|e| {
        error!(category = %category, error = %e, "Ranking API error");
        Arc::new(e)
    })?;

    let ranked = items.len();
    let outcomes = enrichment.enrich_all(&items).await;
    let merged = merge_results(items, outcomes);

    info!(
        category = %category,
        ranked,
        returned = merged.len(),
        "Bestseller list refreshed"
    );

    let entry = cache.store(category, merged).await;
    Ok(entry.payload)
}

/// Zip items with their outcomes, dropping items that had no lookup key
pub fn merge_results(items: Vec<RankedItem>, outcomes: Vec<EnrichmentOutcome>) -> Vec<MergedResult> {
    items
        .into_iter()
        .zip(outcomes)
        .filter(|(_, outcome)| outcome.has_lookup_key())
        .map(|(ranking, outcome)| MergedResult {
            ranking,
            enrichment: outcome.into_volume(),
        })
        .collect()
}
