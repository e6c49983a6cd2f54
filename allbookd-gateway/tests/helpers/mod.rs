//! Shared test helpers: mock upstreams, app construction, request utilities
#![allow(dead_code)]

use allbookd_common::config::GatewayConfig;
use allbookd_gateway::models::{CatalogVolume, RankedItem, VolumeQuery, VolumeSearchPage};
use allbookd_gateway::services::{CatalogSource, RankingSource, UpstreamError};
use allbookd_gateway::{build_router, AppState};
use async_trait::async_trait;
use axum::body::Body;
use axum::http::Request;
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

// =============================================================================
// Fixtures
// =============================================================================

/// Ranked item with an ISBN-13 (or none)
pub fn ranked(rank: u32, title: &str, isbn13: Option<&str>) -> RankedItem {
    let mut raw = json!({
        "rank": rank,
        "title": title,
        "author": "Test Author",
    });
    if let Some(isbn13) = isbn13 {
        raw["primary_isbn13"] = json!(isbn13);
    }
    ranked_raw(raw)
}

/// Ranked item from a literal upstream record
pub fn ranked_raw(raw: Value) -> RankedItem {
    serde_json::from_value(raw).expect("ranked item must be a JSON object")
}

pub fn volume(id: &str, title: &str) -> CatalogVolume {
    serde_json::from_value(json!({
        "id": id,
        "volumeInfo": { "title": title, "authors": ["Test Author"] }
    }))
    .expect("volume must be a JSON object")
}

// =============================================================================
// Mock ranking upstream
// =============================================================================

enum RankingBehavior {
    Items(Vec<RankedItem>),
    Fail(u16),
}

/// Ranking source scripted per category, counting calls
pub struct MockRanking {
    lists: Mutex<HashMap<String, RankingBehavior>>,
    calls: AtomicUsize,
    requested: Mutex<Vec<String>>,
    delay: Duration,
}

impl MockRanking {
    pub fn new() -> Self {
        Self::with_delay(Duration::ZERO)
    }

    /// Every fetch sleeps for `delay` before answering
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            lists: Mutex::new(HashMap::new()),
            calls: AtomicUsize::new(0),
            requested: Mutex::new(Vec::new()),
            delay,
        }
    }

    pub fn set_list(&self, category: &str, items: Vec<RankedItem>) {
        self.lists
            .lock()
            .unwrap()
            .insert(category.to_string(), RankingBehavior::Items(items));
    }

    pub fn set_failure(&self, category: &str, status: u16) {
        self.lists
            .lock()
            .unwrap()
            .insert(category.to_string(), RankingBehavior::Fail(status));
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requested_categories(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl RankingSource for MockRanking {
    async fn fetch_list(&self, category: &str) -> Result<Vec<RankedItem>, UpstreamError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requested.lock().unwrap().push(category.to_string());

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        match self.lists.lock().unwrap().get(category) {
            Some(RankingBehavior::Items(items)) => Ok(items.clone()),
            Some(RankingBehavior::Fail(status)) => Err(UpstreamError::Status {
                status: *status,
                reason: "Internal Server Error".to_string(),
            }),
            None => Err(UpstreamError::Status {
                status: 404,
                reason: "Not Found".to_string(),
            }),
        }
    }
}

// =============================================================================
// Mock catalog upstream
// =============================================================================

/// Catalog source with canned volumes, counting ISBN lookups
///
/// - ISBNs registered with [`MockCatalog::with_volume`] resolve
/// - ISBNs registered with [`MockCatalog::failing_isbn`] error
/// - anything else has no match
/// - volume id `"missing"` answers 404, search query `"boom"` fails at the
///   transport level
pub struct MockCatalog {
    api_key: bool,
    volumes: HashMap<String, CatalogVolume>,
    failing: HashSet<String>,
    lookups: AtomicUsize,
    last_search: Mutex<Option<VolumeQuery>>,
}

impl MockCatalog {
    pub fn new() -> Self {
        Self {
            api_key: true,
            volumes: HashMap::new(),
            failing: HashSet::new(),
            lookups: AtomicUsize::new(0),
            last_search: Mutex::new(None),
        }
    }

    pub fn without_api_key(mut self) -> Self {
        self.api_key = false;
        self
    }

    pub fn with_volume(mut self, isbn: &str, volume: CatalogVolume) -> Self {
        self.volumes.insert(isbn.to_string(), volume);
        self
    }

    pub fn failing_isbn(mut self, isbn: &str) -> Self {
        self.failing.insert(isbn.to_string());
        self
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    pub fn last_search(&self) -> Option<VolumeQuery> {
        self.last_search.lock().unwrap().clone()
    }
}

#[async_trait]
impl CatalogSource for MockCatalog {
    fn has_api_key(&self) -> bool {
        self.api_key
    }

    async fn lookup_isbn(&self, isbn: &str) -> Result<Option<CatalogVolume>, UpstreamError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);

        if self.failing.contains(isbn) {
            return Err(UpstreamError::Status {
                status: 500,
                reason: "Internal Server Error".to_string(),
            });
        }

        Ok(self.volumes.get(isbn).cloned())
    }

    async fn get_volume(&self, id: &str) -> Result<Value, UpstreamError> {
        if !self.api_key {
            return Err(UpstreamError::MissingApiKey);
        }

        if id == "missing" {
            return Err(UpstreamError::Status {
                status: 404,
                reason: "Not Found".to_string(),
            });
        }

        Ok(json!({
            "kind": "books#volume",
            "id": id,
            "volumeInfo": { "title": "Dune" }
        }))
    }

    async fn search_volumes(&self, query: &VolumeQuery) -> Result<VolumeSearchPage, UpstreamError> {
        if !self.api_key {
            return Err(UpstreamError::MissingApiKey);
        }

        *self.last_search.lock().unwrap() = Some(query.clone());

        if query.query == "boom" {
            return Err(UpstreamError::Network("connection reset".to_string()));
        }

        Ok(VolumeSearchPage {
            total_items: 2,
            items: vec![volume("v1", "Dune"), volume("v2", "Dune Messiah")],
        })
    }
}

// =============================================================================
// App + request helpers
// =============================================================================

pub fn test_config(cache_ttl: Duration) -> GatewayConfig {
    GatewayConfig {
        cache_ttl,
        enrichment_concurrency: 4,
        enrichment_timeout: Duration::from_secs(2),
        ..GatewayConfig::default()
    }
}

pub const DAY: Duration = Duration::from_secs(24 * 60 * 60);

/// Router over the given mocks with a 24h cache
pub fn test_app(ranking: Arc<MockRanking>, catalog: Arc<MockCatalog>) -> Router {
    test_app_with_ttl(ranking, catalog, DAY)
}

pub fn test_app_with_ttl(
    ranking: Arc<MockRanking>,
    catalog: Arc<MockCatalog>,
    cache_ttl: Duration,
) -> Router {
    build_router(test_state(ranking, catalog, cache_ttl))
}

/// State for tests that seed the cache before routing requests
pub fn test_state(
    ranking: Arc<MockRanking>,
    catalog: Arc<MockCatalog>,
    cache_ttl: Duration,
) -> AppState {
    AppState::new(ranking, catalog, &test_config(cache_ttl))
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub async fn body_bytes(body: Body) -> Vec<u8> {
    body.collect().await.unwrap().to_bytes().to_vec()
}

pub async fn body_json(body: Body) -> Value {
    serde_json::from_slice(&body_bytes(body).await).expect("response should be JSON")
}
