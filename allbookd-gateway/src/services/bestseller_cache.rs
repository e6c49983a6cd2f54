//! In-memory bestseller cache, one snapshot per category
//!
//! Entries are replaced wholesale and only ever read through a freshness
//! check (`now - cached_at < ttl`). Nothing survives a restart.

use crate::models::MergedResult;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::debug;

/// Cached merged list for one category
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub category: String,
    pub payload: Arc<Vec<MergedResult>>,
    pub cached_at: DateTime<Utc>,
}

/// Process-wide cache service, shared through `AppState`
pub struct BestsellerCache {
    ttl: Duration,
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl BestsellerCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Fresh entry for `category`, or `None` if missing or expired
    pub async fn lookup(&self, category: &str) -> Option<CacheEntry> {
        self.lookup_at(category, Utc::now()).await
    }

    /// [`lookup`](Self::lookup) against an explicit clock reading
    pub async fn lookup_at(&self, category: &str, now: DateTime<Utc>) -> Option<CacheEntry> {
        let entries = self.entries.read().await;
        let entry = entries.get(category)?;

        if self.is_fresh(entry, now) {
            Some(entry.clone())
        } else {
            debug!(category = %category, cached_at = %entry.cached_at, "Cache entry expired");
            None
        }
    }

    /// Replace the entry for `category`
    pub async fn store(&self, category: &str, payload: Vec<MergedResult>) -> CacheEntry {
        self.store_at(category, payload, Utc::now()).await
    }

    /// [`store`](Self::store) with an explicit timestamp
    pub async fn store_at(
        &self,
        category: &str,
        payload: Vec<MergedResult>,
        cached_at: DateTime<Utc>,
    ) -> CacheEntry {
        let entry = CacheEntry {
            category: category.to_string(),
            payload: Arc::new(payload),
            cached_at,
        };

        self.entries
            .write()
            .await
            .insert(category.to_string(), entry.clone());

        entry
    }

    /// Number of categories holding an entry (fresh or stale)
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn is_fresh(&self, entry: &CacheEntry, now: DateTime<Utc>) -> bool {
        match (now - entry.cached_at).to_std() {
            Ok(elapsed) => elapsed < self.ttl,
            // Clock moved backwards since the entry was written
            Err(_) => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RankedItem;
    use chrono::Duration as ChronoDuration;
    use serde_json::json;

    const DAY: Duration = Duration::from_secs(24 * 60 * 60);

    fn payload(title: &str) -> Vec<MergedResult> {
        let ranking: RankedItem =
            serde_json::from_value(json!({ "rank": 1, "title": title })).unwrap();
        vec![MergedResult {
            ranking,
            enrichment: None,
        }]
    }

    #[tokio::test]
    async fn test_missing_category() {
        let cache = BestsellerCache::new(DAY);
        assert!(cache.lookup("hardcover-fiction").await.is_none());
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_fresh_entry_returned() {
        let cache = BestsellerCache::new(DAY);
        let t0 = Utc::now();
        cache.store_at("hardcover-fiction", payload("A"), t0).await;

        let hit = cache
            .lookup_at("hardcover-fiction", t0 + ChronoDuration::hours(23))
            .await
            .unwrap();
        assert_eq!(hit.payload[0].ranking.title(), Some("A"));
        assert_eq!(hit.category, "hardcover-fiction");
    }

    #[tokio::test]
    async fn test_entry_expires_at_ttl() {
        let cache = BestsellerCache::new(DAY);
        let t0 = Utc::now();
        cache.store_at("hardcover-fiction", payload("A"), t0).await;

        let just_before = t0 + ChronoDuration::hours(24) - ChronoDuration::milliseconds(1);
        assert!(cache.lookup_at("hardcover-fiction", just_before).await.is_some());
        assert!(cache
            .lookup_at("hardcover-fiction", t0 + ChronoDuration::hours(24))
            .await
            .is_none());
    }

    #[tokio::test]
    async fn test_store_overwrites() {
        let cache = BestsellerCache::new(DAY);
        cache.store("young-adult", payload("old")).await;
        cache.store("young-adult", payload("new")).await;

        let hit = cache.lookup("young-adult").await.unwrap();
        assert_eq!(hit.payload[0].ranking.title(), Some("new"));
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_categories_are_independent() {
        let cache = BestsellerCache::new(DAY);
        cache.store("a", payload("A")).await;

        assert!(cache.lookup("a").await.is_some());
        assert!(cache.lookup("b").await.is_none());
    }

    #[tokio::test]
    async fn test_zero_ttl_never_fresh() {
        let cache = BestsellerCache::new(Duration::ZERO);
        let t0 = Utc::now();
        cache.store_at("a", payload("A"), t0).await;
        assert!(cache.lookup_at("a", t0).await.is_none());
    }
}
