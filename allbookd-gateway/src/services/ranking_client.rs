//! Ranking (bestseller list) API client
//!
//! `GET <base>/lists/current/<category>.json?api-key=<key>`

use super::{RankingSource, UpstreamError};
use crate::models::RankedItem;
use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

const USER_AGENT: &str = concat!("AllBookd/", env!("CARGO_PKG_VERSION"));

/// Top-level ranking response; only `results.books` is required
#[derive(Debug, Deserialize)]
struct RankingEnvelope {
    results: Option<RankingList>,
}

#[derive(Debug, Deserialize)]
struct RankingList {
    #[serde(default)]
    list_name: Option<String>,
    books: Option<Vec<RankedItem>>,
}

/// Ranking API client
pub struct RankingClient {
    http_client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl RankingClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, UpstreamError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| UpstreamError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.into(),
            api_key,
        })
    }

    /// Build the list URL; the category is encoded as a single path segment
    fn list_url(&self, category: &str) -> Result<Url, UpstreamError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| UpstreamError::InvalidUrl(format!("{}: {}", self.base_url, e)))?;

        url.path_segments_mut()
            .map_err(|_| UpstreamError::InvalidUrl(self.base_url.clone()))?
            .pop_if_empty()
            .extend(["lists", "current", &format!("{}.json", category)]);

        url.query_pairs_mut()
            .append_pair("api-key", self.api_key.as_deref().unwrap_or(""));

        Ok(url)
    }
}

#[async_trait]
impl RankingSource for RankingClient {
    async fn fetch_list(&self, category: &str) -> Result<Vec<RankedItem>, UpstreamError> {
        let url = self.list_url(category)?;

        debug!(category = %category, "Querying ranking API");

        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| UpstreamError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::from_status(status));
        }

        let envelope: RankingEnvelope = response
            .json()
            .await
            .map_err(|e| UpstreamError::Parse(e.to_string()))?;

        let list = envelope
            .results
            .ok_or_else(|| UpstreamError::MalformedPayload("missing `results`".to_string()))?;
        let books = list
            .books
            .ok_or_else(|| UpstreamError::MalformedPayload("missing `results.books`".to_string()))?;

        info!(
            category = %category,
            list_name = %list.list_name.as_deref().unwrap_or("unknown"),
            count = books.len(),
            "Retrieved ranking list"
        );

        Ok(books)
    }
}
