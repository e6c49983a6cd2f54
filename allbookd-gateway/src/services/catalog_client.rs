//! Catalog (book volume) API client
//!
//! - ISBN lookup: `GET <base>/volumes?q=isbn:<isbn>&key=<key>`
//! - Volume by id: `GET <base>/volumes/<id>?key=<key>`
//! - Search: `GET <base>/volumes?q=<q>&key=<key>&maxResults=<n>&startIndex=<n>`

use super::{CatalogSource, UpstreamError};
use crate::models::{CatalogVolume, VolumeQuery, VolumeSearchPage};
use async_trait::async_trait;
use reqwest::Url;
use std::time::Duration;
use tracing::debug;

const USER_AGENT: &str = concat!("AllBookd/", env!("CARGO_PKG_VERSION"));

/// Catalog API client
pub struct CatalogClient {
    http_client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl CatalogClient {
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

    fn require_key(&self) -> Result<&str, UpstreamError> {
        self.api_key.as_deref().ok_or(UpstreamError::MissingApiKey)
    }

    /// `<base>/volumes[/<id>]`
    fn volumes_url(&self, id: Option<&str>) -> Result<Url, UpstreamError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| UpstreamError::InvalidUrl(format!("{}: {}", self.base_url, e)))?;

        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| UpstreamError::InvalidUrl(self.base_url.clone()))?;
            segments.pop_if_empty().push("volumes");
            if let Some(id) = id {
                segments.push(id);
            }
        }

        Ok(url)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: Url) -> Result<T, UpstreamError> {
        let response = self
            .http_client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| UpstreamError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            debug!(status = %status, body = %body, "Catalog API error response");
            return Err(UpstreamError::from_status(status));
        }

        response
            .json()
            .await
            .map_err(|e| UpstreamError::Parse(e.to_string()))
    }
}

#[async_trait]
impl CatalogSource for CatalogClient {
    fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    async fn lookup_isbn(&self, isbn: &str) -> Result<Option<CatalogVolume>, UpstreamError> {
        let mut url = self.volumes_url(None)?;
        url.query_pairs_mut()
            .append_pair("q", &format!("isbn:{}", isbn))
            .append_pair("key", self.api_key.as_deref().unwrap_or(""));

        debug!(isbn = %isbn, "Querying catalog by ISBN");

        let page: VolumeSearchPage = self.get_json(url).await?;
        Ok(page.items.into_iter().next())
    }

    async fn get_volume(&self, id: &str) -> Result<serde_json::Value, UpstreamError> {
        let key = self.require_key()?;
        let mut url = self.volumes_url(Some(id))?;
        url.query_pairs_mut().append_pair("key", key);

        debug!(volume_id = %id, "Fetching catalog volume");

        self.get_json(url).await
    }

    async fn search_volumes(&self, query: &VolumeQuery) -> Result<VolumeSearchPage, UpstreamError> {
        let key = self.require_key()?;
        let mut url = self.volumes_url(None)?;
        url.query_pairs_mut()
            .append_pair("q", &query.query)
            .append_pair("key", key)
            .append_pair("maxResults", &query.max_results.to_string())
            .append_pair("startIndex", &query.start_index.to_string());

        debug!(
            query = %query.query,
            max_results = query.max_results,
            start_index = query.start_index,
            "Searching catalog"
        );

        self.get_json(url).await
    }
}
