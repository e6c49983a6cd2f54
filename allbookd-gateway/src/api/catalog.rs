//! Catalog proxy endpoints
//!
//! Thin pass-throughs to the catalog upstream that keep the API key on the
//! server. Both check for the key before anything else.

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::error;

use crate::error::{ApiError, ApiResult};
use crate::models::{CatalogVolume, VolumeQuery};
use crate::AppState;

/// Upper bound (and default) for `maxResults`
pub const MAX_SEARCH_RESULTS: u32 = 40;

/// Query parameters for GET /books
///
/// Paging values are kept as strings and parsed leniently so a malformed
/// number falls back to its default instead of rejecting the request.
#[derive(Debug, Deserialize)]
pub struct BookSearchQuery {
    pub q: Option<String>,
    #[serde(rename = "maxResults")]
    pub max_results: Option<String>,
    #[serde(rename = "startIndex")]
    pub start_index: Option<String>,
}

/// Search response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookSearchResponse {
    pub query: String,
    pub start_index: u32,
    pub max_results: u32,
    pub total_items: u64,
    pub items: Vec<CatalogVolume>,
}

/// GET /book/:id
///
/// Catalog volume record, passed through unchanged.
pub async fn get_book(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    if !state.catalog.has_api_key() {
        return Err(ApiError::ConfigurationMissing);
    }

    let volume = state.catalog.get_volume(&id).await.map_err(|e| {
        error!(volume_id = %id, error = %e, "Catalog volume fetch failed");
        ApiError::from_catalog(e, "Failed to fetch book")
    })?;

    Ok(Json(volume))
}

/// GET /books?q=<query>&maxResults=<1..=40>&startIndex=<n>
pub async fn search_books(
    State(state): State<AppState>,
    Query(params): Query<BookSearchQuery>,
) -> ApiResult<Json<BookSearchResponse>> {
    if !state.catalog.has_api_key() {
        return Err(ApiError::ConfigurationMissing);
    }

    let query = params.q.unwrap_or_default();
    if query.trim().is_empty() {
        return Err(ApiError::BadRequest("Query parameter is required".to_string()));
    }

    let volume_query = VolumeQuery {
        query,
        max_results: parse_max_results(params.max_results.as_deref()),
        start_index: parse_start_index(params.start_index.as_deref()),
    };

    let page = state
        .catalog
        .search_volumes(&volume_query)
        .await
        .map_err(|e| {
            error!(query = %volume_query.query, error = %e, "Catalog search failed");
            ApiError::from_catalog(e, "Failed to fetch books")
        })?;

    Ok(Json(BookSearchResponse {
        query: volume_query.query,
        start_index: volume_query.start_index,
        max_results: volume_query.max_results,
        total_items: page.total_items,
        items: page.items,
    }))
}

/// `maxResults`: default 40, clamped to 1..=40
pub fn parse_max_results(raw: Option<&str>) -> u32 {
    raw.and_then(|v| v.trim().parse::<i64>().ok())
        .map(|n| n.clamp(1, MAX_SEARCH_RESULTS as i64) as u32)
        .unwrap_or(MAX_SEARCH_RESULTS)
}

/// `startIndex`: default 0, negatives clamp to 0
pub fn parse_start_index(raw: Option<&str>) -> u32 {
    raw.and_then(|v| v.trim().parse::<i64>().ok())
        .map(|n| n.clamp(0, u32::MAX as i64) as u32)
        .unwrap_or(0)
}

/// Build catalog proxy routes
pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/book/:id", get(get_book))
        .route("/books", get(search_books))
}
