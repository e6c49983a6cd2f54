//! Bestseller aggregation endpoint

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::models::MergedResult;
use crate::AppState;

/// Query parameters for GET /bestsellers
#[derive(Debug, Deserialize)]
pub struct BestsellerQuery {
    /// Ranking list slug, e.g. `hardcover-fiction`
    pub category: Option<String>,
}

/// Successful bestseller response
#[derive(Debug, Serialize)]
pub struct BestsellersResponse<'a> {
    pub results: &'a [MergedResult],
}

/// GET /bestsellers?category=<slug>
///
/// Ranked list merged with catalog metadata, in rank order. Served from the
/// per-category cache while fresh.
pub async fn get_bestsellers(
    State(state): State<AppState>,
    Query(query): Query<BestsellerQuery>,
) -> Response {
    let category = state.bestsellers.resolve_category(query.category.as_deref());

    match state.bestsellers.get_bestsellers(&category).await {
        Ok(results) => Json(BestsellersResponse { results: &results }).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Build bestseller routes
pub fn bestseller_routes() -> Router<AppState> {
    Router::new().route("/bestsellers", get(get_bestsellers))
}
