//! Crawl and metadata routes

use super::error::ApiError;
use super::state::AppState;
use crate::crawler::{scrape_metadata as analyze_url, traverse, CrawlReport, CrawlRequest};
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Debug, Deserialize)]
struct MetadataRequest {
    url: String,
}

async fn root() -> Json<Value> {
    Json(json!({ "message": "AudioBreak Scraper API" }))
}

async fn scrape(
    State(state): State<AppState>,
    Json(request): Json<CrawlRequest>,
) -> Result<Json<CrawlReport>, ApiError> {
    tracing::info!("Scrape request for {}", request.url);
    let report = traverse(&state.client, &request).await?;
    tracing::info!(
        "Scraped {} page(s) from {}: {} result(s), {} asset(s), {} error(s)",
        report.scraped_pages.len(),
        request.url,
        report.results.len(),
        report.media_assets.len(),
        report.errors.len()
    );
    Ok(Json(report))
}

/// A failed fetch is reported in the body, not as an HTTP error
async fn scrape_metadata(
    State(state): State<AppState>,
    Json(request): Json<MetadataRequest>,
) -> Response {
    match analyze_url(&state.client, &request.url).await {
        Ok(metadata) => Json(metadata).into_response(),
        Err(e) => {
            tracing::debug!("Metadata fetch failed for {}: {}", request.url, e);
            Json(json!({ "error": e.to_string() })).into_response()
        }
    }
}

pub fn make_scrape_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(root))
        .route("/scrape", post(scrape))
        .route("/scrape-metadata", post(scrape_metadata))
}
