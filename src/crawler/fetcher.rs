//! HTTP fetcher implementation
//!
//! This module handles all outbound HTTP requests, including:
//! - Building the shared HTTP client with the configured user agent
//! - GET requests for pages visited by a crawl
//! - GET requests for assets downloaded by retrieval jobs
//! - Error classification
//!
//! Every URL gets exactly one attempt; there is no retry policy.

use crate::config::FetchConfig;
use crate::{FetchError, FetchResult};
use reqwest::Client;
use std::time::Duration;
use url::Url;

/// A successfully fetched page
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL after redirects
    pub final_url: Url,

    /// Page body content
    pub body: String,
}

/// Builds an HTTP client with proper configuration
///
/// Redirects are followed with reqwest's default policy. The client-wide
/// timeout is the page timeout; asset requests override it per request.
///
/// # Example
///
/// ```no_run
/// use audiobreak_scraper::config::FetchConfig;
/// use audiobreak_scraper::crawler::build_http_client;
///
/// let client = build_http_client(&FetchConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &FetchConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(config.page_timeout())
        .connect_timeout(config.connect_timeout())
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a page for the crawl
///
/// Non-2xx responses, timeouts and connection failures are all reported as
/// a [`FetchError`] for the caller to record.
pub async fn fetch_page(client: &Client, url: &str) -> FetchResult<FetchedPage> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(FetchError::from_reqwest)?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            status: status.as_u16(),
        });
    }

    let final_url = response.url().clone();
    let body = response
        .text()
        .await
        .map_err(|e| FetchError::Body(e.to_string()))?;

    Ok(FetchedPage { final_url, body })
}

/// Fetches an asset body with a bounded timeout
pub async fn fetch_asset(client: &Client, url: &str, timeout: Duration) -> FetchResult<Vec<u8>> {
    let response = client
        .get(url)
        .timeout(timeout)
        .send()
        .await
        .map_err(FetchError::from_reqwest)?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            status: status.as_u16(),
        });
    }

    let bytes = response.bytes().await.map_err(|e| {
        if e.is_timeout() {
            FetchError::Timeout
        } else {
            FetchError::Body(e.to_string())
        }
    })?;

    Ok(bytes.to_vec())
}
