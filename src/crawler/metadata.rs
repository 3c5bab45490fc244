//! Page metadata heuristics
//!
//! Best-effort hints used by a client to configure a crawl: likely
//! pagination selectors, links that look like further pages, the media
//! kinds present, likely main-content selectors and the page title.

use crate::crawler::fetcher::fetch_page;
use crate::crawler::media::{detect_media_kinds, MediaKind};
use crate::crawler::parser::{builtin_selector, extract_title};
use crate::url::dedup_preserving_order;
use crate::FetchError;
use regex::Regex;
use reqwest::Client;
use scraper::Html;
use serde::Serialize;
use std::sync::LazyLock;
use url::Url;

/// Selectors commonly used for "next page" links
const PAGINATION_CANDIDATES: &[&str] = &[
    "a.next",
    ".next",
    "a[rel=next]",
    "li.next a",
    "a[aria-label=Next]",
    "a[title=Next]",
    "a[rel=page]",
    "a.page-link",
];

/// Selectors commonly wrapping the main content of a page
const MAIN_CONTENT_CANDIDATES: &[&str] = &[
    "main", "#main", ".main", "#content", ".content", "article", ".article", "#primary",
];

const MAX_CANDIDATE_EXAMPLES: usize = 3;
const MAX_SIMILAR_LINKS: usize = 10;

static PAGE_LIKE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?i)(page|p=|[0-9]{1,3})").ok());

/// A pagination selector that matched at least one element
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaginationCandidate {
    pub selector: String,
    pub count: usize,
    pub examples: Vec<String>,
}

/// Heuristic metadata about a page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PageMetadata {
    pub pagination_candidates: Vec<PaginationCandidate>,
    pub pagination_similar_links: Vec<String>,
    pub media_types: Vec<MediaKind>,
    pub main_selectors: Vec<String>,
    pub title: Option<String>,
}

/// Fetches `url` and derives its metadata
pub async fn scrape_metadata(client: &Client, url: &str) -> Result<PageMetadata, FetchError> {
    let page = fetch_page(client, url).await?;
    Ok(analyze_page(&page.body, &page.final_url))
}

/// Derives metadata from an already fetched page
pub fn analyze_page(body: &str, page_url: &Url) -> PageMetadata {
    let document = Html::parse_document(body);

    PageMetadata {
        pagination_candidates: pagination_candidates(&document),
        pagination_similar_links: similar_links(&document, page_url),
        media_types: detect_media_kinds(&document),
        main_selectors: MAIN_CONTENT_CANDIDATES
            .iter()
            .filter(|candidate| {
                builtin_selector(candidate)
                    .map(|selector| document.select(&selector).next().is_some())
                    .unwrap_or(false)
            })
            .map(|candidate| candidate.to_string())
            .collect(),
        title: extract_title(&document),
    }
}

fn pagination_candidates(document: &Html) -> Vec<PaginationCandidate> {
    PAGINATION_CANDIDATES
        .iter()
        .filter_map(|candidate| {
            let selector = builtin_selector(candidate)?;
            let found: Vec<_> = document.select(&selector).collect();
            if found.is_empty() {
                return None;
            }

            Some(PaginationCandidate {
                selector: candidate.to_string(),
                count: found.len(),
                examples: found
                    .iter()
                    .take(MAX_CANDIDATE_EXAMPLES)
                    .filter_map(|element| element.value().attr("href"))
                    .map(str::to_string)
                    .collect(),
            })
        })
        .collect()
}

/// Same-host links under the page's path that look like page numbers
fn similar_links(document: &Html, page_url: &Url) -> Vec<String> {
    let (Some(pattern), Some(anchors)) = (PAGE_LIKE.as_ref(), builtin_selector("a[href]")) else {
        return Vec::new();
    };

    let base_host = page_url.host_str();
    let base_path = page_url.path().trim_end_matches('/');

    let candidates = document
        .select(&anchors)
        .filter_map(|element| element.value().attr("href"))
        .filter_map(|href| page_url.join(href).ok())
        .filter(|link| link.host_str() == base_host && link.path().starts_with(base_path))
        .map(|link| link.to_string())
        .filter(|link| pattern.is_match(link));

    let mut links = dedup_preserving_order(candidates);
    links.truncate(MAX_SIMILAR_LINKS);
    links
}
