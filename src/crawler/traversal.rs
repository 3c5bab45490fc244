//! Crawl traversal - breadth-first walk over a page and its pagination
//!
//! This module contains the crawl loop that coordinates:
//! - Seeding the frontier (origin URL or caller-supplied page list)
//! - Harvesting the listing links matched by the pagination selector
//! - Fetching, text/media extraction and pagination resolution per page
//! - Deduplicating visited URLs
//!
//! A traversal runs sequentially inside the calling request: one page is
//! fetched and processed before the next is dequeued.

use crate::crawler::fetcher::fetch_page;
use crate::crawler::media::{extract_media, MediaAsset, MediaKind};
use crate::crawler::pagination::{collect_links, resolve_pagination, PaginationLinks, PaginationMode};
use crate::crawler::parser::{compile_selector, extract_text};
use crate::url::{dedup_preserving_order, normalize_url};
use crate::SelectorError;
use reqwest::Client;
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};
use url::Url;

/// Selector used for text extraction when the caller gives none
const DEFAULT_CONTENT_SELECTOR: &str = "p";

/// A crawl request, immutable for the duration of one traversal
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CrawlRequest {
    /// Origin URL of the crawl
    pub url: String,

    /// Keep only text elements containing this keyword (case-insensitive)
    #[serde(default)]
    pub keyword: Option<String>,

    /// CSS selector for text elements (paragraphs when absent)
    #[serde(default)]
    pub selector: Option<String>,

    /// Media kinds to extract from every visited page
    #[serde(default)]
    pub media_types: Option<Vec<MediaKind>>,

    /// Whether pagination links are followed
    #[serde(default)]
    pub follow_pagination: Option<bool>,

    /// CSS selector matching pagination links
    #[serde(default)]
    pub pagination_selector: Option<String>,

    /// Pagination strategy ("next" or "list")
    #[serde(default)]
    pub pagination_type: Option<PaginationMode>,

    /// Explicit list of pages to visit instead of the origin URL
    #[serde(default)]
    pub pagination_links: Option<Vec<String>>,
}

/// Everything a traversal accumulated
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CrawlReport {
    pub results: Vec<String>,
    pub media_assets: Vec<MediaAsset>,
    pub scraped_pages: Vec<String>,
    pub errors: Vec<String>,
    pub list_pagination_urls: Vec<String>,
}

/// A request with its selectors compiled and empty fields normalized away
struct CrawlPlan {
    origin: String,
    keyword: Option<String>,
    content_selector: Selector,
    media_kinds: Vec<MediaKind>,
    pagination: Option<(String, Selector)>,
    follow_pagination: bool,
    mode: PaginationMode,
    explicit_links: Option<Vec<String>>,
}

impl CrawlPlan {
    fn compile(request: &CrawlRequest) -> Result<Self, SelectorError> {
        let content_selector = match non_blank(request.selector.as_deref()) {
            Some(selector) => compile_selector(selector)?,
            None => compile_selector(DEFAULT_CONTENT_SELECTOR)?,
        };

        let pagination = match non_blank(request.pagination_selector.as_deref()) {
            Some(selector) => Some((selector.to_string(), compile_selector(selector)?)),
            None => None,
        };

        let explicit_links = request
            .pagination_links
            .as_ref()
            .filter(|links| !links.is_empty())
            .map(|links| dedup_preserving_order(links.iter().map(|link| normalize_url(link))));

        Ok(Self {
            origin: normalize_url(&request.url),
            keyword: request.keyword.clone().filter(|k| !k.is_empty()),
            content_selector,
            media_kinds: request.media_types.clone().unwrap_or_default(),
            pagination,
            follow_pagination: request.follow_pagination.unwrap_or(false),
            mode: request.pagination_type.unwrap_or_default(),
            explicit_links,
        })
    }

    /// Extracts everything a single fetched page contributes
    ///
    /// The parsed document never outlives this call.
    fn process(&self, body: &str, page_url: &Url) -> PageOutcome {
        let document = Html::parse_document(body);

        let results = extract_text(&document, &self.content_selector, self.keyword.as_deref());

        let media = if self.media_kinds.is_empty() {
            Vec::new()
        } else {
            extract_media(&document, &self.media_kinds, page_url)
        };

        let links = match (&self.pagination, self.follow_pagination) {
            (Some((_, selector)), true) => {
                resolve_pagination(&document, selector, self.mode, page_url)
            }
            _ => PaginationLinks::default(),
        };

        PageOutcome {
            results,
            media,
            links,
        }
    }
}

struct PageOutcome {
    results: Vec<String>,
    media: Vec<MediaAsset>,
    links: PaginationLinks,
}

/// An insertion-ordered set of URLs
#[derive(Debug, Default)]
struct OrderedUrlSet {
    order: Vec<String>,
    seen: HashSet<String>,
}

impl OrderedUrlSet {
    fn insert(&mut self, url: String) {
        if self.seen.insert(url.clone()) {
            self.order.push(url);
        }
    }

    fn into_vec(self) -> Vec<String> {
        self.order
    }
}

/// Mutable state of one traversal; dropped when it returns
#[derive(Debug, Default)]
struct CrawlState {
    frontier: VecDeque<String>,
    queued: HashSet<String>,
    visited: HashSet<String>,
    scraped_pages: Vec<String>,
    results: Vec<String>,
    media: Vec<MediaAsset>,
    errors: Vec<String>,
    list_pagination: OrderedUrlSet,
}

impl CrawlState {
    fn enqueue(&mut self, url: String) {
        if !self.visited.contains(&url) && self.queued.insert(url.clone()) {
            self.frontier.push_back(url);
        }
    }

    fn dequeue(&mut self) -> Option<String> {
        let url = self.frontier.pop_front()?;
        self.queued.remove(&url);
        Some(url)
    }

    fn into_report(self) -> CrawlReport {
        CrawlReport {
            results: self.results,
            media_assets: self.media,
            scraped_pages: self.scraped_pages,
            errors: self.errors,
            list_pagination_urls: self.list_pagination.into_vec(),
        }
    }
}

/// Drives one breadth-first traversal
pub struct Traversal<'a> {
    client: &'a Client,
    plan: CrawlPlan,
    state: CrawlState,
}

impl<'a> Traversal<'a> {
    /// Compiles the request and seeds the frontier
    ///
    /// With an explicit page list the frontier is that list, deduplicated,
    /// and the origin URL is not added. Otherwise it is the origin alone.
    pub fn new(client: &'a Client, request: &CrawlRequest) -> Result<Self, SelectorError> {
        let plan = CrawlPlan::compile(request)?;
        let mut state = CrawlState::default();

        match &plan.explicit_links {
            Some(links) => links.iter().cloned().for_each(|url| state.enqueue(url)),
            None => state.enqueue(plan.origin.clone()),
        }

        Ok(Self {
            client,
            plan,
            state,
        })
    }

    /// Runs the crawl loop until the frontier is empty
    pub async fn run(mut self) -> CrawlReport {
        tracing::info!(
            "Starting crawl of {} ({} page(s) queued)",
            self.plan.origin,
            self.state.frontier.len()
        );

        self.harvest_listing().await;

        while let Some(url) = self.state.dequeue() {
            if !self.state.visited.insert(url.clone()) {
                continue;
            }
            self.state.scraped_pages.push(url.clone());

            tracing::debug!("Processing URL: {}", url);
            self.visit(&url).await;
        }

        tracing::info!(
            "Crawl of {} completed: {} page(s), {} result(s), {} media, {} error(s)",
            self.plan.origin,
            self.state.scraped_pages.len(),
            self.state.results.len(),
            self.state.media.len(),
            self.state.errors.len()
        );

        self.state.into_report()
    }

    /// Fetches the origin once to collect every link the pagination selector matches
    ///
    /// Runs whenever a pagination selector is present, independent of the
    /// main loop and of the pagination mode.
    async fn harvest_listing(&mut self) {
        let Some((selector_text, selector)) = &self.plan.pagination else {
            return;
        };

        match fetch_page(self.client, &self.plan.origin).await {
            Ok(page) => {
                let links = {
                    let document = Html::parse_document(&page.body);
                    collect_links(&document, selector, &page.final_url)
                };

                if links.is_empty() {
                    tracing::warn!("No pagination links matched {}", selector_text);
                    self.state.errors.push(format!(
                        "No elements found matching pagination selector: {}",
                        selector_text
                    ));
                }
                for link in links {
                    self.state.list_pagination.insert(link);
                }
            }
            Err(e) => {
                tracing::warn!("Failed to fetch {} for pagination listing: {}", self.plan.origin, e);
                self.state.errors.push(format!(
                    "Error fetching or parsing initial page for pagination selector: {}",
                    e
                ));
            }
        }

        if self.plan.follow_pagination && self.plan.mode == PaginationMode::ExplicitList {
            self.state.list_pagination.insert(self.plan.origin.clone());
        }
    }

    /// Fetches and processes one page
    async fn visit(&mut self, url: &str) {
        let page = match fetch_page(self.client, url).await {
            Ok(page) => page,
            Err(e) => {
                tracing::debug!("Fetch failed for {}: {}", url, e);
                self.state.errors.push(format!("{}: {}", url, e));
                return;
            }
        };

        let outcome = self.plan.process(&page.body, &page.final_url);

        self.state.results.extend(outcome.results);
        self.state.media.extend(outcome.media);

        for link in outcome.links.list_links {
            self.state.list_pagination.insert(link);
        }

        // A caller-supplied page list fixes the frontier
        if self.plan.explicit_links.is_none() {
            for link in outcome.links.next_links {
                self.state.enqueue(link);
            }
        }
    }
}

/// Runs a complete traversal for one crawl request
///
/// Fetch failures are collected in the report's `errors`; only an invalid
/// selector in the request fails the call.
pub async fn traverse(client: &Client, request: &CrawlRequest) -> Result<CrawlReport, SelectorError> {
    Ok(Traversal::new(client, request)?.run().await)
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}
