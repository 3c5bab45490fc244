//! Crawler module for page fetching and extraction
//!
//! This module contains the crawl-side logic, including:
//! - HTTP fetching (one attempt per URL)
//! - Text, media and pagination extraction from parsed pages
//! - The breadth-first crawl traversal
//! - Metadata heuristics for configuring a crawl

mod fetcher;
mod media;
mod metadata;
mod pagination;
mod parser;
mod traversal;

pub use fetcher::{build_http_client, fetch_asset, fetch_page, FetchedPage};
pub use media::{detect_media_kinds, extract_media, MediaAsset, MediaKind};
pub use metadata::{analyze_page, scrape_metadata, PageMetadata, PaginationCandidate};
pub use pagination::{collect_links, resolve_pagination, PaginationLinks, PaginationMode};
pub use parser::{compile_selector, extract_text, extract_title};
pub use traversal::{traverse, CrawlReport, CrawlRequest, Traversal};
