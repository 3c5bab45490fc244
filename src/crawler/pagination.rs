//! Pagination link resolution
//!
//! Given a page and a pagination selector, works out which follow-up URLs
//! that page implies under the requested pagination mode.

use crate::url::resolve_link;
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use url::Url;

/// Strategy for discovering subsequent pages
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaginationMode {
    /// Each page carries one link to the next page
    #[default]
    #[serde(rename = "next")]
    SingleNextLink,

    /// A listing page carries links to every page
    #[serde(rename = "list")]
    ExplicitList,

    /// Any other mode name; no follow-up links are resolved
    #[serde(other)]
    Unrecognized,
}

/// Follow-up links found on one page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaginationLinks {
    /// Candidates for the crawl frontier, in discovery order
    pub next_links: Vec<String>,

    /// Links harvested for the listing (explicit-list mode only)
    pub list_links: Vec<String>,
}

/// Resolves the pagination links implied by a page
///
/// In single-next-link mode only the first element matching `selector` is
/// considered; if it has no href the page yields nothing. In explicit-list
/// mode every matching element with an href is both a list link and a
/// next-link candidate. Relative hrefs resolve against `page_url`.
pub fn resolve_pagination(
    document: &Html,
    selector: &Selector,
    mode: PaginationMode,
    page_url: &Url,
) -> PaginationLinks {
    match mode {
        PaginationMode::SingleNextLink => {
            let next_links = document
                .select(selector)
                .next()
                .and_then(|element| element.value().attr("href"))
                .and_then(|href| resolve_link(href, page_url))
                .into_iter()
                .collect();

            PaginationLinks {
                next_links,
                list_links: Vec::new(),
            }
        }
        PaginationMode::ExplicitList => {
            let links = collect_links(document, selector, page_url);
            PaginationLinks {
                next_links: links.clone(),
                list_links: links,
            }
        }
        PaginationMode::Unrecognized => PaginationLinks::default(),
    }
}

/// Every resolvable href on elements matching `selector`, in document order
pub fn collect_links(document: &Html, selector: &Selector, page_url: &Url) -> Vec<String> {
    document
        .select(selector)
        .filter_map(|element| element.value().attr("href"))
        .filter_map(|href| resolve_link(href, page_url))
        .collect()
}
