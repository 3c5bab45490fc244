//! HTML helpers shared by the crawl and metadata endpoints
//!
//! This module handles:
//! - Compiling caller-supplied CSS selectors
//! - Extracting element text (optionally keyword filtered)
//! - Extracting the page title

use crate::SelectorError;
use scraper::{ElementRef, Html, Selector};

/// Compiles a CSS selector, mapping failures to [`SelectorError`]
pub fn compile_selector(selector: &str) -> Result<Selector, SelectorError> {
    Selector::parse(selector).map_err(|e| SelectorError {
        selector: selector.to_string(),
        message: format!("{:?}", e),
    })
}

/// Compiles one of the crate's built-in selectors
pub(crate) fn builtin_selector(selector: &str) -> Option<Selector> {
    Selector::parse(selector).ok()
}

/// Full text content of an element
pub fn element_text(element: &ElementRef<'_>) -> String {
    element.text().collect()
}

/// Extracts the text of every element matching `selector`
///
/// A keyword keeps only the elements whose text contains it,
/// case-insensitively. Attributes are never searched.
pub fn extract_text(document: &Html, selector: &Selector, keyword: Option<&str>) -> Vec<String> {
    let keyword = keyword.map(str::to_lowercase);

    document
        .select(selector)
        .map(|element| element_text(&element))
        .filter(|text| match &keyword {
            Some(keyword) => text.to_lowercase().contains(keyword.as_str()),
            None => true,
        })
        .collect()
}

/// Extracts the page title from the HTML document
pub fn extract_title(document: &Html) -> Option<String> {
    let title_selector = builtin_selector("title")?;

    document
        .select(&title_selector)
        .next()
        .map(|element| element_text(&element).trim().to_string())
        .filter(|s| !s.is_empty())
}
