//! Media extraction
//!
//! Locates media references in a parsed document for the kinds a caller
//! asked for. Every emitted URL has its query component stripped.

use crate::crawler::parser::builtin_selector;
use crate::url::strip_query;
use scraper::{ElementRef, Html};
use serde::{Deserialize, Serialize};
use url::Url;

/// Kinds of media the extractor understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Img,
    Audio,
    Video,
    Pdf,
    Svg,
    /// Any kind name the extractor does not know; matches nothing
    #[serde(other)]
    Unsupported,
}

impl MediaKind {
    /// The supported kinds, in the order the metadata endpoint reports them
    pub const SUPPORTED: [MediaKind; 5] = [
        MediaKind::Img,
        MediaKind::Audio,
        MediaKind::Video,
        MediaKind::Pdf,
        MediaKind::Svg,
    ];
}

/// A media reference found on a page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaAsset {
    pub url: String,

    #[serde(rename = "type")]
    pub kind: MediaKind,
}

/// Extracts media references for each requested kind
///
/// Results are grouped by kind in the order of `kinds`, and in document
/// order within a kind.
///
/// | Kind | Elements |
/// |------|----------|
/// | img | every `img[src]` |
/// | audio | `audio[src]`, then `source[src]` whose parent is `audio` |
/// | video | `video[src]`, then `source[src]` whose parent is `video` |
/// | pdf | `a[href]` whose href ends in `.pdf` |
/// | svg | `img[src]` then `object[data]` ending in `.svg` |
pub fn extract_media(document: &Html, kinds: &[MediaKind], page_url: &Url) -> Vec<MediaAsset> {
    let mut assets = Vec::new();

    for &kind in kinds {
        let references = match kind {
            MediaKind::Img => attribute_values(document, "img", "src"),
            MediaKind::Audio => {
                let mut refs = attribute_values(document, "audio", "src");
                refs.extend(attribute_values(document, "audio > source", "src"));
                refs
            }
            MediaKind::Video => {
                let mut refs = attribute_values(document, "video", "src");
                refs.extend(attribute_values(document, "video > source", "src"));
                refs
            }
            MediaKind::Pdf => attribute_values(document, "a", "href")
                .into_iter()
                .filter(|href| has_extension(href, ".pdf"))
                .collect(),
            MediaKind::Svg => {
                let mut refs: Vec<String> = attribute_values(document, "img", "src")
                    .into_iter()
                    .filter(|src| has_extension(src, ".svg"))
                    .collect();
                refs.extend(
                    attribute_values(document, "object", "data")
                        .into_iter()
                        .filter(|data| has_extension(data, ".svg")),
                );
                refs
            }
            MediaKind::Unsupported => Vec::new(),
        };

        assets.extend(references.into_iter().map(|reference| MediaAsset {
            url: strip_query(&reference, page_url),
            kind,
        }));
    }

    assets
}

/// Reports which supported media kinds occur in a document at all
pub fn detect_media_kinds(document: &Html) -> Vec<MediaKind> {
    MediaKind::SUPPORTED
        .into_iter()
        .filter(|kind| match kind {
            MediaKind::Img => matches_any(document, "img"),
            MediaKind::Audio => {
                matches_any(document, "audio") || matches_any(document, "audio > source")
            }
            MediaKind::Video => {
                matches_any(document, "video") || matches_any(document, "video > source")
            }
            MediaKind::Pdf => attribute_values(document, "a", "href")
                .iter()
                .any(|href| has_extension(href, ".pdf")),
            MediaKind::Svg => {
                attribute_values(document, "img", "src")
                    .iter()
                    .any(|src| has_extension(src, ".svg"))
                    || attribute_values(document, "object", "data")
                        .iter()
                        .any(|data| has_extension(data, ".svg"))
            }
            MediaKind::Unsupported => false,
        })
        .collect()
}

/// Non-empty values of `attribute` on every element matching `selector`
fn attribute_values(document: &Html, selector: &str, attribute: &str) -> Vec<String> {
    let Some(selector) = builtin_selector(selector) else {
        return Vec::new();
    };

    document
        .select(&selector)
        .filter_map(|element: ElementRef<'_>| element.value().attr(attribute))
        .filter(|value| !value.trim().is_empty())
        .map(str::to_string)
        .collect()
}

fn matches_any(document: &Html, selector: &str) -> bool {
    builtin_selector(selector)
        .map(|selector| document.select(&selector).next().is_some())
        .unwrap_or(false)
}

fn has_extension(reference: &str, extension: &str) -> bool {
    reference.to_lowercase().ends_with(extension)
}
