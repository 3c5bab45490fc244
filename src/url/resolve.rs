use std::collections::HashSet;
use url::Url;

/// Resolves a link href to an absolute URL against the page it was found on
///
/// Returns None if the link should be excluded:
/// - empty or fragment-only hrefs
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
///
/// # Examples
///
/// ```
/// use audiobreak_scraper::url::resolve_link;
/// use url::Url;
///
/// let page = Url::parse("https://example.com/list/page1").unwrap();
/// assert_eq!(
///     resolve_link("page2", &page).as_deref(),
///     Some("https://example.com/list/page2")
/// );
/// ```
pub fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lowered = href.to_ascii_lowercase();
    if lowered.starts_with("javascript:")
        || lowered.starts_with("mailto:")
        || lowered.starts_with("tel:")
        || lowered.starts_with("data:")
    {
        return None;
    }

    match base_url.join(href) {
        Ok(absolute_url) if matches!(absolute_url.scheme(), "http" | "https") => {
            Some(absolute_url.to_string())
        }
        _ => None,
    }
}

/// Removes the query component from a URL reference
///
/// The reference is resolved against `base_url` first when possible so
/// the result can be fetched later. A reference that cannot be resolved is
/// returned with everything from the first `?` up to any fragment cut.
///
/// # Examples
///
/// ```
/// use audiobreak_scraper::url::strip_query;
/// use url::Url;
///
/// let page = Url::parse("https://example.com/gallery/").unwrap();
/// assert_eq!(strip_query("x.png?v=2", &page), "https://example.com/gallery/x.png");
/// ```
pub fn strip_query(reference: &str, base_url: &Url) -> String {
    let reference = reference.trim();

    match base_url.join(reference) {
        Ok(mut url) => {
            url.set_query(None);
            url.to_string()
        }
        Err(_) => strip_query_raw(reference),
    }
}

fn strip_query_raw(reference: &str) -> String {
    let Some(query_start) = reference.find('?') else {
        return reference.to_string();
    };

    let mut stripped = reference[..query_start].to_string();
    if let Some(fragment_start) = reference[query_start..].find('#') {
        stripped.push_str(&reference[query_start + fragment_start..]);
    }
    stripped
}

/// Brings an absolute URL into the form resolved links take
///
/// Crawl seeds pass through here so they compare equal to the same page
/// discovered as a link. Unparseable input is returned trimmed.
pub fn normalize_url(raw: &str) -> String {
    let raw = raw.trim();
    match Url::parse(raw) {
        Ok(url) => url.to_string(),
        Err(_) => raw.to_string(),
    }
}

/// Deduplicates a list of URLs, keeping the first occurrence of each
pub fn dedup_preserving_order<I, S>(urls: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut seen = HashSet::new();
    urls.into_iter()
        .map(Into::into)
        .filter(|url| seen.insert(url.clone()))
        .collect()
}
