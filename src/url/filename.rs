use url::Url;

/// Name used when an asset URL has no usable final path segment
pub const FALLBACK_FILE_NAME: &str = "file";

/// Derives an archive entry name from an asset URL
///
/// Takes the final path segment, percent-decodes it and neutralizes path
/// separators so the name is always a single flat entry. Falls back to
/// [`FALLBACK_FILE_NAME`] when the URL ends in a slash or has no path.
///
/// # Examples
///
/// ```
/// use audiobreak_scraper::url::file_name_for;
///
/// assert_eq!(file_name_for("https://example.com/media/song%20one.mp3"), "song one.mp3");
/// assert_eq!(file_name_for("https://example.com/media/"), "file");
/// ```
pub fn file_name_for(asset_url: &str) -> String {
    let segment = match Url::parse(asset_url) {
        Ok(url) => url
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .map(str::to_string)
            .unwrap_or_default(),
        Err(_) => asset_url
            .split(['?', '#'])
            .next()
            .and_then(|path| path.rsplit('/').next())
            .unwrap_or_default()
            .to_string(),
    };

    let decoded = urlencoding::decode(&segment)
        .map(|cow| cow.into_owned())
        .unwrap_or(segment);

    sanitize(&decoded)
}

fn sanitize(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | '\0' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let cleaned = cleaned.trim();

    if cleaned.is_empty() || cleaned == "." || cleaned == ".." {
        FALLBACK_FILE_NAME.to_string()
    } else {
        cleaned.to_string()
    }
}
