//! URL joining helpers.

/// Appends a path segment to a URL, keeping its query string.
///
/// The path part (everything before the first `?`) ends up with exactly one
/// `/` before `segment`. Every `?`-separated chunk after it is re-attached
/// with a bare `?`, so an encoded `?` inside the original query comes back
/// literal.
///
/// # Example
///
/// ```
/// use oxide_inline_validation::join_url;
///
/// assert_eq!(join_url("https://x/y", "z"), "https://x/y/z");
/// assert_eq!(join_url("https://x/y?a=1", "z"), "https://x/y/z?a=1");
/// assert_eq!(join_url("https://x/y/", "z"), "https://x/y/z");
/// ```
pub fn join_url(base: &str, segment: &str) -> String {
    let mut chunks = base.split('?');
    let path = chunks.next().unwrap_or_default();

    let mut url = String::with_capacity(base.len() + segment.len() + 1);
    url.push_str(path.trim_end_matches('/'));
    url.push('/');
    url.push_str(segment);
    for chunk in chunks {
        url.push('?');
        url.push_str(chunk);
    }
    url
}

/// Appends an encoded query to a URL that may already carry one.
pub fn append_query(url: &str, query: &str) -> String {
    if query.is_empty() {
        return url.to_string();
    }
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{url}{separator}{query}")
}
