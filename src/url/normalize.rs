use crate::UrlError;
use url::{ParseError, Url};

/// Normalizes a URL into the canonical string used as the crawl identity key
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed or missing a scheme
/// 2. Reject any scheme other than `http` and `https`
/// 3. Lowercase scheme and host (the parser already does this for http(s))
/// 4. Remove the fragment (everything after #)
/// 5. Remove trailing slashes, except for the root path `/`
///
/// Path case and the query string are preserved. Two URLs that differ only in
/// host case, trailing slash or fragment normalize to the same string, and
/// `normalize_url(normalize_url(x)) == normalize_url(x)`.
///
/// # Arguments
///
/// * `url_str` - The URL string to normalize
///
/// # Returns
///
/// * `Ok(String)` - Canonical URL string
/// * `Err(UrlError)` - The input is not an absolute http(s) URL
///
/// # Examples
///
/// ```
/// use page_ripple::url::normalize_url;
///
/// let url = normalize_url("https://Example.com/Page/").unwrap();
/// assert_eq!(url, "https://example.com/Page");
/// ```
pub fn normalize_url(url_str: &str) -> Result<String, UrlError> {
    normalize_to_url(url_str).map(String::from)
}

/// Same as [`normalize_url`] but keeps the parsed [`Url`]
pub fn normalize_to_url(url_str: &str) -> Result<Url, UrlError> {
    let mut url = parse_absolute(url_str)?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    url.set_fragment(None);

    let path = url.path();
    if path.len() > 1 && path.ends_with('/') {
        let trimmed = path.trim_end_matches('/');
        let trimmed = if trimmed.is_empty() {
            "/".to_string()
        } else {
            trimmed.to_string()
        };
        url.set_path(&trimmed);
    }

    Ok(url)
}

/// Checks whether a string is an absolute `http` or `https` URL
///
/// # Examples
///
/// ```
/// use page_ripple::url::is_valid_url;
///
/// assert!(is_valid_url("https://example.com/"));
/// assert!(!is_valid_url("mailto:someone@example.com"));
/// assert!(!is_valid_url("/relative/path"));
/// ```
pub fn is_valid_url(url_str: &str) -> bool {
    Url::parse(url_str)
        .map(|url| url.scheme() == "http" || url.scheme() == "https")
        .unwrap_or(false)
}

/// Resolves `relative` against `base` using standard reference resolution
///
/// Absolute references replace the base entirely; `/path` replaces the path;
/// `path` is resolved against the base's directory.
///
/// # Returns
///
/// * `Ok(String)` - The absolute URL
/// * `Err(UrlError)` - Either input could not be parsed
pub fn resolve_url(base: &str, relative: &str) -> Result<String, UrlError> {
    let base = parse_absolute(base)?;
    base.join(relative)
        .map(String::from)
        .map_err(|e| UrlError::Parse(format!("{}: {}", relative, e)))
}

/// Parses an absolute URL, distinguishing a missing scheme from other failures
pub(crate) fn parse_absolute(url_str: &str) -> Result<Url, UrlError> {
    Url::parse(url_str).map_err(|e| match e {
        ParseError::RelativeUrlWithoutBase => UrlError::MissingScheme(url_str.to_string()),
        other => UrlError::Parse(format!("{}: {}", url_str, other)),
    })
}
