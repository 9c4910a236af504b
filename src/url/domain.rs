use url::Url;

/// Lower-cased host of a URL, without the port
///
/// `None` for URLs that have no host (`mailto:`, `data:`, ...).
///
/// ```
/// use url::Url;
/// use page_ripple::url::extract_domain;
///
/// let page = Url::parse("https://Docs.Example.COM:8443/guide").unwrap();
/// assert_eq!(extract_domain(&page).as_deref(), Some("docs.example.com"));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(str::to_lowercase)
}

/// Checks whether two URLs point at the same host
///
/// Hosts are compared byte-for-byte together with any explicit port, so
/// callers should normalize first. The scheme is ignored: `http://a.com` and
/// `https://a.com` are the same domain. Unparseable input is never the same
/// domain as anything.
///
/// # Examples
///
/// ```
/// use page_ripple::url::same_domain;
///
/// assert!(same_domain("https://example.com/a", "https://example.com/b"));
/// assert!(!same_domain("https://example.com", "https://other.com"));
/// ```
pub fn same_domain(a: &str, b: &str) -> bool {
    match (Url::parse(a), Url::parse(b)) {
        (Ok(a), Ok(b)) => same_host(&a, &b),
        _ => false,
    }
}

/// Parsed-URL form of [`same_domain`]
pub fn same_host(a: &Url, b: &Url) -> bool {
    match (a.host_str(), b.host_str()) {
        (Some(ha), Some(hb)) => ha == hb && a.port() == b.port(),
        _ => false,
    }
}
