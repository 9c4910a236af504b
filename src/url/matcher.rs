use super::domain::same_host;
use url::Url;

/// Checks if a domain matches a wildcard pattern
///
/// This function supports two types of patterns:
/// 1. Exact match: "example.com" matches only "example.com"
/// 2. Wildcard match: "*.example.com" matches "example.com" and any subdomain
///
/// # Examples
///
/// ```
/// use page_ripple::url::matches_wildcard;
///
/// assert!(matches_wildcard("example.com", "example.com"));
/// assert!(matches_wildcard("*.example.com", "blog.example.com"));
/// assert!(!matches_wildcard("*.example.com", "example.org"));
/// ```
pub fn matches_wildcard(pattern: &str, candidate: &str) -> bool {
    if let Some(base) = pattern.strip_prefix("*.") {
        candidate == base || candidate.ends_with(&format!(".{}", base))
    } else {
        candidate == pattern
    }
}

/// Decides whether a link may be followed given the allowed-domain list
///
/// * Non-empty `allowed_domains`: the link's host must equal the host of at
///   least one entry. Entries without a scheme are read as `https://<entry>`;
///   entries of the form `*.example.com` match the base domain and every
///   subdomain.
/// * Empty `allowed_domains`: the link must stay on the host of `base`.
///
/// # Arguments
///
/// * `link` - The normalized candidate link
/// * `base` - The page the link was found on
/// * `allowed_domains` - Configured domain allow-list
pub fn is_allowed_domain(link: &Url, base: &Url, allowed_domains: &[String]) -> bool {
    if allowed_domains.is_empty() {
        return same_host(link, base);
    }

    allowed_domains
        .iter()
        .any(|entry| matches_allowed_entry(link, entry))
}

/// Matches one allow-list entry against a link
fn matches_allowed_entry(link: &Url, entry: &str) -> bool {
    let entry = entry.trim();
    if entry.is_empty() {
        return false;
    }

    if entry.starts_with("*.") {
        return link
            .host_str()
            .map(|host| matches_wildcard(&entry.to_lowercase(), host))
            .unwrap_or(false);
    }

    let entry_url = if entry.starts_with("http://") || entry.starts_with("https://") {
        entry.to_string()
    } else {
        format!("https://{}", entry)
    };

    Url::parse(&entry_url)
        .map(|entry_url| same_host(link, &entry_url))
        .unwrap_or(false)
}
