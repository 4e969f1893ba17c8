use url::Url;

/// Resolves a link href against a base URL and validates it
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
/// use url::Url;
/// use market_harvest::url::resolve_link;
///
/// let base = Url::parse("https://market.example.com/").unwrap();
/// assert_eq!(
///     resolve_link("/details?id=app", &base),
///     Some("https://market.example.com/details?id=app".to_string())
/// );
/// assert_eq!(resolve_link("mailto:dev@example.com", &base), None);
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
        Ok(absolute_url) => {
            if absolute_url.scheme() == "http" || absolute_url.scheme() == "https" {
                Some(absolute_url.to_string())
            } else {
                None
            }
        }
        Err(_) => None,
    }
}

/// Resolves a link against the base, yielding an empty string when it is unusable
///
/// Used for record fields, where a missing link is written as `""` rather than
/// dropping the field.
pub fn absolute_url(href: Option<&str>, base_url: &Url) -> String {
    href.and_then(|h| resolve_link(h, base_url))
        .unwrap_or_default()
}
