use std::collections::HashMap;
use url::Url;

/// Decodes the query string of a URL into a key/value map
///
/// Keys without a value map to an empty string. When a key is repeated the last
/// value wins. Unparseable URLs yield an empty map.
///
/// # Examples
///
/// ```
/// use market_harvest::url::query_vars;
///
/// let vars = query_vars("https://market.example.com/details?id=com.acme&hl=en");
/// assert_eq!(vars.get("id").map(String::as_str), Some("com.acme"));
/// ```
pub fn query_vars(url: &str) -> HashMap<String, String> {
    match Url::parse(url) {
        Ok(parsed) => parsed
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect(),
        Err(_) => HashMap::new(),
    }
}

/// Returns a single non-empty query parameter of a URL
pub fn query_param(url: &str, key: &str) -> Option<String> {
    query_vars(url).remove(key).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decodes_plus_and_percent() {
        let vars = query_vars("https://example.com/search?q=hello+world&pub=Acme%20Inc");
        assert_eq!(vars["q"], "hello world");
        assert_eq!(vars["pub"], "Acme Inc");
    }

    #[test]
    fn test_key_without_value() {
        let vars = query_vars("https://example.com/page?flag&id=1");
        assert_eq!(vars["flag"], "");
        assert_eq!(vars["id"], "1");
    }

    #[test]
    fn test_no_query() {
        assert!(query_vars("https://example.com/").is_empty());
        assert!(query_vars("not a url").is_empty());
    }

    #[test]
    fn test_query_param_ignores_empty() {
        assert_eq!(query_param("https://example.com/details?id=", "id"), None);
        assert_eq!(
            query_param("https://example.com/details?id=com.acme", "id"),
            Some("com.acme".to_string())
        );
    }
}
