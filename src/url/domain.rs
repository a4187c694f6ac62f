use url::Url;

/// Extracts the lowercase host of a URL, if it has one
///
/// # Examples
///
/// ```
/// use url::Url;
/// use wiki_cartographer::url::extract_domain;
///
/// let url = Url::parse("https://Wiki.Example.org/w/Page").unwrap();
/// assert_eq!(extract_domain(&url), Some("wiki.example.org".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Extracts the domain from a URL string, `None` when it does not parse
pub fn domain_of(url: &str) -> Option<String> {
    Url::parse(url).ok().as_ref().and_then(extract_domain)
}
