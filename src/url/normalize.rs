use crate::UrlError;
use url::Url;

/// Canonicalizes a URL for use as a graph node id and visited-set key
///
/// # Canonicalization Steps
///
/// 1. Parse the URL; reject if malformed
/// 2. Require an HTTP or HTTPS scheme
/// 3. Require a host (the `url` crate already lowercases it)
/// 4. Remove the fragment (everything after #)
///
/// Paths are left untouched: wiki titles are case- and slash-sensitive.
///
/// # Examples
///
/// ```
/// use wiki_cartographer::url::canonicalize_url;
///
/// let url = canonicalize_url("https://Wiki.Example.org/w/Page#History").unwrap();
/// assert_eq!(url.as_str(), "https://wiki.example.org/w/Page");
/// ```
pub fn canonicalize_url(url_str: &str) -> Result<Url, UrlError> {
    let url = Url::parse(url_str).map_err(|e| UrlError::Parse(e.to_string()))?;
    canonicalize(url)
}

/// Resolves an href against the page it was found on and canonicalizes it
pub fn resolve_href(base: &Url, href: &str) -> Result<Url, UrlError> {
    let url = base
        .join(href.trim())
        .map_err(|e| UrlError::Parse(e.to_string()))?;
    canonicalize(url)
}

fn canonicalize(mut url: Url) -> Result<Url, UrlError> {
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().is_none() {
        return Err(UrlError::MissingDomain);
    }

    url.set_fragment(None);
    Ok(url)
}
