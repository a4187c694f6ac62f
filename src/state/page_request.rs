/// A unit of crawl work: one canonical URL to fetch and process
///
/// Created by the frontier when a URL is admitted and consumed exactly once by
/// the page processor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    /// Canonical URL of the page (also its node id)
    pub url: String,

    /// Distance from the nearest seed that reached it first; seeds are 0
    pub depth: u32,

    /// Redirect hops that led to `url`, first hop to final URL.
    /// Empty or single-entry chains carry no redirect edges.
    pub redirect_chain: Vec<String>,

    /// Document fetched while resolving the link, processed without a refetch
    pub body: Option<String>,
}

impl PageRequest {
    /// Creates a request with no redirect history
    pub fn new(url: impl Into<String>, depth: u32) -> Self {
        Self {
            url: url.into(),
            depth,
            redirect_chain: Vec::new(),
            body: None,
        }
    }

    /// Attaches the redirect chain that resolved to this URL
    pub fn with_redirect_chain(mut self, chain: Vec<String>) -> Self {
        self.redirect_chain = chain;
        self
    }

    /// Attaches the document already fetched for this URL
    pub fn with_body(mut self, body: String) -> Self {
        self.body = Some(body);
        self
    }

    /// Returns the consecutive (from, to) pairs of the redirect chain
    pub fn redirect_hops(&self) -> impl Iterator<Item = (&str, &str)> {
        self.redirect_chain
            .windows(2)
            .map(|pair| (pair[0].as_str(), pair[1].as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_hops_without_chain() {
        let req = PageRequest::new("https://example.org/w/A", 0);
        assert_eq!(req.redirect_hops().count(), 0);

        let req = req.with_redirect_chain(vec!["https://example.org/w/A".to_string()]);
        assert_eq!(req.redirect_hops().count(), 0);
    }

    #[test]
    fn test_body_attached() {
        let req = PageRequest::new("https://example.org/w/A", 0);
        assert!(req.body.is_none());

        let req = req.with_body("<html></html>".to_string());
        assert_eq!(req.body.as_deref(), Some("<html></html>"));
    }

    #[test]
    fn test_hops_in_chain_order() {
        let req = PageRequest::new("https://example.org/w/C", 1).with_redirect_chain(vec![
            "https://example.org/w/A".to_string(),
            "https://example.org/w/B".to_string(),
            "https://example.org/w/C".to_string(),
        ]);

        let hops: Vec<_> = req.redirect_hops().collect();
        assert_eq!(
            hops,
            vec![
                ("https://example.org/w/A", "https://example.org/w/B"),
                ("https://example.org/w/B", "https://example.org/w/C"),
            ]
        );
    }
}
