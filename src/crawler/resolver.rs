use crate::crawler::fetcher::{FetchError, PageFetcher};
use crate::url::canonicalize_url;
use std::sync::Arc;

/// Outcome of following a link's redirect chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Canonical URL the chain ended at
    pub final_url: String,

    /// Every URL traversed, requested URL first and `final_url` last
    pub hops: Vec<String>,

    /// Document served at `final_url`
    pub body: String,
}

impl Resolution {
    /// Number of redirects followed
    pub fn redirect_count(&self) -> usize {
        self.hops.len().saturating_sub(1)
    }
}

/// Resolves link targets to canonical URLs through the fetcher
///
/// Wiki redirect aliases collapse onto the article they point at; the hop
/// chain is kept so each hop can still be emitted as an edge.
#[derive(Clone)]
pub struct RedirectResolver {
    fetcher: Arc<dyn PageFetcher>,
}

impl RedirectResolver {
    pub fn new(fetcher: Arc<dyn PageFetcher>) -> Self {
        Self { fetcher }
    }

    pub async fn resolve(&self, url: &str) -> Result<Resolution, FetchError> {
        let page = self.fetcher.fetch_with_redirects(url).await?;

        let final_url = canonicalize_url(&page.final_url)
            .map_err(|e| FetchError::InvalidUrl {
                url: page.final_url.clone(),
                reason: e.to_string(),
            })?
            .to_string();

        let mut hops = page.hops;
        match hops.last() {
            Some(last) if *last == final_url => {}
            _ => hops.push(final_url.clone()),
        }

        Ok(Resolution {
            final_url,
            hops,
            body: page.body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::fetcher::FetchedPage;
    use async_trait::async_trait;

    struct StaticFetcher {
        final_url: String,
        hops: Vec<String>,
    }

    #[async_trait]
    impl PageFetcher for StaticFetcher {
        async fn fetch_with_redirects(&self, url: &str) -> Result<FetchedPage, FetchError> {
            if url.contains("broken") {
                return Err(FetchError::Status {
                    url: url.to_string(),
                    status: 500,
                });
            }
            Ok(FetchedPage {
                final_url: self.final_url.clone(),
                status: 200,
                body: "<p>page</p>".to_string(),
                hops: self.hops.clone(),
            })
        }
    }

    fn resolver(final_url: &str, hops: &[&str]) -> RedirectResolver {
        RedirectResolver::new(Arc::new(StaticFetcher {
            final_url: final_url.to_string(),
            hops: hops.iter().map(|h| h.to_string()).collect(),
        }))
    }

    #[tokio::test]
    async fn test_resolve_canonicalizes_final_url() {
        let r = resolver(
            "https://Example.org/w/Target#Top",
            &["https://example.org/w/Alias"],
        );
        let resolution = r.resolve("https://example.org/w/Alias").await.unwrap();

        assert_eq!(resolution.final_url, "https://example.org/w/Target");
        assert_eq!(
            resolution.hops,
            vec![
                "https://example.org/w/Alias".to_string(),
                "https://example.org/w/Target".to_string(),
            ]
        );
        assert_eq!(resolution.redirect_count(), 1);
        assert_eq!(resolution.body, "<p>page</p>");
    }

    #[tokio::test]
    async fn test_resolve_without_redirect() {
        let r = resolver("https://example.org/w/A", &["https://example.org/w/A"]);
        let resolution = r.resolve("https://example.org/w/A").await.unwrap();
        assert_eq!(resolution.redirect_count(), 0);
    }

    #[tokio::test]
    async fn test_resolve_propagates_failure() {
        let r = resolver("https://example.org/w/A", &[]);
        assert!(r.resolve("https://example.org/w/broken").await.is_err());
    }
}
