//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with the configured user agent and timeout
//! - GET requests with manual redirect following
//! - Hop chain capture (requested URL first, final URL last)
//! - Redirect loop and chain length detection
//! - Error classification

use crate::config::{Config, UserAgentConfig};
use crate::url::canonicalize_url;
use async_trait::async_trait;
use reqwest::{header::LOCATION, redirect::Policy, Client};
use std::collections::HashSet;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Errors raised while fetching a page or resolving a link
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} timed out")]
    Timeout { url: String },

    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("redirect loop detected at {url}")]
    RedirectLoop { url: String },

    #[error("more than {max} redirects starting from {url}")]
    TooManyRedirects { url: String, max: usize },

    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
}

/// A successfully fetched document
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Canonical URL the redirect chain ended at
    pub final_url: String,

    /// HTTP status of the final response
    pub status: u16,

    /// Raw document body
    pub body: String,

    /// Every URL traversed, requested URL first and `final_url` last
    pub hops: Vec<String>,
}

impl FetchedPage {
    /// Returns true if at least one redirect was followed
    pub fn was_redirected(&self) -> bool {
        self.hops.len() > 1
    }
}

/// Fetches a URL, following redirects and recording each hop
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch_with_redirects(&self, url: &str) -> Result<FetchedPage, FetchError>;
}

/// Builds an HTTP client with proper configuration
///
/// Redirects are disabled on the client so every hop can be observed.
///
/// # Arguments
///
/// * `config` - The user agent configuration
/// * `timeout` - Total timeout applied to each request
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
/// use wiki_cartographer::config::UserAgentConfig;
/// use wiki_cartographer::crawler::build_http_client;
///
/// let config = UserAgentConfig {
///     crawler_name: "WikiCartographer".to_string(),
///     crawler_version: "1.0".to_string(),
///     contact_url: "https://example.com/about".to_string(),
/// };
///
/// let client = build_http_client(&config, Duration::from_secs(30)).unwrap();
/// ```
pub fn build_http_client(
    config: &UserAgentConfig,
    timeout: Duration,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10).min(timeout))
        .redirect(Policy::none()) // Handle redirects manually
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetcher backed by a reqwest client
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    max_redirects: usize,
}

impl HttpFetcher {
    pub fn new(client: Client, max_redirects: usize) -> Self {
        Self {
            client,
            max_redirects,
        }
    }

    /// Builds a fetcher from the crawler and user agent settings
    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        let timeout = Duration::from_secs(config.crawler.request_timeout);
        let client = build_http_client(&config.user_agent, timeout)?;
        Ok(Self::new(client, config.crawler.max_redirects as usize))
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    /// Fetches a URL with manual redirect handling
    ///
    /// # Request Flow
    ///
    /// 1. Canonicalize the requested URL and record it as the first hop
    /// 2. Send GET; on 3xx join the `Location` header onto the current URL
    /// 3. Stop with an error on a revisited hop or once `max_redirects` is exceeded
    /// 4. A non-success final status is an error
    async fn fetch_with_redirects(&self, url: &str) -> Result<FetchedPage, FetchError> {
        let mut current = canonicalize_url(url).map_err(|e| FetchError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        let mut hops: Vec<String> = Vec::new();
        let mut seen = HashSet::new();

        loop {
            if !seen.insert(current.to_string()) {
                return Err(FetchError::RedirectLoop {
                    url: current.to_string(),
                });
            }
            hops.push(current.to_string());

            let response = self
                .client
                .get(current.clone())
                .send()
                .await
                .map_err(|e| classify_error(current.as_str(), e))?;
            let status = response.status();

            if status.is_redirection() {
                if hops.len() > self.max_redirects {
                    return Err(FetchError::TooManyRedirects {
                        url: url.to_string(),
                        max: self.max_redirects,
                    });
                }

                let location = response
                    .headers()
                    .get(LOCATION)
                    .and_then(|v| v.to_str().ok())
                    .map(|v| v.trim().to_string())
                    .unwrap_or_default();
                if location.is_empty() {
                    return Err(FetchError::Status {
                        url: current.to_string(),
                        status: status.as_u16(),
                    });
                }

                current = next_hop(&current, &location)?;
                continue;
            }

            if !status.is_success() {
                return Err(FetchError::Status {
                    url: current.to_string(),
                    status: status.as_u16(),
                });
            }

            let body = response
                .text()
                .await
                .map_err(|e| classify_error(current.as_str(), e))?;

            return Ok(FetchedPage {
                final_url: current.to_string(),
                status: status.as_u16(),
                body,
                hops,
            });
        }
    }
}

/// Resolves a `Location` header against the URL that returned it
fn next_hop(current: &Url, location: &str) -> Result<Url, FetchError> {
    let joined = current.join(location).map_err(|e| FetchError::InvalidUrl {
        url: location.to_string(),
        reason: e.to_string(),
    })?;
    canonicalize_url(joined.as_str()).map_err(|e| FetchError::InvalidUrl {
        url: joined.to_string(),
        reason: e.to_string(),
    })
}

fn classify_error(url: &str, error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else {
        FetchError::Http {
            url: url.to_string(),
            source: error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn create_test_config() -> UserAgentConfig {
        UserAgentConfig {
            crawler_name: "TestCrawler".to_string(),
            crawler_version: "1.0".to_string(),
            contact_url: "https://example.com/about".to_string(),
        }
    }

    fn fetcher(max_redirects: usize) -> HttpFetcher {
        let client = build_http_client(&create_test_config(), Duration::from_secs(5)).unwrap();
        HttpFetcher::new(client, max_redirects)
    }

    fn redirect_to(location: &str) -> ResponseTemplate {
        ResponseTemplate::new(301).insert_header("Location", location)
    }

    #[test]
    fn test_build_http_client() {
        let client = build_http_client(&create_test_config(), Duration::from_secs(30));
        assert!(client.is_ok());
    }

    #[tokio::test]
    async fn test_fetch_without_redirect() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/w/A"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>A</html>"))
            .mount(&server)
            .await;

        let url = format!("{}/w/A", server.uri());
        let page = fetcher(10).fetch_with_redirects(&url).await.unwrap();

        assert_eq!(page.final_url, url);
        assert_eq!(page.hops, vec![url.clone()]);
        assert_eq!(page.body, "<html>A</html>");
        assert!(!page.was_redirected());
    }

    #[tokio::test]
    async fn test_fetch_records_redirect_hops() {
        let server = MockServer::start().await;
        Mock::given(path("/w/Alias"))
            .respond_with(redirect_to("/w/Middle"))
            .mount(&server)
            .await;
        Mock::given(path("/w/Middle"))
            .respond_with(redirect_to("/w/Target#Section"))
            .mount(&server)
            .await;
        Mock::given(path("/w/Target"))
            .respond_with(ResponseTemplate::new(200).set_body_string("target"))
            .mount(&server)
            .await;

        let base = server.uri();
        let page = fetcher(10)
            .fetch_with_redirects(&format!("{}/w/Alias", base))
            .await
            .unwrap();

        assert_eq!(page.final_url, format!("{}/w/Target", base));
        assert_eq!(
            page.hops,
            vec![
                format!("{}/w/Alias", base),
                format!("{}/w/Middle", base),
                format!("{}/w/Target", base),
            ]
        );
    }

    #[tokio::test]
    async fn test_self_redirect_is_a_loop() {
        let server = MockServer::start().await;
        Mock::given(path("/w/Loop"))
            .respond_with(redirect_to("/w/Loop"))
            .mount(&server)
            .await;

        let result = fetcher(10)
            .fetch_with_redirects(&format!("{}/w/Loop", server.uri()))
            .await;

        assert!(matches!(result, Err(FetchError::RedirectLoop { .. })));
    }

    #[tokio::test]
    async fn test_too_many_redirects() {
        let server = MockServer::start().await;
        for i in 0..5 {
            Mock::given(path(format!("/w/R{}", i)))
                .respond_with(redirect_to(&format!("/w/R{}", i + 1)))
                .mount(&server)
                .await;
        }

        let result = fetcher(2)
            .fetch_with_redirects(&format!("{}/w/R0", server.uri()))
            .await;

        assert!(matches!(
            result,
            Err(FetchError::TooManyRedirects { max: 2, .. })
        ));
    }

    #[tokio::test]
    async fn test_error_status() {
        let server = MockServer::start().await;
        Mock::given(path("/w/Missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let result = fetcher(10)
            .fetch_with_redirects(&format!("{}/w/Missing", server.uri()))
            .await;

        assert!(matches!(result, Err(FetchError::Status { status: 404, .. })));
    }

    #[tokio::test]
    async fn test_invalid_url() {
        let result = fetcher(10).fetch_with_redirects("not a url").await;
        assert!(matches!(result, Err(FetchError::InvalidUrl { .. })));
    }
}
