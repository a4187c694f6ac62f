//! Page processor
//!
//! Turns one `PageRequest` into graph records:
//! - Fetch the page (unless resolution already did) and hand the body to
//!   every archiver
//! - One node for the requested URL
//! - Redirect-chain edges, then body edges in two tiers (primary content
//!   flow first, then every remaining in-content link)
//! - Discoveries for the coordinator to admit at the next depth, each
//!   carrying the document fetched while resolving it
//!
//! The processor never touches the frontier; it only returns what it found.

use crate::archive::Archiver;
use crate::config::WikiConfig;
use crate::crawler::fetcher::{FetchedPage, PageFetcher};
use crate::crawler::parser::PageExtractor;
use crate::crawler::resolver::RedirectResolver;
use crate::output::{Edge, Node};
use crate::state::{CrawlStats, PageRequest};
use crate::url::{resolve_href, LinkClassifier};
use crate::CrawlError;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// An edge together with its first-edge flag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeRecord {
    pub edge: Edge,
    pub first: bool,
}

/// A canonical link target found on a page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Discovery {
    /// Canonical URL to admit
    pub url: String,

    /// Redirect hops that led to `url`
    pub hops: Vec<String>,

    /// Document fetched while resolving, handed on so the page is not refetched
    pub body: String,
}

/// Everything one page contributes to the crawl
#[derive(Debug, Clone)]
pub struct PageRecords {
    pub node: Node,

    /// Chain edges first, then body edges, in emission order
    pub edges: Vec<EdgeRecord>,

    pub discoveries: Vec<Discovery>,
}

impl PageRecords {
    /// The first edge whose source is the page itself
    pub fn first_edge(&self) -> Option<&Edge> {
        self.edges
            .iter()
            .find(|r| r.first && r.edge.source == self.node.id)
            .map(|r| &r.edge)
    }

    /// Number of edges that came from links in the page body
    pub fn body_edge_count(&self) -> usize {
        self.edges
            .iter()
            .filter(|r| r.edge.source == self.node.id)
            .count()
    }
}

/// Per-page orchestration
pub struct PageProcessor {
    fetcher: Arc<dyn PageFetcher>,
    resolver: RedirectResolver,
    extractor: Arc<dyn PageExtractor>,
    classifier: LinkClassifier,
    primary_links: String,
    content_links: String,
    archivers: Vec<Arc<dyn Archiver>>,
    archive_timeout: Duration,
    depth_limit: u32,
    stats: Arc<CrawlStats>,
}

impl PageProcessor {
    /// Creates a processor that fetches pages and resolves links through `fetcher`
    pub fn new(
        config: &WikiConfig,
        fetcher: Arc<dyn PageFetcher>,
        extractor: Arc<dyn PageExtractor>,
    ) -> Self {
        Self {
            resolver: RedirectResolver::new(fetcher.clone()),
            fetcher,
            extractor,
            classifier: LinkClassifier::new(config),
            primary_links: config.primary_links.clone(),
            content_links: config.content_links.clone(),
            archivers: Vec::new(),
            archive_timeout: Duration::from_secs(30),
            depth_limit: u32::MAX,
            stats: Arc::new(CrawlStats::new()),
        }
    }

    pub fn with_archivers(mut self, archivers: Vec<Arc<dyn Archiver>>, timeout: Duration) -> Self {
        self.archivers = archivers;
        self.archive_timeout = timeout;
        self
    }

    /// Pages at this depth link to canonical hrefs without resolving them,
    /// since nothing they discover can be admitted
    pub fn with_depth_limit(mut self, depth_limit: u32) -> Self {
        self.depth_limit = depth_limit;
        self
    }

    pub fn with_stats(mut self, stats: Arc<CrawlStats>) -> Self {
        self.stats = stats;
        self
    }

    /// Processes one page
    ///
    /// # Returns
    ///
    /// * `Ok(PageRecords)` - Node, edges and discoveries for the page
    /// * `Err(CrawlError)` - The page itself could not be fetched or parsed;
    ///   it contributes no records
    pub async fn process(&self, req: &PageRequest) -> Result<PageRecords, CrawlError> {
        let fetched;
        let (final_url, body) = match &req.body {
            Some(body) => (req.url.as_str(), body.as_str()),
            None => {
                fetched = self.fetch_page(&req.url).await?;
                (fetched.final_url.as_str(), fetched.body.as_str())
            }
        };

        self.archive(&req.url, body).await;

        let title = self.extractor.extract_title(body);
        let node = Node::with_title(req.url.clone(), title);

        let mut edges: Vec<EdgeRecord> = req
            .redirect_hops()
            .enumerate()
            .map(|(i, (from, to))| EdgeRecord {
                edge: Edge::new(from, to),
                first: i == 0,
            })
            .collect();

        let base = Url::parse(final_url)?;
        let hrefs = self.followable_hrefs(&req.url, body)?;
        let at_limit = req.depth >= self.depth_limit;

        let mut discoveries = Vec::new();
        let mut has_first = false;

        for href in hrefs {
            let target = match resolve_href(&base, &href) {
                Ok(target) => target,
                Err(e) => {
                    debug!("Skipping unresolvable href '{}' on {}: {}", href, req.url, e);
                    self.stats.link_skipped();
                    continue;
                }
            };

            let target_url = if at_limit {
                target.to_string()
            } else {
                match self.resolve_link(&req.url, target.as_str()).await {
                    Some(discovery) => {
                        let url = discovery.url.clone();
                        discoveries.push(discovery);
                        url
                    }
                    None => continue,
                }
            };

            edges.push(EdgeRecord {
                edge: Edge::new(req.url.clone(), target_url),
                first: !has_first,
            });
            has_first = true;
        }

        if !has_first {
            warn!("No outlinks found on {}", req.url);
        }

        Ok(PageRecords {
            node,
            edges,
            discoveries,
        })
    }

    /// Fetches a page that was admitted without a body
    async fn fetch_page(&self, url: &str) -> Result<FetchedPage, CrawlError> {
        let page = self.fetcher.fetch_with_redirects(url).await?;

        if page.final_url != url {
            debug!(
                "{} now redirects to {}; links resolve against the final URL",
                url, page.final_url
            );
            if !self.classifier.is_in_domain(&page.final_url) {
                return Err(CrawlError::OffDomain {
                    url: url.to_string(),
                    final_url: page.final_url,
                });
            }
        }

        Ok(page)
    }

    /// Resolves one link target, returning `None` when it must be skipped
    async fn resolve_link(&self, page_url: &str, target: &str) -> Option<Discovery> {
        let resolution = match self.resolver.resolve(target).await {
            Ok(resolution) => resolution,
            Err(e) => {
                warn!("Skipping link {} on {}: {}", target, page_url, e);
                self.stats.link_skipped();
                return None;
            }
        };

        if !self.classifier.is_in_domain(&resolution.final_url) {
            warn!(
                "Skipping link {} on {}: redirects outside the wiki to {}",
                target, page_url, resolution.final_url
            );
            self.stats.link_skipped();
            return None;
        }

        Some(Discovery {
            url: resolution.final_url,
            hops: resolution.hops,
            body: resolution.body,
        })
    }

    /// Collects followable hrefs, primary tier first, each href once
    fn followable_hrefs(&self, url: &str, body: &str) -> Result<Vec<String>, CrawlError> {
        let extract = |selector: &str| {
            self.extractor
                .extract_links(body, selector)
                .map_err(|source| CrawlError::Extract {
                    url: url.to_string(),
                    source,
                })
        };

        let primary = extract(&self.primary_links)?;
        let content = extract(&self.content_links)?;

        let mut seen = HashSet::new();
        let hrefs = primary
            .into_iter()
            .chain(content)
            .filter(|href| self.classifier.is_followable(href))
            .filter(|href| seen.insert(href.clone()))
            .collect();

        Ok(hrefs)
    }

    async fn archive(&self, url: &str, body: &str) {
        for archiver in &self.archivers {
            match tokio::time::timeout(self.archive_timeout, archiver.archive(url, body)).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    self.stats.archive_failed();
                    warn!("{} archival of {} failed: {}", archiver.name(), url, e);
                }
                Err(_) => {
                    self.stats.archive_failed();
                    warn!(
                        "{} archival of {} timed out after {:?}",
                        archiver.name(),
                        url,
                        self.archive_timeout
                    );
                }
            }
        }
    }
}
