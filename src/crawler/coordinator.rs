//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the main crawl loop that coordinates all aspects of
//! the crawling process, including:
//! - Shuffling, resolving and admitting seeds
//! - Running a pool of workers that drain the frontier
//! - Emitting each page's records and admitting its discoveries
//! - Periodic progress logging
//! - Cancellation and the final report

use crate::archive::Archiver;
use crate::config::Config;
use crate::crawler::fetcher::PageFetcher;
use crate::crawler::frontier::{Admission, Frontier};
use crate::crawler::parser::{ExtractError, ScraperExtractor};
use crate::crawler::processor::{PageProcessor, PageRecords};
use crate::crawler::resolver::RedirectResolver;
use crate::output::GraphEmitter;
use crate::state::{CrawlStats, PageRequest};
use crate::url::{canonicalize_url, LinkClassifier};
use crate::{ConfigError, CrawlError};
use rand::seq::SliceRandom;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Summary of a finished (or cancelled) crawl
#[derive(Debug, Clone, Default)]
pub struct CrawlReport {
    pub pages_processed: u64,
    pub page_errors: u64,
    pub nodes: u64,
    pub edges: u64,
    pub first_edges: u64,
    pub links_skipped: u64,
    pub archive_errors: u64,
    pub sink_errors: u64,
    pub urls_admitted: u64,
    pub cancelled: bool,
    pub elapsed: Duration,
}

/// Main crawler coordinator structure
pub struct Coordinator {
    depth_limit: u32,
    concurrency: usize,
    shuffle_seeds: bool,
    stats_interval: Duration,
    resolver: RedirectResolver,
    classifier: LinkClassifier,
    processor: Arc<PageProcessor>,
    emitter: Arc<GraphEmitter>,
    stats: Arc<CrawlStats>,
    cancel: CancellationToken,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// # Arguments
    ///
    /// * `config` - The crawler configuration
    /// * `fetcher` - Fetcher used for pages and link resolution
    /// * `archivers` - Best-effort archivers handed every fetched page
    /// * `emitter` - Destination for graph records
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Successfully created coordinator
    /// * `Err(CrawlError)` - A configured title selector is invalid
    pub fn new(
        config: &Config,
        fetcher: Arc<dyn PageFetcher>,
        archivers: Vec<Arc<dyn Archiver>>,
        emitter: Arc<GraphEmitter>,
    ) -> Result<Self, CrawlError> {
        let stats = Arc::new(CrawlStats::new());

        let extractor = ScraperExtractor::new(&config.wiki).map_err(|e| match e {
            ExtractError::InvalidSelector { selector, message } => {
                ConfigError::InvalidSelector { selector, message }
            }
        })?;

        let processor = PageProcessor::new(&config.wiki, fetcher.clone(), Arc::new(extractor))
            .with_archivers(archivers, Duration::from_secs(config.archive.timeout))
            .with_depth_limit(config.crawler.depth_limit)
            .with_stats(stats.clone());

        Ok(Self {
            depth_limit: config.crawler.depth_limit,
            concurrency: config.crawler.concurrency as usize,
            shuffle_seeds: config.crawler.shuffle_seeds,
            stats_interval: Duration::from_secs(config.crawler.log_stats_interval),
            resolver: RedirectResolver::new(fetcher),
            classifier: LinkClassifier::new(&config.wiki),
            processor: Arc::new(processor),
            emitter,
            stats,
            cancel: CancellationToken::new(),
        })
    }

    /// Token that stops the crawl when cancelled
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn stats(&self) -> Arc<CrawlStats> {
        self.stats.clone()
    }

    /// Runs the crawl until the frontier is exhausted or the crawl is cancelled
    ///
    /// Seeds are shuffled unless deterministic ordering is configured, then
    /// resolved through their redirects; a seed that fails to resolve is
    /// admitted as given. Seeds outside the allowed domains, or redirecting
    /// out of them, are skipped.
    pub async fn run(&self, mut seeds: Vec<String>) -> Result<CrawlReport, CrawlError> {
        let started = Instant::now();
        let frontier = Arc::new(Frontier::new(self.depth_limit));

        if self.shuffle_seeds {
            seeds.shuffle(&mut rand::thread_rng());
        }

        info!(
            "Starting crawl: {} seeds, depth limit {}, {} workers",
            seeds.len(),
            self.depth_limit,
            self.concurrency
        );

        let canceller = {
            let frontier = frontier.clone();
            let cancel = self.cancel.clone();
            tokio::spawn(async move {
                cancel.cancelled().await;
                info!("Crawl cancelled, finishing in-flight pages");
                frontier.close();
            })
        };

        for seed in &seeds {
            if self.cancel.is_cancelled() {
                break;
            }
            if let Some(request) = self.seed_request(seed).await {
                admit(&frontier, &self.stats, request, None);
            }
        }

        let logger = self.spawn_stats_logger(frontier.clone());

        let mut workers = JoinSet::new();
        for worker_id in 0..self.concurrency {
            let worker = Worker {
                id: worker_id,
                frontier: frontier.clone(),
                processor: self.processor.clone(),
                emitter: self.emitter.clone(),
                stats: self.stats.clone(),
            };
            workers.spawn(worker.run());
        }

        while let Some(result) = workers.join_next().await {
            if let Err(e) = result {
                error!("Worker task failed: {}", e);
            }
        }

        logger.abort();
        canceller.abort();
        self.emitter.flush();

        let snapshot = self.stats.snapshot();
        let report = CrawlReport {
            pages_processed: snapshot.pages_processed,
            page_errors: snapshot.page_errors,
            nodes: self.emitter.node_count(),
            edges: self.emitter.edge_count(),
            first_edges: self.emitter.first_edge_count(),
            links_skipped: snapshot.links_skipped,
            archive_errors: snapshot.archive_errors,
            sink_errors: self.emitter.sink_errors(),
            urls_admitted: snapshot.admitted,
            cancelled: self.cancel.is_cancelled(),
            elapsed: started.elapsed(),
        };

        info!(
            "Crawl {}: {} pages, {} nodes, {} edges, {} page errors in {:.1}s",
            if report.cancelled { "cancelled" } else { "finished" },
            report.pages_processed,
            report.nodes,
            report.edges,
            report.page_errors,
            report.elapsed.as_secs_f64()
        );
        debug!(
            "Admitted {} URLs; rejected {} beyond depth limit, {} already visited",
            snapshot.admitted, snapshot.rejected_depth, snapshot.rejected_visited
        );

        Ok(report)
    }

    /// Builds the depth-0 request for a seed, keeping the body fetched while resolving it
    async fn seed_request(&self, seed: &str) -> Option<PageRequest> {
        if !self.classifier.is_in_domain(seed) {
            warn!("Skipping seed {}: outside the allowed domains", seed);
            return None;
        }

        match self.resolver.resolve(seed).await {
            Ok(resolution) if !self.classifier.is_in_domain(&resolution.final_url) => {
                warn!(
                    "Skipping seed {}: redirects outside the allowed domains to {}",
                    seed, resolution.final_url
                );
                None
            }
            Ok(resolution) => Some(
                PageRequest::new(resolution.final_url, 0)
                    .with_redirect_chain(resolution.hops)
                    .with_body(resolution.body),
            ),
            Err(e) => {
                warn!("Could not resolve seed {}: {}; using it as given", seed, e);
                let url = canonicalize_url(seed)
                    .map(|u| u.to_string())
                    .unwrap_or_else(|_| seed.to_string());
                Some(PageRequest::new(url, 0))
            }
        }
    }

    fn spawn_stats_logger(&self, frontier: Arc<Frontier>) -> tokio::task::JoinHandle<()> {
        let stats = self.stats.clone();
        let emitter = self.emitter.clone();
        let period = self.stats_interval;

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.tick().await;
            let mut last_pages = 0;

            loop {
                ticker.tick().await;
                let snapshot = stats.snapshot();
                let rate = (snapshot.pages_processed - last_pages) as f64 * 60.0
                    / period.as_secs_f64();
                last_pages = snapshot.pages_processed;

                info!(
                    "Crawled {} pages (at {:.0} pages/min), emitted {} nodes; {} queued, {} in flight",
                    snapshot.pages_processed,
                    rate,
                    emitter.node_count(),
                    frontier.queued(),
                    frontier.in_flight()
                );
                emitter.flush();
            }
        })
    }
}

/// Admits a request and records the outcome in the crawl counters
fn admit(frontier: &Frontier, stats: &CrawlStats, request: PageRequest, source: Option<&str>) {
    match frontier.admit_request(request, source) {
        Admission::Admitted => stats.url_admitted(),
        Admission::TooDeep => stats.depth_rejected(),
        Admission::AlreadyVisited => stats.visited_rejected(),
        Admission::Closed => {}
    }
}

/// Marks the request finished even if processing panics
struct InFlight<'a>(&'a Frontier);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.task_done();
    }
}

struct Worker {
    id: usize,
    frontier: Arc<Frontier>,
    processor: Arc<PageProcessor>,
    emitter: Arc<GraphEmitter>,
    stats: Arc<CrawlStats>,
}

impl Worker {
    async fn run(self) {
        while let Some(req) = self.frontier.next().await {
            let _guard = InFlight(&self.frontier);
            debug!("Worker {} processing {} (depth {})", self.id, req.url, req.depth);

            match self.processor.process(&req).await {
                Ok(records) => {
                    self.stats.page_processed();
                    self.emit(&records);
                    self.admit_discoveries(&req, records);
                }
                Err(e) => {
                    self.stats.page_failed();
                    error!("Failed to process {}: {}", req.url, e);
                }
            }
        }
        debug!("Worker {} finished", self.id);
    }

    fn emit(&self, records: &PageRecords) {
        self.emitter.emit_node(&records.node);

        for record in &records.edges {
            if record.first {
                info!("{} ---> {}", record.edge.source, record.edge.target);
                self.emitter.emit_first_edge(&record.edge);
            } else {
                self.emitter.emit_edge(&record.edge);
            }
        }
    }

    fn admit_discoveries(&self, req: &PageRequest, records: PageRecords) {
        for discovery in records.discoveries {
            let request = PageRequest::new(discovery.url, req.depth + 1)
                .with_redirect_chain(discovery.hops)
                .with_body(discovery.body);
            admit(&self.frontier, &self.stats, request, Some(&req.url));
        }
    }
}
