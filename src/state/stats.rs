use std::sync::atomic::{AtomicU64, Ordering};

/// Live crawl counters shared by the workers and the progress logger
#[derive(Debug, Default)]
pub struct CrawlStats {
    pages_processed: AtomicU64,
    page_errors: AtomicU64,
    links_skipped: AtomicU64,
    archive_errors: AtomicU64,
    admitted: AtomicU64,
    rejected_depth: AtomicU64,
    rejected_visited: AtomicU64,
}

/// Point-in-time copy of the counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub pages_processed: u64,
    pub page_errors: u64,
    pub links_skipped: u64,
    pub archive_errors: u64,
    pub admitted: u64,
    pub rejected_depth: u64,
    pub rejected_visited: u64,
}

macro_rules! counter {
    ($inc:ident, $field:ident) => {
        pub fn $inc(&self) {
            self.$field.fetch_add(1, Ordering::Relaxed);
        }
    };
}

impl CrawlStats {
    pub fn new() -> Self {
        Self::default()
    }

    counter!(page_processed, pages_processed);
    counter!(page_failed, page_errors);
    counter!(link_skipped, links_skipped);
    counter!(archive_failed, archive_errors);
    counter!(url_admitted, admitted);
    counter!(depth_rejected, rejected_depth);
    counter!(visited_rejected, rejected_visited);

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            pages_processed: self.pages_processed.load(Ordering::Relaxed),
            page_errors: self.page_errors.load(Ordering::Relaxed),
            links_skipped: self.links_skipped.load(Ordering::Relaxed),
            archive_errors: self.archive_errors.load(Ordering::Relaxed),
            admitted: self.admitted.load(Ordering::Relaxed),
            rejected_depth: self.rejected_depth.load(Ordering::Relaxed),
            rejected_visited: self.rejected_visited.load(Ordering::Relaxed),
        }
    }
}
