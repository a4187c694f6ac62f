//! Crawl frontier and visited-set manager
//!
//! The frontier is the only state shared between workers. Admission, dequeue
//! and completion all go through one mutex so the visited check-and-set is
//! atomic and termination is detected exactly once: the queue is empty and
//! no request is in flight.

use crate::state::{PageRequest, VisitedSet};
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::Notify;
use tracing::{debug, trace};

/// Result of an admission attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Marked visited and queued
    Admitted,
    /// Beyond the depth limit; not marked visited
    TooDeep,
    /// Already admitted earlier in this run
    AlreadyVisited,
    /// The frontier was closed by cancellation
    Closed,
}

#[derive(Debug, Default)]
struct FrontierInner {
    visited: VisitedSet,
    queue: VecDeque<PageRequest>,
    in_flight: usize,
    closed: bool,
}

/// FIFO work queue with deduplication and depth limiting
#[derive(Debug)]
pub struct Frontier {
    max_depth: u32,
    inner: Mutex<FrontierInner>,
    notify: Notify,
}

impl Frontier {
    pub fn new(max_depth: u32) -> Self {
        Self {
            max_depth,
            inner: Mutex::new(FrontierInner::default()),
            notify: Notify::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, FrontierInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns true if `url` was admitted
    pub fn try_admit(
        &self,
        url: &str,
        depth: u32,
        source: Option<&str>,
        chain: Vec<String>,
    ) -> bool {
        self.admit(url, depth, source, chain) == Admission::Admitted
    }

    /// Atomically checks depth, marks `url` visited and enqueues it
    ///
    /// Depth is checked before the visited set, so a URL rejected as too deep
    /// can still be admitted later through a shorter path.
    pub fn admit(&self, url: &str, depth: u32, source: Option<&str>, chain: Vec<String>) -> Admission {
        self.admit_request(PageRequest::new(url, depth).with_redirect_chain(chain), source)
    }

    /// Admits a fully built request, keeping any prefetched body with it
    pub fn admit_request(&self, request: PageRequest, source: Option<&str>) -> Admission {
        let url = request.url.clone();
        let depth = request.depth;

        let admission = {
            let mut inner = self.lock();

            if inner.closed {
                Admission::Closed
            } else if depth > self.max_depth {
                Admission::TooDeep
            } else if !inner.visited.insert(&url) {
                Admission::AlreadyVisited
            } else {
                inner.queue.push_back(request);
                Admission::Admitted
            }
        };

        match admission {
            Admission::Admitted => {
                debug!(
                    "Admitted {} at depth {} (from {})",
                    url,
                    depth,
                    source.unwrap_or("seed")
                );
                self.notify.notify_waiters();
            }
            other => trace!("Rejected {} at depth {}: {:?}", url, depth, other),
        }

        admission
    }

    /// Takes the next request, waiting while other workers may still add work
    ///
    /// Returns `None` once the queue is empty and nothing is in flight, or as
    /// soon as the frontier is closed. Every `Some` must be paired with a
    /// call to [`Frontier::task_done`].
    pub async fn next(&self) -> Option<PageRequest> {
        loop {
            let notified = self.notify.notified();

            {
                let mut inner = self.lock();
                if inner.closed {
                    return None;
                }
                if let Some(request) = inner.queue.pop_front() {
                    inner.in_flight += 1;
                    return Some(request);
                }
                if inner.in_flight == 0 {
                    drop(inner);
                    self.notify.notify_waiters();
                    return None;
                }
            }

            notified.await;
        }
    }

    /// Marks a request returned by [`Frontier::next`] as finished
    pub fn task_done(&self) {
        {
            let mut inner = self.lock();
            inner.in_flight = inner.in_flight.saturating_sub(1);
        }
        self.notify.notify_waiters();
    }

    /// Refuses further admissions and drops queued work
    pub fn close(&self) {
        {
            let mut inner = self.lock();
            inner.closed = true;
            inner.queue.clear();
        }
        self.notify.notify_waiters();
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    pub fn visited_count(&self) -> usize {
        self.lock().visited.len()
    }

    pub fn queued(&self) -> usize {
        self.lock().queue.len()
    }

    pub fn in_flight(&self) -> usize {
        self.lock().in_flight
    }
}
