use std::collections::HashSet;

/// Canonical URLs already dispatched for fetching during this run
///
/// The set only grows. It is not synchronized itself; the frontier owns it and
/// performs check-and-set under its own lock.
#[derive(Debug, Default)]
pub struct VisitedSet {
    urls: HashSet<String>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the URL visited, returning false if it already was
    pub fn insert(&mut self, url: &str) -> bool {
        if self.urls.contains(url) {
            return false;
        }
        self.urls.insert(url.to_string())
    }

    pub fn contains(&self, url: &str) -> bool {
        self.urls.contains(url)
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}
