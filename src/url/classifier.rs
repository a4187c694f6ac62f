//! Link classification
//!
//! Decides whether an href found on a wiki page is a followable in-domain article
//! link. Classification is a pure function of the href and the wiki configuration.

use crate::config::WikiConfig;
use crate::url::matcher::matches_any;
use url::Url;

/// Why an href was (or was not) accepted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    /// In-domain article link, eligible for traversal
    Article,
    /// Same-page anchor or empty href
    Anchor,
    /// Different host or non-HTTP scheme
    External,
    /// In-domain but outside the article path
    NotArticle,
    /// Article path in an excluded or non allow-listed namespace
    ExcludedNamespace,
}

impl LinkKind {
    /// Returns true if links of this kind are traversed
    pub fn is_followable(&self) -> bool {
        matches!(self, Self::Article)
    }
}

/// Classifies hrefs against the wiki's article prefix and namespace lists
#[derive(Debug, Clone)]
pub struct LinkClassifier {
    allowed_domains: Vec<String>,
    article_prefix: String,
    excluded: Vec<String>,
    allowed_namespaces: Vec<String>,
}

impl LinkClassifier {
    /// Builds a classifier from the wiki section of the configuration
    pub fn new(config: &WikiConfig) -> Self {
        Self {
            allowed_domains: config.allowed_domains.clone(),
            article_prefix: config.article_prefix.clone(),
            excluded: config
                .excluded_namespaces
                .iter()
                .map(|n| fold_title(n))
                .collect(),
            allowed_namespaces: config
                .allowed_namespaces
                .iter()
                .map(|n| fold_title(n))
                .collect(),
        }
    }

    /// Returns true if the href is a followable article link
    pub fn is_followable(&self, href: &str) -> bool {
        self.classify(href).is_followable()
    }

    /// Returns true if `url` is an absolute HTTP(S) URL on an allowed domain
    ///
    /// Checked on resolved link targets and seeds, where a redirect can
    /// leave the wiki even though the href itself was in-domain.
    pub fn is_in_domain(&self, url: &str) -> bool {
        Url::parse(url)
            .ok()
            .and_then(|url| self.in_domain_path(&url))
            .is_some()
    }

    /// Classifies an href as found in the page markup
    pub fn classify(&self, href: &str) -> LinkKind {
        let href = href.trim();

        if href.is_empty() || href.starts_with('#') {
            return LinkKind::Anchor;
        }

        let path = if href.starts_with("//") {
            match Url::parse(&format!("https:{}", href)) {
                Ok(url) => match self.in_domain_path(&url) {
                    Some(path) => path,
                    None => return LinkKind::External,
                },
                Err(_) => return LinkKind::External,
            }
        } else if href.starts_with('/') {
            href.to_string()
        } else {
            match Url::parse(href) {
                Ok(url) => match self.in_domain_path(&url) {
                    Some(path) => path,
                    None => return LinkKind::External,
                },
                // Relative paths without a leading slash never name an article
                Err(_) => return LinkKind::NotArticle,
            }
        };

        let title = match path.strip_prefix(&self.article_prefix) {
            Some(rest) => rest.split('#').next().unwrap_or(""),
            None => return LinkKind::NotArticle,
        };

        if title.is_empty() {
            return LinkKind::NotArticle;
        }

        self.classify_title(title)
    }

    /// Applies the namespace rules to an article title
    fn classify_title(&self, title: &str) -> LinkKind {
        let title = title.split('?').next().unwrap_or(title);
        let folded = fold_title(title);

        let namespace = folded.split_once(':').map(|(ns, _)| ns);

        let excluded = self.excluded.iter().any(|entry| {
            namespace == Some(entry.as_str())
                || folded == *entry
                || folded.starts_with(&format!("{}/", entry))
        });
        if excluded {
            return LinkKind::ExcludedNamespace;
        }

        match namespace {
            Some(ns) if !self.allowed_namespaces.iter().any(|a| a == ns) => {
                LinkKind::ExcludedNamespace
            }
            _ => LinkKind::Article,
        }
    }

    /// Returns the path (plus query) of an absolute URL on an allowed host
    fn in_domain_path(&self, url: &Url) -> Option<String> {
        if url.scheme() != "http" && url.scheme() != "https" {
            return None;
        }

        let host = url.host_str()?;
        if !matches_any(&self.allowed_domains, host) {
            return None;
        }

        let mut path = url.path().to_string();
        if let Some(query) = url.query() {
            path.push('?');
            path.push_str(query);
        }
        if let Some(fragment) = url.fragment() {
            path.push('#');
            path.push_str(fragment);
        }
        Some(path)
    }
}

/// Folds a title for namespace comparison: decoded colons and spaces, ASCII lowercase
fn fold_title(title: &str) -> String {
    title
        .replace("%3A", ":")
        .replace("%3a", ":")
        .replace("%20", "_")
        .replace(' ', "_")
        .to_ascii_lowercase()
}
