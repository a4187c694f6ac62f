/// Checks if a host matches an allowed-domain pattern
///
/// Patterns are either exact (`"wiki.example.org"`) or wildcards
/// (`"*.example.org"`), where a wildcard also covers the bare base domain.
/// Comparison ignores ASCII case.
///
/// # Examples
///
/// ```
/// use wiki_cartographer::url::matches_domain;
///
/// assert!(matches_domain("wiki.example.org", "WIKI.example.org"));
/// assert!(matches_domain("*.example.org", "example.org"));
/// assert!(matches_domain("*.example.org", "de.wiki.example.org"));
/// assert!(!matches_domain("*.example.org", "notexample.org"));
/// ```
pub fn matches_domain(pattern: &str, host: &str) -> bool {
    let host = host.to_ascii_lowercase();
    let pattern = pattern.to_ascii_lowercase();

    match pattern.strip_prefix("*.") {
        Some(base) => host == base || host.ends_with(&format!(".{}", base)),
        None => host == pattern,
    }
}

/// Returns true when the host matches any of the patterns
pub fn matches_any(patterns: &[String], host: &str) -> bool {
    patterns.iter().any(|p| matches_domain(p, host))
}
