use crate::config::types::{
    ArchiveConfig, Config, CrawlerConfig, OutputConfig, ThrottleConfig, UserAgentConfig,
    WikiConfig,
};
use crate::ConfigError;
use scraper::Selector;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_throttle_config(&config.throttle)?;
    validate_wiki_config(&config.wiki)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_output_config(&config.output)?;
    validate_archive_config(&config.archive, config.crawler.auto_archive)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.concurrency < 1 || config.concurrency > 100 {
        return Err(ConfigError::Validation(format!(
            "concurrency must be between 1 and 100, got {}",
            config.concurrency
        )));
    }

    if config.log_stats_interval < 1 {
        return Err(ConfigError::Validation(
            "log-stats-interval must be at least 1 second".to_string(),
        ));
    }

    if config.request_timeout < 1 {
        return Err(ConfigError::Validation(
            "request-timeout must be at least 1 second".to_string(),
        ));
    }

    if config.max_redirects < 1 {
        return Err(ConfigError::Validation(
            "max-redirects must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates auto-throttle bounds
fn validate_throttle_config(config: &ThrottleConfig) -> Result<(), ConfigError> {
    if config.min_delay < 0.0 || config.start_delay < 0.0 {
        return Err(ConfigError::Validation(
            "throttle delays cannot be negative".to_string(),
        ));
    }

    if config.max_delay < config.min_delay {
        return Err(ConfigError::Validation(format!(
            "throttle max-delay ({}) must be >= min-delay ({})",
            config.max_delay, config.min_delay
        )));
    }

    if config.target_concurrency <= 0.0 {
        return Err(ConfigError::Validation(format!(
            "throttle target-concurrency must be positive, got {}",
            config.target_concurrency
        )));
    }

    Ok(())
}

/// Validates the wiki description: domains, article prefix and selectors
fn validate_wiki_config(config: &WikiConfig) -> Result<(), ConfigError> {
    if config.allowed_domains.is_empty() {
        return Err(ConfigError::Validation(
            "allowed-domains must list at least one domain".to_string(),
        ));
    }

    for pattern in &config.allowed_domains {
        validate_domain_pattern(pattern)?;
    }

    if !config.article_prefix.starts_with('/') || !config.article_prefix.ends_with('/') {
        return Err(ConfigError::Validation(format!(
            "article-prefix must start and end with '/', got '{}'",
            config.article_prefix
        )));
    }

    if config.title_selectors.is_empty() {
        return Err(ConfigError::Validation(
            "title-selectors cannot be empty".to_string(),
        ));
    }

    for selector in config
        .title_selectors
        .iter()
        .chain([&config.primary_links, &config.content_links])
    {
        validate_selector(selector)?;
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    // Validate crawler name: non-empty, alphanumeric + hyphens only
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.feeds_dir.is_empty() {
        return Err(ConfigError::Validation(
            "feeds-dir cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates archive configuration
fn validate_archive_config(config: &ArchiveConfig, auto_archive: bool) -> Result<(), ConfigError> {
    if config.local && config.directory.is_empty() {
        return Err(ConfigError::Validation(
            "archive directory cannot be empty when local archival is enabled".to_string(),
        ));
    }

    if auto_archive {
        Url::parse(&config.wayback_endpoint)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid wayback-endpoint: {}", e)))?;
    }

    if config.timeout < 1 {
        return Err(ConfigError::Validation(
            "archive timeout must be at least 1 second".to_string(),
        ));
    }

    Ok(())
}

/// Validates that a CSS selector parses
fn validate_selector(selector: &str) -> Result<(), ConfigError> {
    Selector::parse(selector)
        .map(|_| ())
        .map_err(|e| ConfigError::InvalidSelector {
            selector: selector.to_string(),
            message: format!("{:?}", e),
        })
}

/// Validates a domain pattern (supports wildcards)
fn validate_domain_pattern(pattern: &str) -> Result<(), ConfigError> {
    if pattern.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Domain pattern cannot be empty".to_string(),
        ));
    }

    if let Some(domain) = pattern.strip_prefix("*.") {
        validate_domain_string(domain)
    } else {
        validate_domain_string(pattern)
    }
}

/// Validates a domain string (without wildcard prefix)
fn validate_domain_string(domain: &str) -> Result<(), ConfigError> {
    if domain.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Domain cannot be empty".to_string(),
        ));
    }

    if !domain
        .chars()
        .all(|c| c.is_alphanumeric() || c == '.' || c == '-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' contains invalid characters",
            domain
        )));
    }

    if domain.starts_with('.')
        || domain.ends_with('.')
        || domain.starts_with('-')
        || domain.ends_with('-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' cannot start or end with '.' or '-'",
            domain
        )));
    }

    if domain.contains("..") {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' cannot contain consecutive dots",
            domain
        )));
    }

    Ok(())
}
