use serde::Deserialize;

/// Main configuration structure for Wiki-Cartographer
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub throttle: ThrottleConfig,
    pub wiki: WikiConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub archive: ArchiveConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct CrawlerConfig {
    /// Maximum depth to crawl from seed URLs (seeds are depth 0)
    pub depth_limit: u32,

    /// Maximum number of pages processed concurrently
    pub concurrency: u32,

    /// Seconds between progress log lines
    pub log_stats_interval: u64,

    /// Default log verbosity when no CLI flag overrides it
    pub log_level: LogLevel,

    /// Submit every fetched page to the Wayback Machine
    pub auto_archive: bool,

    /// Shuffle seeds before admission; disable for a deterministic crawl order
    pub shuffle_seeds: bool,

    /// Per-request timeout (seconds)
    pub request_timeout: u64,

    /// Maximum redirect hops followed for a single URL
    pub max_redirects: usize,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            depth_limit: 2,
            concurrency: 8,
            log_stats_interval: 60,
            log_level: LogLevel::Info,
            auto_archive: false,
            shuffle_seeds: true,
            request_timeout: 30,
            max_redirects: 10,
        }
    }
}

/// Log verbosity levels accepted in the config file
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Returns the directive understood by `tracing_subscriber::EnvFilter`
    pub fn as_directive(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

/// Latency-driven politeness settings
///
/// The delay between requests to a domain starts at `start_delay` and converges
/// towards `latency / target_concurrency`, clamped to `[min_delay, max_delay]`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ThrottleConfig {
    pub enabled: bool,

    /// Initial delay in seconds
    pub start_delay: f64,

    /// Lower bound in seconds
    pub min_delay: f64,

    /// Upper bound in seconds
    pub max_delay: f64,

    /// Average number of requests sent in parallel to each domain
    pub target_concurrency: f64,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            start_delay: 5.0,
            min_delay: 0.0,
            max_delay: 60.0,
            target_concurrency: 1.0,
        }
    }
}

/// Describes the wiki being mapped and which links count as articles
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct WikiConfig {
    /// Domain patterns (e.g., "example.org" or "*.example.org") considered in-domain
    pub allowed_domains: Vec<String>,

    /// Path prefix every article URL starts with
    #[serde(default = "default_article_prefix")]
    pub article_prefix: String,

    /// Namespaces (and exact titles) that are never followed
    #[serde(default = "default_excluded_namespaces")]
    pub excluded_namespaces: Vec<String>,

    /// Namespaces whose colon-bearing titles are still followed
    #[serde(default)]
    pub allowed_namespaces: Vec<String>,

    /// Selectors tried in order to extract the page title
    #[serde(default = "default_title_selectors")]
    pub title_selectors: Vec<String>,

    /// Anchor selector for the primary content flow (scanned first)
    #[serde(default = "default_primary_links")]
    pub primary_links: String,

    /// Anchor selector for every in-content link (scanned second)
    #[serde(default = "default_content_links")]
    pub content_links: String,

    /// Anchors carrying any of these classes are ignored
    #[serde(default = "default_excluded_link_classes")]
    pub excluded_link_classes: Vec<String>,
}

fn default_article_prefix() -> String {
    "/w/".to_string()
}

fn default_excluded_namespaces() -> Vec<String> {
    [
        "File",
        "Category",
        "Editing_rules",
        "User",
        "User_talk",
        "Special",
        "Project",
        "Project_talk",
        "Talk",
        "Template",
        "Template_talk",
        "Help",
        "MediaWiki",
        "Media",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_title_selectors() -> Vec<String> {
    vec!["#firstHeading > span".to_string(), "#firstHeading".to_string()]
}

fn default_primary_links() -> String {
    "#mw-content-text p a[href], #mw-content-text li a[href], #mw-content-text .redirectMsg a[href]"
        .to_string()
}

fn default_content_links() -> String {
    "#mw-content-text a[href]".to_string()
}

fn default_excluded_link_classes() -> Vec<String> {
    ["image", "reference", "external", "new"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,
}

impl UserAgentConfig {
    /// Formats the User-Agent header value: `Name/Version (+ContactURL)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{})",
            self.crawler_name, self.crawler_version, self.contact_url
        )
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct OutputConfig {
    /// Directory receiving nodes.csv, first_edges.csv and edges.csv
    pub feeds_dir: String,

    /// Optional SQLite database mirroring the feeds (empty disables it)
    pub database_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            feeds_dir: "feeds".to_string(),
            database_path: String::new(),
        }
    }
}

/// Page archival configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ArchiveConfig {
    /// Save every fetched page under `directory`
    pub local: bool,

    /// Root directory of the local archive
    pub directory: String,

    /// Save-page endpoint; the page URL is appended verbatim
    pub wayback_endpoint: String,

    /// Timeout for a single archive call (seconds)
    pub timeout: u64,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            local: true,
            directory: "archive".to_string(),
            wayback_endpoint: "https://web.archive.org/save/".to_string(),
            timeout: 30,
        }
    }
}
