//! Wiki-Cartographer main entry point
//!
//! This is the command-line interface for the Wiki-Cartographer link-graph crawler.

use anyhow::{bail, Context};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use wiki_cartographer::archive::build_archivers;
use wiki_cartographer::config::{load_config_with_hash, load_seeds, Config, LogLevel};
use wiki_cartographer::crawler::{build_fetcher, build_http_client, Coordinator, CrawlReport};
use wiki_cartographer::output::{clean_feeds, CsvGraphSink, GraphEmitter};
use wiki_cartographer::storage::{open_storage, GraphStore, RunStatus, SqliteGraphSink};

/// Wiki-Cartographer: a wiki link-graph crawler
///
/// Wiki-Cartographer crawls a MediaWiki-style wiki from a list of seed
/// articles, resolving redirects and recording the directed graph of
/// articles and their links as CSV feeds (and optionally SQLite).
#[derive(Parser, Debug)]
#[command(name = "wiki-cartographer")]
#[command(version = "1.0.0")]
#[command(about = "A wiki link-graph crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Seed file: one article URL per line
    #[arg(value_name = "SEEDS")]
    seeds: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and seeds and show the crawl plan without crawling
    #[arg(long, conflicts_with_all = ["stats", "clean_feeds"])]
    dry_run: bool,

    /// Show graph statistics from the database and exit
    #[arg(long, conflicts_with_all = ["dry_run", "clean_feeds"])]
    stats: bool,

    /// Strip empty records from the CSV feeds into cleaned_*.csv and exit
    #[arg(long, conflicts_with_all = ["dry_run", "stats"])]
    clean_feeds: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;

    setup_logging(config.crawler.log_level, cli.verbose, cli.quiet);
    tracing::info!(
        "Configuration loaded from {} (hash: {})",
        cli.config.display(),
        config_hash
    );

    if cli.stats {
        handle_stats(&config)
    } else if cli.clean_feeds {
        handle_clean_feeds(&config)
    } else {
        let Some(seeds_path) = cli.seeds.as_deref() else {
            bail!("A seed file is required to crawl");
        };
        let seeds = load_seeds(seeds_path)
            .with_context(|| format!("Failed to load seeds from {}", seeds_path.display()))?;

        if cli.dry_run {
            handle_dry_run(&config, &seeds);
            Ok(())
        } else {
            handle_crawl(config, &config_hash, seeds).await
        }
    }
}

/// Sets up the logging/tracing subscriber
///
/// The configured log level applies to this crate, `-v` raises it one or two
/// steps and `-q` limits output to errors. `RUST_LOG` overrides all of it.
fn setup_logging(level: LogLevel, verbose: u8, quiet: bool) {
    let crate_level = if quiet {
        LogLevel::Error
    } else {
        match verbose {
            0 => level,
            1 => level.max(LogLevel::Debug),
            _ => LogLevel::Trace,
        }
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "wiki_cartographer={},warn",
            crate_level.as_directive()
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(config: &Config, seeds: &[String]) {
    println!("=== Wiki-Cartographer Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Depth limit: {}", config.crawler.depth_limit);
    println!("  Concurrency: {}", config.crawler.concurrency);
    println!("  Stats interval: {}s", config.crawler.log_stats_interval);
    println!("  Shuffle seeds: {}", config.crawler.shuffle_seeds);
    println!("  Request timeout: {}s", config.crawler.request_timeout);
    println!("  Max redirects: {}", config.crawler.max_redirects);

    println!("\nAuto-throttle:");
    if config.throttle.enabled {
        println!(
            "  Start delay {}s, bounds {}s..{}s, target concurrency {}",
            config.throttle.start_delay,
            config.throttle.min_delay,
            config.throttle.max_delay,
            config.throttle.target_concurrency
        );
    } else {
        println!("  Disabled");
    }

    println!("\nWiki:");
    println!("  Allowed domains: {}", config.wiki.allowed_domains.join(", "));
    println!("  Article prefix: {}", config.wiki.article_prefix);
    println!(
        "  Excluded namespaces: {}",
        config.wiki.excluded_namespaces.join(", ")
    );
    if !config.wiki.allowed_namespaces.is_empty() {
        println!(
            "  Allowed namespaces: {}",
            config.wiki.allowed_namespaces.join(", ")
        );
    }

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.header_value());

    println!("\nOutput:");
    println!("  Feeds: {}", config.output.feeds_dir);
    if config.output.database_path.is_empty() {
        println!("  Database: disabled");
    } else {
        println!("  Database: {}", config.output.database_path);
    }

    println!("\nArchival:");
    if config.archive.local {
        println!("  Local: {}", config.archive.directory);
    }
    if config.crawler.auto_archive {
        println!("  Wayback: {}", config.archive.wayback_endpoint);
    }

    println!("\nSeeds ({}):", seeds.len());
    for seed in seeds {
        println!("  - {}", seed);
    }

    println!("\n✓ Configuration is valid");
    println!("✓ Would start crawling with {} seed URLs", seeds.len());
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    use wiki_cartographer::output::{load_statistics, print_statistics};

    if config.output.database_path.is_empty() {
        bail!("No database-path configured; statistics need the SQLite sink");
    }

    println!("Database: {}\n", config.output.database_path);

    let storage = open_storage(Path::new(&config.output.database_path))?;
    let stats = load_statistics(&storage)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the --clean-feeds mode
fn handle_clean_feeds(config: &Config) -> anyhow::Result<()> {
    let written = clean_feeds(Path::new(&config.output.feeds_dir))
        .with_context(|| format!("Failed to clean feeds in {}", config.output.feeds_dir))?;

    if written.is_empty() {
        println!("No feeds found in {}", config.output.feeds_dir);
    }
    for path in written {
        println!("✓ Wrote {}", path.display());
    }

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config, config_hash: &str, seeds: Vec<String>) -> anyhow::Result<()> {
    tracing::info!(
        "Crawling {} with {} seed URLs",
        config.wiki.allowed_domains.join(", "),
        seeds.len()
    );

    let fetcher = build_fetcher(&config)?;
    let archive_client = build_http_client(
        &config.user_agent,
        Duration::from_secs(config.archive.timeout),
    )?;
    let archivers = build_archivers(&config, archive_client);

    let emitter = Arc::new(GraphEmitter::new());
    emitter.add_sink(Box::new(CsvGraphSink::create(Path::new(
        &config.output.feeds_dir,
    ))?));

    let database = (!config.output.database_path.is_empty())
        .then(|| PathBuf::from(&config.output.database_path));
    let run_id = match &database {
        Some(path) => {
            let mut storage = open_storage(path)?;
            let run_id = storage.create_run(config_hash)?;
            emitter.add_sink(Box::new(SqliteGraphSink::new(storage, run_id)));
            tracing::info!("Recording run #{} in {}", run_id, path.display());
            Some(run_id)
        }
        None => None,
    };

    let coordinator = Coordinator::new(&config, fetcher, archivers, emitter)?;

    let token = coordinator.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, stopping crawl");
            token.cancel();
        }
    });

    let result = coordinator.run(seeds).await;

    if let (Some(path), Some(run_id)) = (&database, run_id) {
        let status = match &result {
            Ok(report) if report.cancelled => RunStatus::Interrupted,
            Ok(_) => RunStatus::Completed,
            Err(_) => RunStatus::Failed,
        };
        open_storage(path)?.finish_run(run_id, status)?;
    }

    let report = result?;
    print_report(&report);
    Ok(())
}

fn print_report(report: &CrawlReport) {
    println!("\n=== Crawl {} ===", if report.cancelled { "Cancelled" } else { "Complete" });
    println!("  Pages processed: {}", report.pages_processed);
    println!("  Page errors: {}", report.page_errors);
    println!("  Nodes: {}", report.nodes);
    println!("  Edges: {}", report.edges);
    println!("  First edges: {}", report.first_edges);
    println!("  Links skipped: {}", report.links_skipped);
    if report.archive_errors > 0 {
        println!("  Archive errors: {}", report.archive_errors);
    }
    if report.sink_errors > 0 {
        println!("  Output errors: {}", report.sink_errors);
    }
    println!("  Elapsed: {:.1}s", report.elapsed.as_secs_f64());
}
