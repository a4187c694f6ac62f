//! Integration tests for the crawler
//!
//! These tests use wiremock to serve a small wiki and run the full crawl
//! cycle end-to-end against it.

use std::io;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tracing_subscriber::fmt::MakeWriter;
use wiki_cartographer::config::{parse_config, Config};
use wiki_cartographer::crawler::{build_fetcher, Coordinator, CrawlReport};
use wiki_cartographer::output::{
    CsvGraphSink, Edge, GraphEmitter, MemoryGraph, Node, EDGES_FILE, FIRST_EDGES_FILE, NODES_FILE,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration for a wiki served from 127.0.0.1
fn create_test_config(depth_limit: u32, feeds_dir: &TempDir) -> Config {
    let content = format!(
        r#"
[crawler]
depth-limit = {}
concurrency = 4
shuffle-seeds = false
request-timeout = 5
log-stats-interval = 60

[throttle]
enabled = false

[wiki]
allowed-domains = ["127.0.0.1"]

[user-agent]
crawler-name = "TestBot"
crawler-version = "1.0.0"
contact-url = "https://example.com/contact"

[output]
feeds-dir = '{}'

[archive]
local = false
"#,
        depth_limit,
        feeds_dir.path().display()
    );

    parse_config(&content).expect("test config should be valid")
}

/// Renders a MediaWiki-like article with links in its first paragraph
fn article(title: &str, links: &[&str]) -> String {
    let anchors: String = links
        .iter()
        .map(|href| format!(r#"<a href="{}">{}</a> "#, href, href))
        .collect();

    format!(
        r#"<html><head><title>{title} - Test Wiki</title></head><body>
<h1 id="firstHeading"><span>{title}</span></h1>
<div id="mw-content-text"><p>{anchors}</p></div>
</body></html>"#
    )
}

fn article_mock(page: &str, title: &str, links: &[&str]) -> Mock {
    Mock::given(method("GET"))
        .and(path(page))
        .respond_with(ResponseTemplate::new(200).set_body_string(article(title, links)))
}

async fn mount_article(server: &MockServer, page: &str, title: &str, links: &[&str]) {
    article_mock(page, title, links).mount(server).await;
}

async fn mount_redirect(server: &MockServer, from: &str, to: &str) {
    Mock::given(method("GET"))
        .and(path(from))
        .respond_with(ResponseTemplate::new(301).insert_header("Location", to))
        .mount(server)
        .await;
}

async fn crawl(config: &Config, seeds: Vec<String>) -> (CrawlReport, MemoryGraph) {
    let graph = MemoryGraph::new();
    let emitter = Arc::new(GraphEmitter::new().with_sink(Box::new(graph.clone())));
    let fetcher = build_fetcher(config).unwrap();

    let coordinator = Coordinator::new(config, fetcher, Vec::new(), emitter).unwrap();
    let report = coordinator.run(seeds).await.unwrap();
    (report, graph)
}

#[tokio::test]
async fn test_article_links_and_excluded_namespace() {
    let server = MockServer::start().await;
    let base = server.uri();

    article_mock("/w/A", "A", &["/w/B", "/w/File:X.png"])
        .expect(1)
        .mount(&server)
        .await;
    article_mock("/w/B", "B", &[]).expect(1).mount(&server).await;

    Mock::given(method("GET"))
        .and(path("/w/File:X.png"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let feeds = TempDir::new().unwrap();
    let config = create_test_config(1, &feeds);
    let (report, graph) = crawl(&config, vec![format!("{}/w/A", base)]).await;

    let a = format!("{}/w/A", base);
    let b = format!("{}/w/B", base);

    let mut nodes = graph.nodes();
    nodes.sort_by(|x, y| x.id.cmp(&y.id));
    assert_eq!(nodes, vec![Node::new(a.clone(), "A"), Node::new(b.clone(), "B")]);
    assert_eq!(graph.edges(), vec![Edge::new(a.clone(), b.clone())]);
    assert_eq!(graph.first_edges(), vec![Edge::new(a, b)]);

    assert_eq!(report.pages_processed, 2);
    assert_eq!(report.page_errors, 0);
    assert!(!report.cancelled);
}

#[tokio::test]
async fn test_depth_limit_bounds_requests() {
    let server = MockServer::start().await;
    let base = server.uri();

    article_mock("/w/A", "A", &["/w/B"]).expect(1).mount(&server).await;
    article_mock("/w/B", "B", &["/w/C"]).expect(1).mount(&server).await;
    article_mock("/w/C", "C", &["/w/D"]).expect(0).mount(&server).await;

    let feeds = TempDir::new().unwrap();
    let config = create_test_config(1, &feeds);
    let (report, graph) = crawl(&config, vec![format!("{}/w/A", base)]).await;

    let ids: Vec<String> = graph.nodes().into_iter().map(|n| n.id).collect();
    assert_eq!(ids.len(), 2);
    assert!(ids.contains(&format!("{}/w/A", base)));
    assert!(ids.contains(&format!("{}/w/B", base)));

    // B still records its edge to C, but C is never requested
    assert!(graph
        .edges()
        .contains(&Edge::new(format!("{}/w/B", base), format!("{}/w/C", base))));
    assert_eq!(report.pages_processed, 2);
}

#[tokio::test]
async fn test_redirect_chain_becomes_edges() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_article(&server, "/w/A", "A", &["/w/Alias"]).await;
    mount_redirect(&server, "/w/Alias", "/w/Target").await;
    mount_article(&server, "/w/Target", "Target", &[]).await;

    let feeds = TempDir::new().unwrap();
    let config = create_test_config(2, &feeds);
    let (_, graph) = crawl(&config, vec![format!("{}/w/A", base)]).await;

    let a = format!("{}/w/A", base);
    let alias = format!("{}/w/Alias", base);
    let target = format!("{}/w/Target", base);

    let ids: Vec<String> = graph.nodes().into_iter().map(|n| n.id).collect();
    assert!(ids.contains(&target));
    assert!(!ids.contains(&alias));

    let edges = graph.edges();
    assert!(edges.contains(&Edge::new(a.clone(), target.clone())));
    assert!(edges.contains(&Edge::new(alias.clone(), target.clone())));

    let first = graph.first_edges();
    assert!(first.contains(&Edge::new(a, target.clone())));
    assert!(first.contains(&Edge::new(alias, target)));
}

#[tokio::test]
async fn test_self_redirect_cycle_terminates() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_redirect(&server, "/w/Loop", "/w/Loop").await;

    let feeds = TempDir::new().unwrap();
    let config = create_test_config(2, &feeds);
    let (report, graph) = crawl(&config, vec![format!("{}/w/Loop", base)]).await;

    assert!(graph.nodes().is_empty());
    assert_eq!(report.page_errors, 1);
    assert_eq!(report.pages_processed, 0);
}

#[tokio::test]
async fn test_shared_target_produces_one_node() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_article(&server, "/w/A", "A", &["/w/C"]).await;
    mount_article(&server, "/w/B", "B", &["/w/C"]).await;
    mount_article(&server, "/w/C", "C", &["/w/A", "/w/B"]).await;

    let feeds = TempDir::new().unwrap();
    let config = create_test_config(3, &feeds);
    let (_, graph) = crawl(
        &config,
        vec![format!("{}/w/A", base), format!("{}/w/B", base)],
    )
    .await;

    let mut ids: Vec<String> = graph.nodes().into_iter().map(|n| n.id).collect();
    ids.sort();
    let mut unique = ids.clone();
    unique.dedup();
    assert_eq!(ids, unique);
    assert_eq!(ids.len(), 3);

    // Every page has at least one outlink, so each has exactly one first edge
    let first = graph.first_edges();
    assert_eq!(first.len(), 3);
    for id in &ids {
        assert_eq!(first.iter().filter(|e| &e.source == id).count(), 1);
    }
}

#[tokio::test]
async fn test_csv_feeds_written() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_article(&server, "/w/A", "A", &["/w/B"]).await;
    mount_article(&server, "/w/B", "B", &[]).await;

    let feeds = TempDir::new().unwrap();
    let config = create_test_config(1, &feeds);

    let emitter = Arc::new(
        GraphEmitter::new().with_sink(Box::new(CsvGraphSink::create(feeds.path()).unwrap())),
    );
    let coordinator =
        Coordinator::new(&config, build_fetcher(&config).unwrap(), Vec::new(), emitter).unwrap();
    coordinator.run(vec![format!("{}/w/A", base)]).await.unwrap();

    let nodes = std::fs::read_to_string(feeds.path().join(NODES_FILE)).unwrap();
    assert!(nodes.starts_with("id,label\n"));
    assert_eq!(nodes.lines().count(), 3);

    let expected_edge = format!("{}/w/A,{}/w/B", base, base);
    let first = std::fs::read_to_string(feeds.path().join(FIRST_EDGES_FILE)).unwrap();
    assert_eq!(first, format!("source,target\n{}\n", expected_edge));

    let edges = std::fs::read_to_string(feeds.path().join(EDGES_FILE)).unwrap();
    assert_eq!(edges, format!("source,target\n{}\n", expected_edge));
}

#[tokio::test]
async fn test_cancelled_crawl_stops_early() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_article(&server, "/w/A", "A", &[]).await;

    let feeds = TempDir::new().unwrap();
    let config = create_test_config(1, &feeds);

    let graph = MemoryGraph::new();
    let emitter = Arc::new(GraphEmitter::new().with_sink(Box::new(graph.clone())));
    let coordinator =
        Coordinator::new(&config, build_fetcher(&config).unwrap(), Vec::new(), emitter).unwrap();

    coordinator.cancellation_token().cancel();
    let report = coordinator.run(vec![format!("{}/w/A", base)]).await.unwrap();

    assert!(report.cancelled);
    assert_eq!(report.pages_processed, 0);
    assert!(graph.nodes().is_empty());
}

#[tokio::test]
async fn test_link_redirecting_to_other_host_is_not_followed() {
    let server = MockServer::start().await;
    let base = server.uri();
    let other_host = format!("http://localhost:{}", server.address().port());

    mount_article(&server, "/w/A", "A", &["/w/Ext"]).await;
    mount_redirect(&server, "/w/Ext", &format!("{}/w/Outside", other_host)).await;
    mount_article(&server, "/w/Outside", "Outside", &["/w/Deeper"]).await;
    article_mock("/w/Deeper", "Deeper", &[]).expect(0).mount(&server).await;

    let feeds = TempDir::new().unwrap();
    let config = create_test_config(3, &feeds);
    let (report, graph) = crawl(&config, vec![format!("{}/w/A", base)]).await;

    let ids: Vec<String> = graph.nodes().into_iter().map(|n| n.id).collect();
    assert_eq!(ids, vec![format!("{}/w/A", base)]);
    assert!(graph.edges().is_empty());
    assert_eq!(report.links_skipped, 1);
    assert_eq!(report.pages_processed, 1);
}

#[tokio::test]
async fn test_seed_outside_allowed_domains_is_skipped() {
    let server = MockServer::start().await;
    let other_host = format!("http://localhost:{}", server.address().port());

    article_mock("/w/A", "A", &[]).expect(0).mount(&server).await;

    let feeds = TempDir::new().unwrap();
    let config = create_test_config(1, &feeds);
    let (report, graph) = crawl(&config, vec![format!("{}/w/A", other_host)]).await;

    assert!(graph.nodes().is_empty());
    assert_eq!(report.urls_admitted, 0);
    assert_eq!(report.pages_processed, 0);
}

#[tokio::test]
async fn test_chain_edges_emitted_before_body_edges() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_article(&server, "/w/A", "A", &["/w/Alias"]).await;
    mount_redirect(&server, "/w/Alias", "/w/Target").await;
    mount_article(&server, "/w/Target", "Target", &["/w/C"]).await;
    mount_article(&server, "/w/C", "C", &[]).await;

    let feeds = TempDir::new().unwrap();
    let config = create_test_config(2, &feeds);
    let (_, graph) = crawl(&config, vec![format!("{}/w/A", base)]).await;

    let a = format!("{}/w/A", base);
    let alias = format!("{}/w/Alias", base);
    let target = format!("{}/w/Target", base);
    let c = format!("{}/w/C", base);

    let edges = graph.edges();
    let position = |edge: Edge| {
        edges
            .iter()
            .position(|e| *e == edge)
            .unwrap_or_else(|| panic!("missing edge {:?}", edge))
    };

    let into_target = position(Edge::new(a, target.clone()));
    let chain = position(Edge::new(alias.clone(), target.clone()));
    let body = position(Edge::new(target.clone(), c.clone()));
    assert!(into_target < chain);
    assert!(chain < body);

    let first = graph.first_edges();
    let chain_first = first.iter().position(|e| *e == Edge::new(alias.clone(), target.clone()));
    let body_first = first.iter().position(|e| *e == Edge::new(target.clone(), c.clone()));
    assert!(chain_first.is_some());
    assert!(chain_first < body_first);
}

#[tokio::test]
async fn test_alias_to_visited_target_adds_no_chain_edges() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_article(&server, "/w/A", "A", &["/w/B", "/w/Alias"]).await;
    mount_redirect(&server, "/w/Alias", "/w/B").await;
    mount_article(&server, "/w/B", "B", &[]).await;

    let feeds = TempDir::new().unwrap();
    let config = create_test_config(1, &feeds);
    let (report, graph) = crawl(&config, vec![format!("{}/w/A", base)]).await;

    let a = format!("{}/w/A", base);
    let b = format!("{}/w/B", base);

    // Both links collapse onto B; B was admitted through the direct link,
    // so the alias hop never becomes an edge
    assert_eq!(
        graph.edges(),
        vec![Edge::new(a.clone(), b.clone()), Edge::new(a.clone(), b.clone())]
    );
    assert_eq!(graph.first_edges(), vec![Edge::new(a, b)]);
    assert_eq!(graph.nodes().len(), 2);
    assert_eq!(report.urls_admitted, 2);
}

/// Collects formatted log output in memory
#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogBuffer {
    type Writer = LogBuffer;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

#[tokio::test]
async fn test_page_without_outlinks_logs_warning() {
    let logs = LogBuffer::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(logs.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::WARN)
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let server = MockServer::start().await;
    let base = server.uri();

    mount_article(&server, "/w/A", "A", &["/w/Category:Stuff"]).await;

    let feeds = TempDir::new().unwrap();
    let config = create_test_config(1, &feeds);
    let (report, graph) = crawl(&config, vec![format!("{}/w/A", base)]).await;

    assert_eq!(report.pages_processed, 1);
    assert_eq!(graph.nodes().len(), 1);
    assert!(graph.first_edges().is_empty());
    assert!(logs
        .contents()
        .contains(&format!("No outlinks found on {}/w/A", base)));
}
