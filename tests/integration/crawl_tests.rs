//! Integration tests for the crawler
//!
//! These tests drive the full coordinator over a scripted site served by an
//! in-memory renderer, writing into a temporary output directory. One test
//! renders pages from a wiremock server through a real browser and is
//! ignored by default.

use async_trait::async_trait;
use docs_mirror::config::Config;
use docs_mirror::crawler::{parse_html, Coordinator, RenderError, RenderOptions, RenderedPage, Renderer};
use docs_mirror::output::{FailureKind, PageOutcome};
use docs_mirror::storage::{DirectoryStore, PageStore, StorageError, StorageResult, StoredPage};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use url::Url;

const ORIGIN: &str = "https://docs.test";

/// What the scripted site does for one URL
#[derive(Clone)]
enum Scripted {
    Page(String),
    Timeout,
    Network,
    Fatal,
}

/// Renderer backed by a URL -> response table
struct FakeRenderer {
    site: HashMap<String, Scripted>,
    calls: Arc<Mutex<Vec<String>>>,
    closes: Arc<AtomicUsize>,
}

impl FakeRenderer {
    fn new(site: Vec<(&str, Scripted)>) -> Self {
        Self {
            site: site
                .into_iter()
                .map(|(path, response)| (format!("{}{}", ORIGIN, path), response))
                .collect(),
            calls: Arc::new(Mutex::new(Vec::new())),
            closes: Arc::new(AtomicUsize::new(0)),
        }
    }
}

#[async_trait]
impl Renderer for FakeRenderer {
    async fn render(&self, url: &Url, options: &RenderOptions) -> Result<RenderedPage, RenderError> {
        self.calls.lock().unwrap().push(url.to_string());

        match self.site.get(url.as_str()) {
            Some(Scripted::Page(html)) => {
                let parsed = parse_html(html);
                Ok(RenderedPage {
                    html: html.clone(),
                    links: parsed.links,
                    title: parsed.title,
                })
            }
            Some(Scripted::Timeout) => Err(RenderError::Timeout {
                url: url.to_string(),
                timeout: options.timeout,
            }),
            Some(Scripted::Fatal) => Err(RenderError::SessionFatal("target crashed".to_string())),
            Some(Scripted::Network) | None => Err(RenderError::Network {
                url: url.to_string(),
                message: "net::ERR_CONNECTION_REFUSED".to_string(),
            }),
        }
    }

    async fn close(&self) -> Result<(), RenderError> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Store that refuses to write URLs containing a marker
struct FailingStore {
    inner: DirectoryStore,
    marker: &'static str,
}

impl PageStore for FailingStore {
    fn prepare(&self) -> StorageResult<()> {
        self.inner.prepare()
    }

    fn write_page(&self, url: &Url, html: &str) -> StorageResult<StoredPage> {
        if url.as_str().contains(self.marker) {
            return Err(StorageError::Write {
                path: self.inner.path_for(url),
                source: std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
            });
        }
        self.inner.write_page(url, html)
    }

    fn root(&self) -> &Path {
        self.inner.root()
    }
}

fn page(links: &[&str]) -> Scripted {
    let anchors: String = links
        .iter()
        .map(|href| format!(r#"<a href="{}">link</a>"#, href))
        .collect();
    Scripted::Page(format!(
        "<html><head><title>doc</title></head><body>{}</body></html>",
        anchors
    ))
}

/// Creates a test configuration scoped to the scripted site
fn create_test_config(output: &Path) -> Config {
    let mut config = Config::default();
    config.crawler.seed_url = format!("{}/guide/intro/start", ORIGIN);
    config.crawler.settle_delay = 0;
    config.scope.host = "docs.test".to_string();
    config.scope.path_segment = "guide".to_string();
    config.output.directory = output.to_string_lossy().into_owned();
    config
}

fn store(config: &Config) -> DirectoryStore {
    DirectoryStore::new(&config.output.directory, ".html")
}

fn urls(paths: &[&str]) -> Vec<String> {
    paths.iter().map(|p| format!("{}{}", ORIGIN, p)).collect()
}

fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[tokio::test]
async fn test_breadth_first_order() {
    let dir = tempfile::tempdir().unwrap();
    let config = create_test_config(dir.path());

    let renderer = FakeRenderer::new(vec![
        ("/guide/intro/start", page(&["a", "b"])),
        ("/guide/intro/a", page(&["c"])),
        ("/guide/intro/b", page(&["c", "a", "start"])),
        ("/guide/intro/c", page(&[])),
    ]);
    let calls = Arc::clone(&renderer.calls);

    let report = Coordinator::new(&config, renderer, store(&config))
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(
        *calls.lock().unwrap(),
        urls(&[
            "/guide/intro/start",
            "/guide/intro/a",
            "/guide/intro/b",
            "/guide/intro/c",
        ])
    );
    assert!(report.is_complete());
    assert_eq!(report.summary.pages_persisted, 4);
    assert!(report
        .records
        .iter()
        .all(|r| r.title.as_deref() == Some("doc")));
    assert_eq!(
        file_names(dir.path()),
        vec![
            "guide_intro_a.html",
            "guide_intro_b.html",
            "guide_intro_c.html",
            "guide_intro_start.html",
        ]
    );
}

#[tokio::test]
async fn test_fragment_variants_fetched_once() {
    let dir = tempfile::tempdir().unwrap();
    let config = create_test_config(dir.path());

    let renderer = FakeRenderer::new(vec![
        ("/guide/intro/start", page(&["part2#one", "part2#two", "./part2", "#top"])),
        ("/guide/intro/part2", page(&["start#again"])),
    ]);
    let calls = Arc::clone(&renderer.calls);

    let report = Coordinator::new(&config, renderer, store(&config))
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(
        *calls.lock().unwrap(),
        urls(&["/guide/intro/start", "/guide/intro/part2"])
    );
    assert_eq!(report.records.len(), 2);
}

#[tokio::test]
async fn test_empty_query_variant_fetched_once() {
    let dir = tempfile::tempdir().unwrap();
    let config = create_test_config(dir.path());

    let renderer = FakeRenderer::new(vec![
        ("/guide/intro/start", page(&["part2", "part2?", "part2?#top"])),
        ("/guide/intro/part2", page(&[])),
    ]);
    let calls = Arc::clone(&renderer.calls);

    let report = Coordinator::new(&config, renderer, store(&config))
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(
        *calls.lock().unwrap(),
        urls(&["/guide/intro/start", "/guide/intro/part2"])
    );
    assert_eq!(report.summary.pages_persisted, 2);
    assert_eq!(file_names(dir.path()).len(), 2);
}

#[tokio::test]
async fn test_out_of_scope_links_never_fetched() {
    let dir = tempfile::tempdir().unwrap();
    let config = create_test_config(dir.path());

    let renderer = FakeRenderer::new(vec![(
        "/guide/intro/start",
        page(&[
            "https://github.com/guide/intro/x",
            "/blog/guide-post",
            "/other/a/b/c",
            "/guide/intro/logo.png",
            "/guide/theme.js",
            "mailto:docs@docs.test",
            "javascript:void(0)",
            "/guide/",
        ]),
    )]);
    let calls = Arc::clone(&renderer.calls);

    Coordinator::new(&config, renderer, store(&config))
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(*calls.lock().unwrap(), urls(&["/guide/intro/start"]));
}

#[tokio::test]
async fn test_failures_do_not_stop_the_crawl() {
    let dir = tempfile::tempdir().unwrap();
    let config = create_test_config(dir.path());

    let renderer = FakeRenderer::new(vec![
        ("/guide/intro/start", page(&["slow", "down", "ok", "missing"])),
        ("/guide/intro/slow", Scripted::Timeout),
        ("/guide/intro/down", Scripted::Network),
        ("/guide/intro/ok", page(&["slow", "deeper"])),
        ("/guide/intro/deeper", page(&[])),
    ]);
    let calls = Arc::clone(&renderer.calls);

    let report = Coordinator::new(&config, renderer, store(&config))
        .unwrap()
        .run()
        .await
        .unwrap();

    // The timed-out page is linked again but not retried
    assert_eq!(
        *calls.lock().unwrap(),
        urls(&[
            "/guide/intro/start",
            "/guide/intro/slow",
            "/guide/intro/down",
            "/guide/intro/ok",
            "/guide/intro/missing",
            "/guide/intro/deeper",
        ])
    );

    assert!(report.is_complete());
    assert_eq!(report.summary.pages_persisted, 3);
    assert_eq!(report.summary.pages_failed, 3);

    let kinds: Vec<FailureKind> = report
        .failures()
        .filter_map(|r| match &r.outcome {
            PageOutcome::Failed { kind, .. } => Some(*kind),
            PageOutcome::Persisted => None,
        })
        .collect();
    assert_eq!(
        kinds,
        vec![FailureKind::Timeout, FailureKind::Network, FailureKind::Network]
    );

    assert!(!dir.path().join("guide_intro_slow.html").exists());
    assert!(dir.path().join("guide_intro_deeper.html").exists());
}

#[tokio::test]
async fn test_fatal_session_error_aborts_with_partial_results() {
    let dir = tempfile::tempdir().unwrap();
    let config = create_test_config(dir.path());

    let renderer = FakeRenderer::new(vec![
        ("/guide/intro/start", page(&["a", "crash", "b"])),
        ("/guide/intro/a", page(&[])),
        ("/guide/intro/crash", Scripted::Fatal),
        ("/guide/intro/b", page(&[])),
    ]);
    let calls = Arc::clone(&renderer.calls);
    let closes = Arc::clone(&renderer.closes);

    let report = Coordinator::new(&config, renderer, store(&config))
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(
        *calls.lock().unwrap(),
        urls(&["/guide/intro/start", "/guide/intro/a", "/guide/intro/crash"])
    );
    assert!(!report.is_complete());
    assert!(report.aborted.as_deref().unwrap().contains("target crashed"));
    assert_eq!(closes.load(Ordering::SeqCst), 1);

    // Pages written before the failure stay on disk
    assert_eq!(report.summary.pages_persisted, 2);
    assert!(dir.path().join("guide_intro_a.html").exists());

    let last = report.records.last().unwrap();
    assert_eq!(last.url, format!("{}/guide/intro/crash", ORIGIN));
    assert!(matches!(
        last.outcome,
        PageOutcome::Failed {
            kind: FailureKind::SessionFatal,
            ..
        }
    ));
}

#[tokio::test]
async fn test_renderer_closed_once_on_success() {
    let dir = tempfile::tempdir().unwrap();
    let config = create_test_config(dir.path());

    let renderer = FakeRenderer::new(vec![("/guide/intro/start", page(&[]))]);
    let closes = Arc::clone(&renderer.closes);

    Coordinator::new(&config, renderer, store(&config))
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(closes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_renderer_closed_when_output_cannot_be_created() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("occupied");
    std::fs::write(&blocker, "a file, not a directory").unwrap();
    let config = create_test_config(&blocker.join("out"));

    let renderer = FakeRenderer::new(vec![("/guide/intro/start", page(&[]))]);
    let calls = Arc::clone(&renderer.calls);
    let closes = Arc::clone(&renderer.closes);

    let result = Coordinator::new(&config, renderer, store(&config))
        .unwrap()
        .run()
        .await;

    assert!(result.is_err());
    assert!(calls.lock().unwrap().is_empty());
    assert_eq!(closes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_persistence_failure_is_isolated() {
    let dir = tempfile::tempdir().unwrap();
    let config = create_test_config(dir.path());

    let renderer = FakeRenderer::new(vec![
        ("/guide/intro/start", page(&["unwritable", "fine"])),
        ("/guide/intro/unwritable", page(&["child"])),
        ("/guide/intro/fine", page(&[])),
        ("/guide/intro/child", page(&[])),
    ]);
    let calls = Arc::clone(&renderer.calls);
    let failing = FailingStore {
        inner: store(&config),
        marker: "unwritable",
    };

    let report = Coordinator::new(&config, renderer, failing)
        .unwrap()
        .run()
        .await
        .unwrap();

    // Links of the unwritable page are still followed
    assert_eq!(calls.lock().unwrap().len(), 4);
    assert_eq!(report.summary.pages_persisted, 3);
    assert_eq!(report.summary.pages_failed, 1);

    let failed = report.failures().next().unwrap();
    assert_eq!(failed.url, format!("{}/guide/intro/unwritable", ORIGIN));
    assert_eq!(failed.title.as_deref(), Some("doc"));
    assert_eq!(
        failed.path.as_deref(),
        Some(dir.path().join("guide_intro_unwritable.html").as_path())
    );
    assert!(matches!(
        failed.outcome,
        PageOutcome::Failed {
            kind: FailureKind::Persistence,
            ..
        }
    ));
    assert!(!dir.path().join("guide_intro_unwritable.html").exists());
}

#[tokio::test]
async fn test_saved_file_matches_rendered_html() {
    let dir = tempfile::tempdir().unwrap();
    let config = create_test_config(dir.path());

    let html = "<html><head><title>浏览器</title></head><body><p>渲染后的内容</p></body></html>";
    let renderer = FakeRenderer::new(vec![(
        "/guide/intro/start",
        Scripted::Page(html.to_string()),
    )]);

    let report = Coordinator::new(&config, renderer, store(&config))
        .unwrap()
        .run()
        .await
        .unwrap();

    let record = &report.records[0];
    let path: &PathBuf = record.path.as_ref().unwrap();
    let saved = std::fs::read(path).unwrap();

    assert_eq!(saved, html.as_bytes());
    assert_eq!(record.bytes, html.len() as u64);
    assert_eq!(report.summary.total_bytes, html.len() as u64);
}

#[tokio::test]
async fn test_summary_reports_absolute_output_dir() {
    let dir = tempfile::tempdir().unwrap();
    let config = create_test_config(dir.path());

    let renderer = FakeRenderer::new(vec![("/guide/intro/start", page(&[]))]);

    let report = Coordinator::new(&config, renderer, store(&config))
        .unwrap()
        .run()
        .await
        .unwrap();

    assert!(report.summary.output_dir.is_absolute());
    assert_eq!(
        report.summary.output_dir,
        std::fs::canonicalize(dir.path()).unwrap()
    );
    assert_eq!(
        report.summary.seed_url,
        format!("{}/guide/intro/start", ORIGIN)
    );
}

#[tokio::test]
async fn test_concurrent_batches_fetch_each_page_once() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = create_test_config(dir.path());
    config.crawler.max_concurrent_pages = 3;

    let renderer = FakeRenderer::new(vec![
        ("/guide/intro/start", page(&["a", "b", "c", "d"])),
        ("/guide/intro/a", page(&["b", "e"])),
        ("/guide/intro/b", page(&["a", "e", "f"])),
        ("/guide/intro/c", Scripted::Timeout),
        ("/guide/intro/d", page(&["start"])),
        ("/guide/intro/e", page(&[])),
        ("/guide/intro/f", page(&["a"])),
    ]);
    let calls = Arc::clone(&renderer.calls);

    let report = Coordinator::new(&config, renderer, store(&config))
        .unwrap()
        .run()
        .await
        .unwrap();

    let mut fetched = calls.lock().unwrap().clone();
    fetched.sort();
    let mut expected = urls(&[
        "/guide/intro/start",
        "/guide/intro/a",
        "/guide/intro/b",
        "/guide/intro/c",
        "/guide/intro/d",
        "/guide/intro/e",
        "/guide/intro/f",
    ]);
    expected.sort();

    assert_eq!(fetched, expected);
    assert_eq!(report.summary.pages_persisted, 6);
    assert_eq!(report.summary.pages_failed, 1);
}

#[tokio::test]
#[ignore = "needs a local Chromium"]
async fn test_live_browser_against_mock_server() {
    use docs_mirror::crawler::run_crawl;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    let server = MockServer::start().await;
    let base = Url::parse(&server.uri()).unwrap();
    let authority = format!("{}:{}", base.host_str().unwrap(), base.port().unwrap());

    Mock::given(method("GET"))
        .and(path("/docs/guide/index.html"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"<html><body><div id="app"></div><script>
                document.getElementById('app').innerHTML =
                    '<a href="/docs/guide/next.html">Next</a>';
            </script></body></html>"#,
            "text/html",
        ))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/docs/guide/next.html"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw("<html><body><p>second</p></body></html>", "text/html"),
        )
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let mut config = Config::default();
    config.crawler.seed_url = format!("{}/docs/guide/index.html", server.uri());
    config.crawler.navigation_timeout = 15_000;
    config.crawler.settle_delay = 100;
    config.scope.host = authority;
    config.scope.path_segment = "docs".to_string();
    config.output.directory = dir.path().to_string_lossy().into_owned();

    let report = tokio::time::timeout(Duration::from_secs(60), run_crawl(&config))
        .await
        .unwrap()
        .unwrap();

    assert!(report.is_complete());
    assert_eq!(report.summary.pages_persisted, 2);

    // The anchor only exists after scripts ran
    let saved = std::fs::read_to_string(dir.path().join("docs_guide_index.html")).unwrap();
    assert!(saved.contains(r#"href="/docs/guide/next.html""#));
    assert!(dir.path().join("docs_guide_next.html").exists());
}
