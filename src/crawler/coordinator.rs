//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the main crawl loop that coordinates all aspects of
//! the crawling process, including:
//! - Preparing the output directory
//! - Managing the frontier queue
//! - Coordinating rendering, persistence, and link expansion
//! - Releasing the browser session on every exit path
//! - Building the run report

use crate::config::{validate, Config};
use crate::crawler::frontier::Frontier;
use crate::crawler::renderer::{BrowserRenderer, RenderError, RenderOptions, RenderedPage, Renderer};
use crate::output::{CrawlReport, CrawlSummary, FailureKind, PageRecord};
use crate::storage::{DirectoryStore, PageStore};
use crate::url::{canonicalize, discover, CrawlTarget, ScopeFilter};
use crate::MirrorError;
use chrono::Utc;
use futures::future::join_all;
use std::path::{Path, PathBuf};
use url::Url;

/// Log a progress line every this many pages
const PROGRESS_INTERVAL: usize = 10;

/// Main crawler coordinator structure
///
/// Owns the frontier and the page records of one run. The renderer and the
/// store are injected so the loop can be driven without a browser.
pub struct Coordinator<R: Renderer, S: PageStore> {
    seed: Url,
    scope: ScopeFilter,
    options: RenderOptions,
    max_concurrent: usize,
    renderer: R,
    store: S,
    frontier: Frontier,
    records: Vec<PageRecord>,
}

impl<R: Renderer, S: PageStore> Coordinator<R, S> {
    /// Creates a new coordinator instance
    ///
    /// # Arguments
    ///
    /// * `config` - The crawler configuration
    /// * `renderer` - Renders pages; closed exactly once by `run`
    /// * `store` - Receives the rendered markup
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Coordinator with the seed queued
    /// * `Err(MirrorError)` - The seed URL is not a usable web URL
    pub fn new(config: &Config, renderer: R, store: S) -> Result<Self, MirrorError> {
        let parsed = Url::parse(&config.crawler.seed_url)?;
        let seed = canonicalize(parsed.as_str(), &parsed)?;

        let frontier = Frontier::with_seed(CrawlTarget::seed(seed.clone()));

        Ok(Self {
            seed,
            scope: ScopeFilter::new(&config.scope),
            options: RenderOptions::from(&config.crawler),
            max_concurrent: config.crawler.max_concurrent_pages.max(1) as usize,
            renderer,
            store,
            frontier,
            records: Vec::new(),
        })
    }

    /// Runs the crawl to completion
    ///
    /// The renderer is closed before this returns, whether the frontier was
    /// exhausted, a session-fatal error aborted the run, or preparing the
    /// output directory failed.
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlReport)` - Every page record plus the summary; `aborted`
    ///   is set when a fatal session error ended the run early
    /// * `Err(MirrorError)` - The run could not start
    pub async fn run(mut self) -> Result<CrawlReport, MirrorError> {
        let started_at = Utc::now();
        tracing::info!("Starting crawl from {}", self.seed);

        let outcome = self.drive().await;

        if let Err(e) = self.renderer.close().await {
            tracing::warn!("Failed to close browser session cleanly: {}", e);
        }

        let aborted = outcome?;
        let finished_at = Utc::now();

        let summary = CrawlSummary::from_records(
            self.seed.as_str(),
            absolute_output_dir(self.store.root()),
            &self.records,
            started_at,
            finished_at,
        );

        match &aborted {
            Some(reason) => tracing::error!(
                "Crawl aborted after {} pages: {}",
                self.records.len(),
                reason
            ),
            None => tracing::info!(
                "Crawl completed: {} pages persisted, {} failed in {}s",
                summary.pages_persisted,
                summary.pages_failed,
                summary.duration_seconds()
            ),
        }

        Ok(CrawlReport {
            summary,
            records: self.records,
            aborted,
        })
    }

    /// The crawl loop; returns the abort reason if the session died
    async fn drive(&mut self) -> Result<Option<String>, MirrorError> {
        self.store.prepare()?;
        tracing::info!("Writing pages to {}", self.store.root().display());

        let start_time = std::time::Instant::now();

        loop {
            let batch = self.next_batch();
            if batch.is_empty() {
                tracing::info!("Frontier is empty, crawl complete");
                return Ok(None);
            }

            for target in &batch {
                tracing::info!("Rendering {}", target.as_str());
            }

            let renderer = &self.renderer;
            let options = &self.options;
            let results = join_all(
                batch
                    .iter()
                    .map(|target| renderer.render(target.url(), options)),
            )
            .await;

            // Results are applied in pop order, so enqueue order is stable
            let mut fatal = None;
            for (target, result) in batch.iter().zip(results) {
                match result {
                    Ok(page) => self.handle_rendered(target, page)?,
                    Err(e) => {
                        if e.is_fatal() && fatal.is_none() {
                            fatal = Some(e.to_string());
                        }
                        self.handle_failure(target, e)?;
                    }
                }

                let processed = self.records.len();
                if processed % PROGRESS_INTERVAL == 0 {
                    let failed = self
                        .records
                        .iter()
                        .filter(|r| !r.outcome.is_success())
                        .count();
                    let rate = processed as f64 / start_time.elapsed().as_secs_f64().max(0.001);
                    tracing::info!(
                        "Progress: {} persisted, {} failed, {} in frontier, {:.2} pages/sec",
                        processed - failed,
                        failed,
                        self.frontier.len(),
                        rate
                    );
                }
            }

            if fatal.is_some() {
                return Ok(fatal);
            }
        }
    }

    /// Pops up to `max_concurrent` targets from the head of the frontier
    fn next_batch(&mut self) -> Vec<CrawlTarget> {
        let mut batch = Vec::with_capacity(self.max_concurrent);
        while batch.len() < self.max_concurrent {
            match self.frontier.next_target() {
                Some(target) => batch.push(target),
                None => break,
            }
        }
        batch
    }

    /// Persists a rendered page and expands the frontier from its links
    fn handle_rendered(
        &mut self,
        target: &CrawlTarget,
        page: RenderedPage,
    ) -> Result<(), MirrorError> {
        let url = target.as_str();

        match self.store.write_page(target.url(), &page.html) {
            Ok(stored) => {
                tracing::info!(
                    "Saved {} -> {} ({} bytes)",
                    url,
                    stored.path.display(),
                    stored.bytes
                );
                self.records.push(
                    PageRecord::persisted(url, stored.path, stored.bytes)
                        .with_title(page.title.clone()),
                );
                self.frontier.mark_visited(url, true)?;
            }
            Err(e) => {
                tracing::warn!("Failed to save {}: {}", url, e);
                let path = self.store_path(target.url());
                self.records.push(
                    PageRecord::failed(
                        url,
                        Some(path),
                        page.html.len() as u64,
                        FailureKind::Persistence,
                        e.to_string(),
                    )
                    .with_title(page.title.clone()),
                );
                self.frontier.mark_visited(url, false)?;
            }
        }

        // Links of a rendered page are followed even if the write failed
        let queued = self.expand(target.url(), &page.links);
        tracing::debug!(
            "{}: {} links, {} newly queued",
            url,
            page.links.len(),
            queued
        );

        Ok(())
    }

    /// Records a page that could not be rendered
    fn handle_failure(&mut self, target: &CrawlTarget, error: RenderError) -> Result<(), MirrorError> {
        let url = target.as_str();
        let kind = failure_kind(&error);

        if error.is_fatal() {
            tracing::error!("Browser session failed while rendering {}: {}", url, error);
        } else {
            tracing::warn!("Failed to render {}: {}", url, error);
        }

        self.records
            .push(PageRecord::failed(url, None, 0, kind, error.to_string()));
        self.frontier.mark_visited(url, false)
    }

    /// Canonicalizes, filters, and enqueues the links found on a page
    ///
    /// Links resolve against the URL that was requested for the page.
    fn expand(&mut self, page_url: &Url, links: &[String]) -> usize {
        let mut queued = 0;

        for raw in links {
            let Some(target) = discover(raw, page_url, &self.scope) else {
                continue;
            };

            if !target.is_in_scope() {
                tracing::trace!("Out of scope: {}", target.as_str());
                continue;
            }

            let url = target.as_str().to_string();
            if self.frontier.offer(target) {
                tracing::debug!("Queued {}", url);
                queued += 1;
            }
        }

        queued
    }

    /// Local path a URL maps to under the store root
    fn store_path(&self, url: &Url) -> PathBuf {
        crate::storage::local_path(self.store.root(), url, self.scope.document_suffix())
    }
}

/// Maps a render error onto the failure kind recorded for the page
fn failure_kind(error: &RenderError) -> FailureKind {
    match error {
        RenderError::Timeout { .. } => FailureKind::Timeout,
        RenderError::Network { .. } => FailureKind::Network,
        RenderError::SessionFatal(_) | RenderError::Launch(_) => FailureKind::SessionFatal,
    }
}

/// Absolute form of the output directory for the summary
fn absolute_output_dir(root: &Path) -> PathBuf {
    if let Ok(path) = std::fs::canonicalize(root) {
        return path;
    }
    match std::env::current_dir() {
        Ok(cwd) => cwd.join(root),
        Err(_) => root.to_path_buf(),
    }
}

/// Runs the main crawl operation
///
/// This function orchestrates the entire crawl process:
///
/// 1. Launch one browser session
/// 2. Prepare the output directory
/// 3. Render, persist, and expand pages breadth-first from the seed
/// 4. Close the browser session
/// 5. Return the run report
///
/// # Arguments
///
/// * `config` - The crawler configuration
///
/// # Returns
///
/// * `Ok(CrawlReport)` - Crawl finished, possibly aborted early
/// * `Err(MirrorError)` - The browser could not be launched or the output
///   directory could not be created
///
/// # Example
///
/// ```no_run
/// use docs_mirror::config::load_config;
/// use docs_mirror::crawler::run_crawl;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("config.toml"))?;
/// let report = run_crawl(&config).await?;
/// println!("{} pages saved", report.summary.pages_persisted);
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(config: &Config) -> Result<CrawlReport, MirrorError> {
    validate(config)?;

    let scope = ScopeFilter::new(&config.scope);
    let store = DirectoryStore::new(&config.output.directory, scope.document_suffix());

    let renderer = BrowserRenderer::launch(
        &config.browser,
        config.crawler.navigation_timeout(),
        config.crawler.max_concurrent_pages.max(1) as usize,
    )
    .await?;

    Coordinator::new(config, renderer, store)?.run().await
}
