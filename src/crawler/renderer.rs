//! Headless browser renderer
//!
//! This module drives Chromium over the DevTools protocol:
//! - Launching one browser for the whole run
//! - Navigating pooled tabs to each page (fresh navigation, same process)
//! - Waiting for network quiescence, then a fixed settle delay
//! - Capturing the rendered markup and its anchors
//! - Classifying failures as per-page or session-fatal

use crate::config::{BrowserConfig, CrawlerConfig};
use crate::crawler::parser::parse_html;
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig as CdpConfig};
use chromiumoxide::cdp::browser_protocol::network::{
    EnableParams, EventLoadingFailed, EventLoadingFinished, EventRequestWillBeSent,
};
use chromiumoxide::error::CdpError;
use chromiumoxide::Page;
use futures::stream::{self, BoxStream, Stream};
use futures::StreamExt;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::{Mutex, Semaphore};
use tokio::task::JoinHandle;
use url::Url;

/// Errors produced while rendering a page
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Timed out rendering {url} after {timeout:?}")]
    Timeout { url: String, timeout: Duration },

    #[error("Navigation to {url} failed: {message}")]
    Network { url: String, message: String },

    #[error("Browser session lost: {0}")]
    SessionFatal(String),

    #[error("Failed to launch browser: {0}")]
    Launch(String),
}

impl RenderError {
    /// Returns true if the error ends the whole run rather than one page
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::SessionFatal(_) | Self::Launch(_))
    }
}

/// Timing parameters of a single render
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    /// Bound on navigation plus network quiescence
    pub timeout: Duration,

    /// Fixed pause after quiescence, before capture
    pub settle_delay: Duration,

    /// How long the network must stay quiet to count as idle
    pub idle_window: Duration,
}

impl From<&CrawlerConfig> for RenderOptions {
    fn from(config: &CrawlerConfig) -> Self {
        Self {
            timeout: config.navigation_timeout(),
            settle_delay: config.settle_delay(),
            idle_window: config.network_idle_window(),
        }
    }
}

/// Markup and anchors captured from a rendered page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderedPage {
    /// Serialized DOM at capture time
    pub html: String,

    /// Raw `href` of every anchor present at capture time
    pub links: Vec<String>,

    pub title: Option<String>,
}

/// Something that can turn a URL into rendered markup
///
/// One renderer instance serves a whole run. A per-page failure must leave
/// it usable for the next call; `close` is called exactly once at the end.
#[async_trait]
pub trait Renderer: Send + Sync {
    async fn render(&self, url: &Url, options: &RenderOptions) -> Result<RenderedPage, RenderError>;

    async fn close(&self) -> Result<(), RenderError>;
}

/// Chromium-backed renderer
///
/// Tabs are pooled: a tab that finished (or timed out on) one page is
/// navigated to the next, so per-page state is reset by navigation instead
/// of by restarting the browser. At most `max_pages` tabs render at once.
pub struct BrowserRenderer {
    browser: Mutex<Option<Browser>>,
    handler: Mutex<Option<JoinHandle<()>>>,
    alive: Arc<AtomicBool>,
    idle_pages: Mutex<Vec<Page>>,
    permits: Semaphore,
}

impl BrowserRenderer {
    /// Launches the browser
    ///
    /// # Arguments
    ///
    /// * `config` - Browser launch settings
    /// * `request_timeout` - Upper bound for any single DevTools request
    /// * `max_pages` - Maximum number of pages rendered concurrently
    pub async fn launch(
        config: &BrowserConfig,
        request_timeout: Duration,
        max_pages: usize,
    ) -> Result<Self, RenderError> {
        let mut builder = CdpConfig::builder()
            .window_size(config.window_width, config.window_height)
            .request_timeout(request_timeout)
            .args(config.args.iter());

        if !config.headless {
            builder = builder.with_head();
        }
        if let Some(executable) = &config.executable {
            builder = builder.chrome_executable(executable);
        }

        let cdp_config = builder.build().map_err(RenderError::Launch)?;

        let (browser, mut handler) = Browser::launch(cdp_config)
            .await
            .map_err(|e| RenderError::Launch(e.to_string()))?;

        let alive = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&alive);
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!("Browser handler error: {}", e);
                }
            }
            flag.store(false, Ordering::SeqCst);
            tracing::debug!("Browser handler stopped");
        });

        tracing::info!(
            "Browser launched (headless: {}, max pages: {})",
            config.headless,
            max_pages
        );

        Ok(Self {
            browser: Mutex::new(Some(browser)),
            handler: Mutex::new(Some(handler_task)),
            alive,
            idle_pages: Mutex::new(Vec::new()),
            permits: Semaphore::new(max_pages.max(1)),
        })
    }

    fn ensure_alive(&self) -> Result<(), RenderError> {
        if self.alive.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(RenderError::SessionFatal(
                "browser connection closed".to_string(),
            ))
        }
    }

    /// Takes an idle tab from the pool, opening a new one if none is free
    async fn checkout_page(&self) -> Result<Page, RenderError> {
        if let Some(page) = self.idle_pages.lock().await.pop() {
            return Ok(page);
        }

        let guard = self.browser.lock().await;
        let browser = guard
            .as_ref()
            .ok_or_else(|| RenderError::SessionFatal("browser already closed".to_string()))?;

        browser
            .new_page("about:blank")
            .await
            .map_err(|e| RenderError::SessionFatal(format!("cannot open tab: {}", e)))
    }

    async fn render_on(
        &self,
        page: &Page,
        url: &Url,
        options: &RenderOptions,
    ) -> Result<RenderedPage, RenderError> {
        let navigation = async {
            // Subscribe first so the document request itself is counted
            let events = network_events(page).await?;
            page.goto(url.as_str()).await?;
            wait_for_network_idle(events, options.idle_window).await
        };

        match tokio::time::timeout(options.timeout, navigation).await {
            Err(_) => {
                return Err(RenderError::Timeout {
                    url: url.to_string(),
                    timeout: options.timeout,
                })
            }
            Ok(Err(e)) => return Err(self.classify(url, options, e)),
            Ok(Ok(())) => {}
        }

        // Let deferred client-side rendering finish
        tokio::time::sleep(options.settle_delay).await;

        let html = page
            .content()
            .await
            .map_err(|e| self.classify(url, options, e))?;
        let parsed = parse_html(&html);

        Ok(RenderedPage {
            html,
            links: parsed.links,
            title: parsed.title,
        })
    }

    /// Maps a DevTools error to a per-page or session-level failure
    fn classify(&self, url: &Url, options: &RenderOptions, error: CdpError) -> RenderError {
        if !self.alive.load(Ordering::SeqCst) {
            return RenderError::SessionFatal(error.to_string());
        }

        match error {
            CdpError::Timeout => RenderError::Timeout {
                url: url.to_string(),
                timeout: options.timeout,
            },
            CdpError::Ws(_) | CdpError::ChannelSendError(_) | CdpError::NoResponse => {
                RenderError::SessionFatal(error.to_string())
            }
            other => RenderError::Network {
                url: url.to_string(),
                message: other.to_string(),
            },
        }
    }
}

#[async_trait]
impl Renderer for BrowserRenderer {
    async fn render(&self, url: &Url, options: &RenderOptions) -> Result<RenderedPage, RenderError> {
        self.ensure_alive()?;

        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| RenderError::SessionFatal("renderer is closed".to_string()))?;

        let page = self.checkout_page().await?;
        let result = self.render_on(&page, url, options).await;

        match &result {
            Err(e) if e.is_fatal() => {}
            _ => self.idle_pages.lock().await.push(page),
        }

        result
    }

    async fn close(&self) -> Result<(), RenderError> {
        self.permits.close();

        for page in self.idle_pages.lock().await.drain(..) {
            if let Err(e) = page.close().await {
                tracing::debug!("Page close error: {}", e);
            }
        }

        let mut result = Ok(());
        if let Some(mut browser) = self.browser.lock().await.take() {
            if self.alive.load(Ordering::SeqCst) {
                if let Err(e) = browser.close().await {
                    result = Err(RenderError::SessionFatal(format!(
                        "browser close failed: {}",
                        e
                    )));
                }
            }
            if let Err(e) = browser.wait().await {
                tracing::debug!("Browser wait error: {}", e);
            }
            tracing::info!("Browser closed");
        }

        if let Some(handler) = self.handler.lock().await.take() {
            handler.abort();
        }

        result
    }
}

/// Request lifecycle events of one tab, keyed by DevTools request id
#[derive(Debug, Clone, PartialEq, Eq)]
enum NetworkEvent {
    Started(String),
    Finished(String),
}

/// Requests the page has started and not yet finished
///
/// Finished and failed loads both end a request. A redirect reuses its
/// request id, so a repeated start is not counted twice.
#[derive(Debug, Default)]
struct InFlight {
    pending: HashSet<String>,
    done: HashSet<String>,
}

impl InFlight {
    fn apply(&mut self, event: NetworkEvent) {
        match event {
            NetworkEvent::Started(id) => {
                // The three listeners are merged, so an end can overtake its start
                if !self.done.contains(&id) {
                    self.pending.insert(id);
                }
            }
            NetworkEvent::Finished(id) => {
                self.pending.remove(&id);
                self.done.insert(id);
            }
        }
    }

    fn is_idle(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Subscribes to the tab's request start, finish, and failure events
async fn network_events(page: &Page) -> Result<BoxStream<'static, NetworkEvent>, CdpError> {
    page.execute(EnableParams::default()).await?;

    let started = page
        .event_listener::<EventRequestWillBeSent>()
        .await?
        .map(|e| NetworkEvent::Started(e.request_id.inner().clone()));
    let finished = page
        .event_listener::<EventLoadingFinished>()
        .await?
        .map(|e| NetworkEvent::Finished(e.request_id.inner().clone()));
    let failed = page
        .event_listener::<EventLoadingFailed>()
        .await?
        .map(|e| NetworkEvent::Finished(e.request_id.inner().clone()));

    Ok(stream::select_all([started.boxed(), finished.boxed(), failed.boxed()]).boxed())
}

/// Waits until no request has been in flight for `window`
///
/// A request that never completes (a long poll, a stalled fetch) keeps the
/// page busy; the caller's navigation timeout bounds that case.
async fn wait_for_network_idle<S>(mut events: S, window: Duration) -> Result<(), CdpError>
where
    S: Stream<Item = NetworkEvent> + Unpin,
{
    let mut in_flight = InFlight::default();
    let mut quiet_since = Instant::now();

    loop {
        let event = if in_flight.is_idle() {
            let remaining = window.saturating_sub(quiet_since.elapsed());
            match tokio::time::timeout(remaining, events.next()).await {
                Err(_) => return Ok(()),
                Ok(event) => event,
            }
        } else {
            events.next().await
        };

        // The listeners only end when the tab or the connection goes away
        let event = event.ok_or(CdpError::NoResponse)?;

        let was_idle = in_flight.is_idle();
        in_flight.apply(event);
        if !was_idle && in_flight.is_idle() {
            quiet_since = Instant::now();
        }
    }
}
