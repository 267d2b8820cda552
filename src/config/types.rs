use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Docs-Mirror
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub scope: ScopeConfig,
    #[serde(default)]
    pub browser: BrowserConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// The page the crawl starts from; assumed canonical and in scope
    #[serde(rename = "seed-url")]
    pub seed_url: String,

    /// Hard bound on navigation plus network quiescence (milliseconds)
    #[serde(rename = "navigation-timeout")]
    pub navigation_timeout: u64,

    /// Fixed pause after quiescence before capturing markup (milliseconds)
    #[serde(rename = "settle-delay")]
    pub settle_delay: u64,

    /// How long the resource count must hold steady to count as idle (milliseconds)
    #[serde(rename = "network-idle-window")]
    pub network_idle_window: u64,

    /// Number of pages rendered at once; 1 keeps strict breadth-first order
    #[serde(rename = "max-concurrent-pages")]
    pub max_concurrent_pages: u32,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            seed_url: "https://interview.poetries.top/fe-base-docs/browser/part1".to_string(),
            navigation_timeout: 30_000,
            settle_delay: 2_000,
            network_idle_window: 500,
            max_concurrent_pages: 1,
        }
    }
}

impl CrawlerConfig {
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_millis(self.navigation_timeout)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay)
    }

    pub fn network_idle_window(&self) -> Duration {
        Duration::from_millis(self.network_idle_window)
    }
}

/// Which URLs are eligible for fetching
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScopeConfig {
    /// Exact host (optionally with `:port`) a URL must have
    pub host: String,

    /// Substring the URL path must contain
    #[serde(rename = "path-segment")]
    pub path_segment: String,

    /// Path suffixes that always denote a document; the first is also the
    /// suffix appended to local file names
    #[serde(rename = "document-extensions")]
    pub document_extensions: Vec<String>,

    /// Path suffixes that never denote a document
    #[serde(rename = "asset-extensions")]
    pub asset_extensions: Vec<String>,

    /// Minimum number of `/` in an un-suffixed path for it to count as a document
    #[serde(rename = "min-path-separators")]
    pub min_path_separators: usize,
}

impl Default for ScopeConfig {
    fn default() -> Self {
        Self {
            host: "interview.poetries.top".to_string(),
            path_segment: "fe-base-docs".to_string(),
            document_extensions: vec![".html".to_string()],
            asset_extensions: [".js", ".css", ".png", ".jpg", ".gif"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            min_path_separators: 3,
        }
    }
}

/// Headless browser launch configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Run without a visible window
    pub headless: bool,

    /// Extra command-line arguments passed to the browser
    pub args: Vec<String>,

    /// Browser binary; detected automatically when absent
    pub executable: Option<String>,

    #[serde(rename = "window-width")]
    pub window_width: u32,

    #[serde(rename = "window-height")]
    pub window_height: u32,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            args: vec!["--no-sandbox".to_string()],
            executable: None,
            window_width: 1280,
            window_height: 800,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Flat directory receiving one file per persisted page
    pub directory: String,

    /// Optional markdown report of the run
    #[serde(rename = "report-path")]
    pub report_path: Option<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: "fe_docs_html".to_string(),
            report_path: None,
        }
    }
}
