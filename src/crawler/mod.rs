//! Crawler module for rendering and mirroring pages
//!
//! This module contains the core crawling logic, including:
//! - Headless browser rendering
//! - HTML parsing and link extraction
//! - Frontier and visited-set management
//! - Overall crawl coordination

mod coordinator;
mod frontier;
mod parser;
mod renderer;

pub use coordinator::{run_crawl, Coordinator};
pub use frontier::Frontier;
pub use parser::{parse_html, ParsedPage};
pub use renderer::{BrowserRenderer, RenderError, RenderOptions, RenderedPage, Renderer};

use crate::config::Config;
use crate::output::CrawlReport;
use crate::MirrorError;

/// Runs a complete crawl operation
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Launch the browser
/// 2. Create the output directory
/// 3. Render the seed and every in-scope page reachable from it
/// 4. Write each page's rendered HTML once
/// 5. Close the browser and return the run report
///
/// # Arguments
///
/// * `config` - The crawler configuration
///
/// # Returns
///
/// * `Ok(CrawlReport)` - Crawl finished; check `aborted` for early exits
/// * `Err(MirrorError)` - Crawl could not start
pub async fn crawl(config: &Config) -> Result<CrawlReport, MirrorError> {
    run_crawl(config).await
}
