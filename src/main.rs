//! Docs-Mirror main entry point
//!
//! This is the command-line interface for the rendered documentation mirror.

use anyhow::Context;
use clap::Parser;
use docs_mirror::config::{load_config_with_hash, validate, Config};
use docs_mirror::crawler::crawl;
use docs_mirror::output::{generate_markdown_report, print_summary};
use docs_mirror::postprocess::{rewrite_directory, verify_directory, LAZY_MARKERS};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Docs-Mirror: a rendered documentation mirror
///
/// Docs-Mirror renders every page of one documentation subtree in a
/// headless browser and saves the resulting HTML into a flat directory.
#[derive(Parser, Debug)]
#[command(name = "docs-mirror")]
#[command(version = "1.0.0")]
#[command(about = "Mirror a client-rendered documentation site", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (built-in defaults when omitted)
    #[arg(value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Override the crawl seed URL
    #[arg(long, value_name = "URL")]
    seed: Option<String>,

    /// Override the output directory
    #[arg(short, long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Override the number of pages rendered at once
    #[arg(long, value_name = "N")]
    concurrency: Option<u32>,

    /// Show the browser window
    #[arg(long)]
    headful: bool,

    /// Write a markdown report of the run to this path
    #[arg(long, value_name = "PATH")]
    report: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Rewrite deferred image loading in every HTML file of DIR and exit
    #[arg(long, value_name = "DIR", conflicts_with = "verify")]
    rewrite_lazy: Option<PathBuf>,

    /// Report HTML files in DIR that still defer image loading and exit
    #[arg(long, value_name = "DIR", conflicts_with = "rewrite_lazy")]
    verify: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    if let Some(dir) = &cli.rewrite_lazy {
        return handle_rewrite(dir);
    }
    if let Some(dir) = &cli.verify {
        return handle_verify(dir);
    }

    let config = load(&cli)?;
    handle_crawl(&config, cli.report.as_deref()).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("docs_mirror=info,warn"),
            1 => EnvFilter::new("docs_mirror=debug,info"),
            2 => EnvFilter::new("docs_mirror=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Loads the configuration file (if any) and applies command-line overrides
fn load(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => {
            tracing::info!("No configuration file given, using defaults");
            Config::default()
        }
    };

    if let Some(seed) = &cli.seed {
        config.crawler.seed_url = seed.clone();
    }
    if let Some(dir) = &cli.output_dir {
        config.output.directory = dir.to_string_lossy().into_owned();
    }
    if let Some(n) = cli.concurrency {
        config.crawler.max_concurrent_pages = n;
    }
    if cli.headful {
        config.browser.headless = false;
    }

    validate(&config).context("Invalid configuration")?;
    Ok(config)
}

/// Handles the main crawl operation
async fn handle_crawl(config: &Config, report_path: Option<&Path>) -> anyhow::Result<ExitCode> {
    tracing::info!(
        "Mirroring {} (host: {}, subtree: {})",
        config.crawler.seed_url,
        config.scope.host,
        config.scope.path_segment
    );

    let report = crawl(config).await.context("Crawl failed")?;

    print_summary(&report);

    let report_path = report_path
        .map(Path::to_path_buf)
        .or_else(|| config.output.report_path.as_ref().map(PathBuf::from));
    if let Some(path) = report_path {
        generate_markdown_report(&report, &path)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
        println!("Report written to: {}", path.display());
    }

    if report.is_complete() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

/// Handles the --rewrite-lazy mode
fn handle_rewrite(dir: &Path) -> anyhow::Result<ExitCode> {
    println!("=== Rewriting deferred images ===\n");
    println!("Directory: {}", dir.display());

    let report = rewrite_directory(dir)?;

    println!("HTML files: {}", report.files_seen);
    println!("Files changed: {}", report.files_rewritten);
    println!(
        "Images changed: {} of {}",
        report.stats.images_changed, report.stats.images
    );
    if report.files_failed > 0 {
        println!("Files failed: {}", report.files_failed);
        return Ok(ExitCode::FAILURE);
    }

    Ok(ExitCode::SUCCESS)
}

/// Handles the --verify mode
fn handle_verify(dir: &Path) -> anyhow::Result<ExitCode> {
    println!("=== Verifying deferred image rewrite ===\n");
    println!("Directory: {}", dir.display());
    println!("Markers: {}", LAZY_MARKERS.join(", "));
    println!();

    let report = verify_directory(dir)?;

    for file in &report.files {
        let name = file.path.display();
        match (&file.error, file.residual) {
            (Some(e), _) => println!("  ! {}: unreadable ({})", name, e),
            (None, Some(marker)) => println!("  x {}: still contains {}", name, marker),
            (None, None) => println!("  ✓ {}", name),
        }
    }

    println!();
    println!("Checked: {}", report.checked());
    println!("Clean: {}", report.clean());

    if report.is_clean() {
        Ok(ExitCode::SUCCESS)
    } else {
        println!("{} files still defer image loading", report.dirty());
        Ok(ExitCode::FAILURE)
    }
}
