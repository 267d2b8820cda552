use crate::config::types::{BrowserConfig, Config, CrawlerConfig, OutputConfig, ScopeConfig};
use crate::ConfigError;
use url::Url;

/// Upper bound on concurrently open browser pages
const MAX_CONCURRENT_PAGES: u32 = 16;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_scope_config(&config.scope)?;
    validate_browser_config(&config.browser)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    let seed = Url::parse(&config.seed_url).map_err(|e| {
        ConfigError::InvalidUrl(format!("Invalid seed URL '{}': {}", config.seed_url, e))
    })?;

    if seed.scheme() != "http" && seed.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "Seed URL '{}' must use http or https",
            config.seed_url
        )));
    }

    if seed.host_str().is_none() {
        return Err(ConfigError::InvalidUrl(format!(
            "Seed URL '{}' has no host",
            config.seed_url
        )));
    }

    if config.navigation_timeout < 1000 {
        return Err(ConfigError::Validation(format!(
            "navigation-timeout must be >= 1000ms, got {}ms",
            config.navigation_timeout
        )));
    }

    if config.network_idle_window >= config.navigation_timeout {
        return Err(ConfigError::Validation(format!(
            "network-idle-window ({}ms) must be shorter than navigation-timeout ({}ms)",
            config.network_idle_window, config.navigation_timeout
        )));
    }

    if config.max_concurrent_pages < 1 || config.max_concurrent_pages > MAX_CONCURRENT_PAGES {
        return Err(ConfigError::Validation(format!(
            "max-concurrent-pages must be between 1 and {}, got {}",
            MAX_CONCURRENT_PAGES, config.max_concurrent_pages
        )));
    }

    Ok(())
}

/// Validates scope configuration
fn validate_scope_config(config: &ScopeConfig) -> Result<(), ConfigError> {
    if config.host.is_empty() {
        return Err(ConfigError::InvalidScope("host cannot be empty".to_string()));
    }

    if config.host.contains("://") || config.host.contains('/') {
        return Err(ConfigError::InvalidScope(format!(
            "host must be a bare host name (optionally with :port), got '{}'",
            config.host
        )));
    }

    if config.path_segment.is_empty() {
        return Err(ConfigError::InvalidScope(
            "path-segment cannot be empty".to_string(),
        ));
    }

    if config.document_extensions.is_empty() {
        return Err(ConfigError::InvalidScope(
            "at least one document extension is required".to_string(),
        ));
    }

    for ext in config
        .document_extensions
        .iter()
        .chain(config.asset_extensions.iter())
    {
        validate_extension(ext)?;
    }

    Ok(())
}

/// Extensions are matched as path suffixes and must include the dot
fn validate_extension(ext: &str) -> Result<(), ConfigError> {
    if ext.len() < 2 || !ext.starts_with('.') || ext.contains('/') {
        return Err(ConfigError::InvalidScope(format!(
            "extension must look like '.html', got '{}'",
            ext
        )));
    }
    Ok(())
}

/// Validates browser configuration
fn validate_browser_config(config: &BrowserConfig) -> Result<(), ConfigError> {
    if config.window_width == 0 || config.window_height == 0 {
        return Err(ConfigError::Validation(format!(
            "window size must be non-zero, got {}x{}",
            config.window_width, config.window_height
        )));
    }

    if let Some(executable) = &config.executable {
        if executable.is_empty() {
            return Err(ConfigError::Validation(
                "executable cannot be empty when set".to_string(),
            ));
        }
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.directory.is_empty() {
        return Err(ConfigError::Validation(
            "output directory cannot be empty".to_string(),
        ));
    }

    if let Some(report) = &config.report_path {
        if report.is_empty() {
            return Err(ConfigError::Validation(
                "report-path cannot be empty when set".to_string(),
            ));
        }
    }

    Ok(())
}
