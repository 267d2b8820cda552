use crate::config::ScopeConfig;
use crate::url::domain::extract_authority;
use url::Url;

/// Decides which URLs belong to the mirrored document set
///
/// A URL is in scope when all of the following hold:
///
/// 1. Its authority equals the configured host exactly (no subdomains)
/// 2. Its path *contains* the configured path segment (substring match, not
///    a prefix match, so routes like `/x/fe-base-docs/...` are admitted too)
/// 3. Its path either ends in a document extension, or has at least
///    `min_path_separators` slashes and does not end in an asset extension
///
/// Rule 3 exists because the target site serves un-suffixed routes such as
/// `/fe-base-docs/browser/part1`. It trades precision for recall: assets
/// with extensions missing from the asset list (`.svg`, `.jpeg`, `.woff2`)
/// are admitted, and documents shallower than the separator threshold are
/// rejected. Extension checks are case-sensitive.
#[derive(Debug, Clone)]
pub struct ScopeFilter {
    host: String,
    path_segment: String,
    document_extensions: Vec<String>,
    asset_extensions: Vec<String>,
    min_path_separators: usize,
}

impl ScopeFilter {
    /// Builds a filter from the scope configuration
    pub fn new(config: &ScopeConfig) -> Self {
        Self {
            host: config.host.to_lowercase(),
            path_segment: config.path_segment.clone(),
            document_extensions: config.document_extensions.clone(),
            asset_extensions: config.asset_extensions.clone(),
            min_path_separators: config.min_path_separators,
        }
    }

    /// Returns true if the URL denotes an in-scope document
    ///
    /// # Examples
    ///
    /// ```
    /// use docs_mirror::config::ScopeConfig;
    /// use docs_mirror::url::ScopeFilter;
    /// use url::Url;
    ///
    /// let filter = ScopeFilter::new(&ScopeConfig::default());
    /// let page = Url::parse("https://interview.poetries.top/fe-base-docs/browser/part1").unwrap();
    /// let logo = Url::parse("https://interview.poetries.top/fe-base-docs/browser/logo.png").unwrap();
    /// assert!(filter.in_scope(&page));
    /// assert!(!filter.in_scope(&logo));
    /// ```
    pub fn in_scope(&self, url: &Url) -> bool {
        match extract_authority(url) {
            Some(authority) if authority == self.host => {}
            _ => return false,
        }

        let path = url.path();
        if !path.contains(self.path_segment.as_str()) {
            return false;
        }

        self.is_document_path(path)
    }

    /// String form of [`ScopeFilter::in_scope`]; malformed input is out of scope
    pub fn in_scope_str(&self, url: &str) -> bool {
        match Url::parse(url) {
            Ok(parsed) => self.in_scope(&parsed),
            Err(_) => false,
        }
    }

    /// The suffix appended to local file names of un-suffixed routes
    pub fn document_suffix(&self) -> &str {
        self.document_extensions
            .first()
            .map(String::as_str)
            .unwrap_or(".html")
    }

    fn is_document_path(&self, path: &str) -> bool {
        if self
            .document_extensions
            .iter()
            .any(|ext| path.ends_with(ext.as_str()))
        {
            return true;
        }

        let separators = path.matches('/').count();
        separators >= self.min_path_separators
            && !self
                .asset_extensions
                .iter()
                .any(|ext| path.ends_with(ext.as_str()))
    }
}
