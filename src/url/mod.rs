//! URL handling module for Docs-Mirror
//!
//! This module provides link canonicalization, authority extraction and the
//! scope predicate that decides which pages belong to the mirror.

mod canonical;
mod domain;
mod scope;

// Re-export main functions
pub use canonical::canonicalize;
pub use domain::extract_authority;
pub use scope::ScopeFilter;

use url::Url;

/// Scope classification of a discovered URL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopeClass {
    /// Same host, same document subtree, document-shaped path
    Document,
    /// Anything else - never fetched
    OutOfScope,
}

impl ScopeClass {
    /// Returns true if pages of this class should be fetched
    pub fn should_crawl(&self) -> bool {
        matches!(self, Self::Document)
    }
}

/// A canonical URL together with its scope classification
///
/// Targets are classified once, when the link is discovered, and are never
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CrawlTarget {
    url: Url,
    class: ScopeClass,
}

impl CrawlTarget {
    /// Classifies a canonical URL against the scope filter
    pub fn classify(url: Url, filter: &ScopeFilter) -> Self {
        let class = if filter.in_scope(&url) {
            ScopeClass::Document
        } else {
            ScopeClass::OutOfScope
        };
        Self { url, class }
    }

    /// Wraps the crawl seed; the seed is trusted and not re-validated
    pub fn seed(url: Url) -> Self {
        Self {
            url,
            class: ScopeClass::Document,
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }

    pub fn class(&self) -> ScopeClass {
        self.class
    }

    pub fn is_in_scope(&self) -> bool {
        self.class.should_crawl()
    }
}

/// Canonicalizes a raw link found on `page` and classifies it
///
/// Returns `None` for links that cannot be canonicalized; those are
/// extraction noise and are dropped without a record.
pub fn discover(raw: &str, page: &Url, filter: &ScopeFilter) -> Option<CrawlTarget> {
    match canonicalize(raw, page) {
        Ok(url) => Some(CrawlTarget::classify(url, filter)),
        Err(e) => {
            tracing::trace!("Dropping link '{}' on {}: {}", raw, page, e);
            None
        }
    }
}
