//! Frontier and visited-set management
//!
//! The frontier is a FIFO queue of pending targets, which makes the crawl
//! breadth-first. Every URL that ever entered the queue has an entry in the
//! state table, so a URL is admitted at most once per run: a second offer is
//! rejected whether the first copy is still queued, in flight, or finished.

use crate::state::PageState;
use crate::url::CrawlTarget;
use crate::MirrorError;
use std::collections::{HashMap, VecDeque};

/// Pending work plus the state of every URL seen in this run
#[derive(Debug, Default)]
pub struct Frontier {
    /// Targets waiting to be rendered, in discovery order
    queue: VecDeque<CrawlTarget>,

    /// State of every admitted URL, keyed by canonical URL
    states: HashMap<String, PageState>,
}

impl Frontier {
    /// Creates an empty frontier
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a frontier holding only the seed
    pub fn with_seed(seed: CrawlTarget) -> Self {
        let mut frontier = Self::new();
        frontier.offer(seed);
        frontier
    }

    /// Admits a target unless it is out of scope or already known
    ///
    /// # Returns
    ///
    /// `true` if the target was appended to the queue
    pub fn offer(&mut self, target: CrawlTarget) -> bool {
        if !target.is_in_scope() || self.states.contains_key(target.as_str()) {
            return false;
        }

        // Discovered -> Queued happens atomically at admission
        self.states
            .insert(target.as_str().to_string(), PageState::Queued);
        self.queue.push_back(target);
        true
    }

    /// Removes the head of the queue and marks it as fetching
    ///
    /// Entries that already reached a terminal state are skipped.
    pub fn next_target(&mut self) -> Option<CrawlTarget> {
        while let Some(target) = self.queue.pop_front() {
            if self.is_visited(target.as_str()) {
                tracing::debug!("Skipping already visited {}", target.as_str());
                continue;
            }

            if self.transition(target.as_str(), PageState::Fetching).is_ok() {
                return Some(target);
            }
        }
        None
    }

    /// Moves a URL to `next`, enforcing the page state machine
    pub fn transition(&mut self, url: &str, next: PageState) -> Result<(), MirrorError> {
        // Unknown URLs are implicitly Discovered
        let current = self
            .states
            .get(url)
            .copied()
            .unwrap_or(PageState::Discovered);

        if !current.can_transition_to(next) {
            return Err(MirrorError::InvalidTransition {
                url: url.to_string(),
                from: current,
                to: next,
            });
        }

        self.states.insert(url.to_string(), next);
        Ok(())
    }

    /// Records the terminal outcome of a fetched URL
    pub fn mark_visited(&mut self, url: &str, success: bool) -> Result<(), MirrorError> {
        let next = if success {
            PageState::Persisted
        } else {
            PageState::Failed
        };
        self.transition(url, next)
    }

    /// Returns true if the URL has reached a terminal state
    pub fn is_visited(&self, url: &str) -> bool {
        self.states.get(url).map_or(false, |s| s.is_terminal())
    }

    /// Number of targets waiting
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
