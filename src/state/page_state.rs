/// Page state definitions for tracking crawl progress
///
/// Every URL moves along `Discovered -> Queued -> Fetching` and ends in
/// exactly one of the terminal states `Persisted` or `Failed`. There are no
/// retries, so a terminal state is final for the lifetime of a run.
use std::fmt;

/// Represents the current state of a page in the crawl process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageState {
    // ===== Active States =====
    /// Link has been canonicalized and classified but not yet queued
    Discovered,

    /// Page is in the frontier waiting to be rendered
    Queued,

    /// Page is being rendered and written
    Fetching,

    // ===== Terminal States =====
    /// Rendered markup was written to the output directory
    Persisted,

    /// Rendering or writing failed; never retried in this run
    Failed,
}

impl PageState {
    /// Returns true if this is a terminal state (no further processing needed)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Persisted | Self::Failed)
    }

    /// Returns true if the state machine allows moving from `self` to `next`
    pub fn can_transition_to(&self, next: PageState) -> bool {
        matches!(
            (self, next),
            (Self::Discovered, Self::Queued)
                | (Self::Queued, Self::Fetching)
                | (Self::Fetching, Self::Persisted)
                | (Self::Fetching, Self::Failed)
        )
    }

    /// Stable lowercase name, used in logs and reports
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Discovered => "discovered",
            Self::Queued => "queued",
            Self::Fetching => "fetching",
            Self::Persisted => "persisted",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for PageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
