//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `PageState`: the per-URL state machine (discovered, queued, fetching,
//!   persisted, failed)

mod page_state;

pub use page_state::PageState;
