//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `CrawlState`: the durable cursor and completed-id set persisted between runs
//! - `DownloadOutcome` / `SkipReason`: what happened to each resolved document

mod crawl_state;
mod outcome;

// Re-export main types
pub use crawl_state::CrawlState;
pub use outcome::{DownloadOutcome, SkipReason};
