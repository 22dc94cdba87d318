//! Output module for crawl counters, summaries and progress display
//!
//! This module handles:
//! - Counting per-candidate outcomes for each page and for the whole run
//! - Printing the end-of-run summary
//! - Drawing download progress in the terminal

mod progress;
pub mod stats;

pub use progress::BarProgress;
pub use stats::{print_summary, CrawlStats};
