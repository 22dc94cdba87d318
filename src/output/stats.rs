//! Crawl counters and their summaries

use crate::state::{DownloadOutcome, SkipReason};

/// Running counts of what happened to candidates
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlStats {
    /// Candidates considered
    pub attempted: u64,

    /// Files saved in this run
    pub downloaded: u64,

    /// Candidates skipped: already on disk, already completed, duplicates
    /// and candidates that did not resolve to a PDF
    pub skipped: u64,

    /// Download attempts that failed on the network or on validation
    pub failed: u64,

    /// Subset of `skipped` that could not be resolved to a PDF
    pub unresolved: u64,

    /// Bytes written to disk in this run
    pub bytes: u64,
}

impl CrawlStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one download outcome
    pub fn record(&mut self, outcome: &DownloadOutcome, bytes: u64) {
        self.attempted += 1;
        match outcome {
            DownloadOutcome::Saved => {
                self.downloaded += 1;
                self.bytes += bytes;
            }
            DownloadOutcome::Skipped(_) => self.skipped += 1,
            DownloadOutcome::Failed(_) => self.failed += 1,
        }
    }

    /// Counts a candidate skipped before any download
    pub fn record_skip(&mut self, reason: SkipReason) {
        self.record(&DownloadOutcome::Skipped(reason), 0);
    }

    /// Counts a candidate whose PDF could not be resolved
    pub fn record_unresolved(&mut self) {
        self.attempted += 1;
        self.skipped += 1;
        self.unresolved += 1;
    }

    pub fn merge(&mut self, other: &CrawlStats) {
        self.attempted += other.attempted;
        self.downloaded += other.downloaded;
        self.skipped += other.skipped;
        self.failed += other.failed;
        self.unresolved += other.unresolved;
        self.bytes += other.bytes;
    }

    /// One-line summary, shared by the per-page log and the final report
    pub fn summary_line(&self) -> String {
        format!(
            "attempted {}, downloaded {}, skipped {}, failed {}",
            self.attempted, self.downloaded, self.skipped, self.failed
        )
    }

    /// Logs the counters of one listing page
    pub fn log_page_summary(&self, page: u32, url: &str) {
        tracing::info!("Page {} done ({}): {}", page, url, self.summary_line());
    }
}

/// Prints the end-of-run summary
pub fn print_summary(stats: &CrawlStats, pages: u32, stop_reason: &str) {
    println!("=== Harvest Summary ===\n");
    println!("  Listing pages: {}", pages);
    println!("  Stopped:       {}", stop_reason);
    println!();
    println!("  Attempted:     {}", stats.attempted);
    println!("  Downloaded:    {} ({})", stats.downloaded, format_bytes(stats.bytes));
    println!("  Skipped:       {}", stats.skipped);
    if stats.unresolved > 0 {
        println!("    no PDF:      {}", stats.unresolved);
    }
    println!("  Failed:        {}", stats.failed);
}

fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} B", bytes)
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}
