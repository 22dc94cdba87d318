//! Durable crawl progress
//!
//! [`CrawlState`] is the single record persisted between runs. It is an
//! explicit value owned by the coordinator and handed to the state store,
//! which keeps resumption reproducible without process restarts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use url::Url;

/// Progress of a crawl, as stored in the state file
///
/// `completed_ids` only ever grows. `next_page_url` is the first listing page
/// that has not been fully processed; once pagination runs out it keeps the
/// last processed page and `exhausted` is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlState {
    pub next_page_url: String,

    pub pages_visited: u32,

    pub completed_ids: BTreeSet<String>,

    #[serde(default)]
    pub exhausted: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl CrawlState {
    /// Creates a fresh state positioned on the first listing page
    pub fn new(start_url: &Url) -> Self {
        Self {
            next_page_url: start_url.to_string(),
            pages_visited: 0,
            completed_ids: BTreeSet::new(),
            exhausted: false,
            updated_at: None,
        }
    }

    /// Parses the stored cursor
    pub fn next_page(&self) -> Result<Url, url::ParseError> {
        Url::parse(&self.next_page_url)
    }

    pub fn is_completed(&self, id: &str) -> bool {
        self.completed_ids.contains(id)
    }

    /// Records a finished document; returns true if the id was new
    pub fn mark_completed(&mut self, id: impl Into<String>) -> bool {
        self.completed_ids.insert(id.into())
    }

    /// Records that the current listing page was fully processed
    ///
    /// With `Some(next)` the cursor moves to that page. With `None` the
    /// cursor stays put and the state is marked exhausted.
    pub fn advance(&mut self, next: Option<&Url>) {
        self.pages_visited += 1;
        match next {
            Some(url) => {
                self.next_page_url = url.to_string();
                self.exhausted = false;
            }
            None => self.exhausted = true,
        }
        self.updated_at = Some(Utc::now());
    }

    /// Starts a new pass over the catalog, keeping the completed set
    pub fn restart_pass(&mut self, start_url: &Url) {
        self.next_page_url = start_url.to_string();
        self.pages_visited = 0;
        self.exhausted = false;
    }
}
