//! Storage traits and error types

use crate::state::CrawlState;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while persisting crawl state
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Persistence of the crawl cursor
///
/// Loading never fails: a state that cannot be read is treated as absent
/// and the crawl starts from the beginning.
pub trait StateStore: Send + Sync {
    /// Returns the saved state, or `None` if there is none usable
    fn load(&self) -> Option<CrawlState>;

    /// Replaces the saved state with `state`
    fn save(&self, state: &CrawlState) -> StorageResult<()>;
}
