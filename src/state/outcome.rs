//! Per-document outcome definitions

use crate::download::DownloadError;
use std::fmt;

/// Why a document was not downloaded even though nothing went wrong
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkipReason {
    /// A non-empty file with the derived name is already on disk
    AlreadyExists,

    /// The identifier is already in the persisted completed set
    AlreadyCompleted,

    /// The same PDF URL was already handled earlier in this run
    Duplicate,
}

/// Final state of one document after the download step
#[derive(Debug, Clone, PartialEq)]
pub enum DownloadOutcome {
    /// Streamed, validated and promoted to its final name
    Saved,

    Skipped(SkipReason),

    /// Network or content failure; the candidate is counted and the crawl goes on
    Failed(DownloadError),
}

impl DownloadOutcome {
    pub fn is_saved(&self) -> bool {
        matches!(self, Self::Saved)
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    /// Returns true if the document is now present on disk
    ///
    /// Duplicates are excluded: the earlier occurrence already decided.
    pub fn is_complete(&self) -> bool {
        matches!(
            self,
            Self::Saved | Self::Skipped(SkipReason::AlreadyExists | SkipReason::AlreadyCompleted)
        )
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::AlreadyExists => "already exists",
            Self::AlreadyCompleted => "already completed",
            Self::Duplicate => "duplicate",
        };
        write!(f, "{}", s)
    }
}

impl fmt::Display for DownloadOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Saved => write!(f, "saved"),
            Self::Skipped(reason) => write!(f, "skipped ({})", reason),
            Self::Failed(err) => write!(f, "failed ({})", err),
        }
    }
}
