//! Storage module for persisting crawl state
//!
//! The crawl cursor and the set of completed documents live in one small
//! JSON file in the output directory. It is rewritten after every listing
//! page so an interrupted run resumes at the first page not yet finished.

mod json;
mod traits;

pub use json::JsonStateStore;
pub use traits::{StateStore, StorageError, StorageResult};
