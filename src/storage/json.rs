//! JSON file implementation of [`StateStore`]

use crate::state::CrawlState;
use crate::storage::{StateStore, StorageError, StorageResult};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Crawl state kept in a single JSON document, `_state.json` by default
#[derive(Debug, Clone)]
pub struct JsonStateStore {
    path: PathBuf,
}

impl JsonStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".tmp");
        PathBuf::from(name)
    }

    fn io_error(path: &Path, source: std::io::Error) -> StorageError {
        StorageError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

impl StateStore for JsonStateStore {
    fn load(&self) -> Option<CrawlState> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!("Could not read state file {}: {}", self.path.display(), e);
                return None;
            }
        };

        match serde_json::from_str(&content) {
            Ok(state) => Some(state),
            Err(e) => {
                tracing::warn!(
                    "Ignoring corrupt state file {}: {}",
                    self.path.display(),
                    e
                );
                None
            }
        }
    }

    /// Writes to `<path>.tmp`, syncs, then renames over the old state
    fn save(&self, state: &CrawlState) -> StorageResult<()> {
        let json = serde_json::to_vec_pretty(state)?;
        let tmp = self.tmp_path();

        let mut file = fs::File::create(&tmp).map_err(|e| Self::io_error(&tmp, e))?;
        file.write_all(&json)
            .and_then(|_| file.sync_all())
            .map_err(|e| Self::io_error(&tmp, e))?;
        drop(file);

        fs::rename(&tmp, &self.path).map_err(|e| Self::io_error(&self.path, e))?;
        tracing::debug!("Saved state to {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use url::Url;

    fn store(dir: &TempDir) -> JsonStateStore {
        JsonStateStore::new(dir.path().join("_state.json"))
    }

    #[test]
    fn test_missing_file_is_none() {
        let dir = TempDir::new().unwrap();
        assert!(store(&dir).load().is_none());
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);

        let mut state = CrawlState::new(&Url::parse("https://example.com/list").unwrap());
        state.mark_completed("PS-00001-2024");
        let next = Url::parse("https://example.com/list?page=1").unwrap();
        state.advance(Some(&next));

        store.save(&state).unwrap();
        let loaded = store.load().unwrap();

        assert_eq!(loaded, state);
        assert!(!store.tmp_path().exists());
    }

    #[test]
    fn test_corrupt_file_is_none() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        fs::write(store.path(), "{ not json").unwrap();
        assert!(store.load().is_none());
    }

    #[test]
    fn test_reads_minimal_state() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        fs::write(
            store.path(),
            r#"{"next_page_url": "https://example.com/list?page=3", "pages_visited": 3, "completed_ids": ["A-001-2020"]}"#,
        )
        .unwrap();

        let state = store.load().unwrap();
        assert_eq!(state.pages_visited, 3);
        assert!(state.is_completed("A-001-2020"));
        assert!(!state.exhausted);
    }

    #[test]
    fn test_save_overwrites() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let mut state = CrawlState::new(&Url::parse("https://example.com/list").unwrap());

        store.save(&state).unwrap();
        state.advance(None);
        store.save(&state).unwrap();

        assert!(store.load().unwrap().exhausted);
    }
}
