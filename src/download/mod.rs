//! PDF downloader
//!
//! This module handles:
//! - Deriving a safe, deterministic file name for each document
//! - Skipping files already present when resuming
//! - Streaming the body into `<name>.part` and promoting it with an atomic
//!   rename once the stream completed and the byte count checks out
//!
//! A failed stream leaves its `.part` file behind; the next attempt
//! truncates and rewrites it. A `.part` file is never renamed unless its
//! stream completed.

mod filename;

pub use filename::{derive_filename, part_path_for, sanitize_component, PART_SUFFIX};

use crate::crawler::{
    content_type_of, is_pdf_content_type, is_pdf_url, HttpClient, Pacer, ResolvedDocument,
};
use crate::state::{DownloadOutcome, SkipReason};
use crate::{FetchError, HarvestError};
use futures_util::StreamExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};

/// Non-fatal reasons a download did not produce a file
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DownloadError {
    #[error("{0}")]
    Fetch(#[from] FetchError),

    #[error("{url} is not a PDF (Content-Type: {content_type})")]
    ContentMismatch { url: String, content_type: String },

    #[error("Empty body from {url}")]
    EmptyBody { url: String },

    #[error("Length mismatch for {url}: expected {expected} bytes, got {actual}")]
    LengthMismatch {
        url: String,
        expected: u64,
        actual: u64,
    },

    #[error("Stream from {url} interrupted: {message}")]
    Stream { url: String, message: String },
}

/// Result of one download attempt
#[derive(Debug, Clone)]
pub struct DownloadResult {
    pub document: ResolvedDocument,
    /// Final path of the file (present only when the outcome says so)
    pub local_path: PathBuf,
    /// Bytes written, or the size of the existing file when skipped
    pub byte_size: u64,
    pub outcome: DownloadOutcome,
}

impl DownloadResult {
    /// Identifier recorded in the completed set: the official id, else the file stem
    pub fn completion_key(&self) -> String {
        self.document.official_id.clone().unwrap_or_else(|| {
            self.local_path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default()
        })
    }
}

/// Receives byte-level progress of the current download
pub trait ProgressSink: Send + Sync {
    fn start(&self, name: &str, total_bytes: Option<u64>);
    fn advance(&self, bytes: u64);
    fn finish(&self);
}

/// Progress sink that discards everything
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn start(&self, _name: &str, _total_bytes: Option<u64>) {}
    fn advance(&self, _bytes: u64) {}
    fn finish(&self) {}
}

/// Downloads resolved documents into a target directory
#[derive(Clone)]
pub struct Downloader {
    client: HttpClient,
    target_dir: PathBuf,
    resume: bool,
    progress: Arc<dyn ProgressSink>,
}

impl Downloader {
    pub fn new(client: HttpClient, target_dir: impl Into<PathBuf>, resume: bool) -> Self {
        Self {
            client,
            target_dir: target_dir.into(),
            resume,
            progress: Arc::new(NoProgress),
        }
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressSink>) -> Self {
        self.progress = progress;
        self
    }

    /// Final path a document will be saved to
    pub fn target_path(&self, document: &ResolvedDocument) -> PathBuf {
        self.target_dir.join(derive_filename(
            document.official_id.as_deref(),
            &document.source.display_text,
            &document.pdf_url,
        ))
    }

    /// Downloads one document
    ///
    /// Network and content problems come back as `Ok` with a
    /// [`DownloadOutcome::Failed`] outcome. Only filesystem errors are `Err`.
    pub async fn download(
        &self,
        document: &ResolvedDocument,
        pacer: &mut Pacer,
    ) -> Result<DownloadResult, HarvestError> {
        let final_path = self.target_path(document);
        let result = |outcome, byte_size| DownloadResult {
            document: document.clone(),
            local_path: final_path.clone(),
            byte_size,
            outcome,
        };

        if self.resume {
            if let Some(size) = existing_size(&final_path).await? {
                if size > 0 {
                    return Ok(result(DownloadOutcome::Skipped(SkipReason::AlreadyExists), size));
                }
            }
        }

        pacer.wait().await;
        let url = &document.pdf_url;
        let response = match self.client.get(url).await {
            Ok(response) => response,
            Err(e) => return Ok(result(DownloadOutcome::Failed(e.into()), 0)),
        };

        let content_type = content_type_of(&response);
        if !is_pdf_content_type(&content_type) && !is_pdf_url(response.url()) {
            let err = DownloadError::ContentMismatch {
                url: response.url().to_string(),
                content_type,
            };
            return Ok(result(DownloadOutcome::Failed(err), 0));
        }

        let expected = response.content_length();
        let part_path = part_path_for(&final_path);
        let mut file = File::create(&part_path)
            .await
            .map_err(|e| io_error(&part_path, e))?;

        let name = final_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.progress.start(&name, expected);
        let streamed = stream_to_file(&mut file, response, url.as_str(), self.progress.as_ref()).await;
        self.progress.finish();
        drop(file);

        let written = match streamed {
            Ok(written) => written,
            Err(StreamFailure::Io(e)) => return Err(io_error(&part_path, e)),
            Err(StreamFailure::Network(err)) => {
                return Ok(result(DownloadOutcome::Failed(err), 0));
            }
        };

        if let Err(err) = check_written(url.as_str(), expected, written) {
            return Ok(result(DownloadOutcome::Failed(err), written));
        }

        tokio::fs::rename(&part_path, &final_path)
            .await
            .map_err(|e| io_error(&final_path, e))?;

        Ok(result(DownloadOutcome::Saved, written))
    }
}

enum StreamFailure {
    Network(DownloadError),
    Io(std::io::Error),
}

/// Streams the response body to `file`, returning bytes written
async fn stream_to_file(
    file: &mut File,
    response: reqwest::Response,
    url: &str,
    progress: &dyn ProgressSink,
) -> Result<u64, StreamFailure> {
    let mut writer = BufWriter::new(&mut *file);
    let mut stream = response.bytes_stream();
    let mut bytes_written: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| {
            StreamFailure::Network(DownloadError::Stream {
                url: url.to_string(),
                message: e.to_string(),
            })
        })?;

        writer.write_all(&chunk).await.map_err(StreamFailure::Io)?;
        bytes_written += chunk.len() as u64;
        progress.advance(chunk.len() as u64);
    }

    writer.flush().await.map_err(StreamFailure::Io)?;
    drop(writer);
    file.sync_all().await.map_err(StreamFailure::Io)?;

    Ok(bytes_written)
}

/// A body must be non-empty and, when announced, exactly `Content-Length` bytes
fn check_written(url: &str, expected: Option<u64>, written: u64) -> Result<(), DownloadError> {
    if written == 0 {
        return Err(DownloadError::EmptyBody {
            url: url.to_string(),
        });
    }

    match expected {
        Some(expected) if expected != written => Err(DownloadError::LengthMismatch {
            url: url.to_string(),
            expected,
            actual: written,
        }),
        _ => Ok(()),
    }
}

/// Size of an existing regular file, or `None` if there is none
async fn existing_size(path: &Path) -> Result<Option<u64>, HarvestError> {
    match tokio::fs::metadata(path).await {
        Ok(meta) if meta.is_file() => Ok(Some(meta.len())),
        Ok(_) => Ok(None),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(io_error(path, e)),
    }
}

fn io_error(path: &Path, source: std::io::Error) -> HarvestError {
    HarvestError::Io {
        path: path.to_path_buf(),
        source,
    }
}
