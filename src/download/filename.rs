//! Filename derivation and sanitization for downloaded PDFs
//!
//! [`derive_filename`] is a pure function of the document's identifier,
//! display text and PDF URL, so a resumed run derives the same names.

use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use url::Url;

/// Longest file stem produced, in bytes
///
/// Leaves room for `.pdf.part` under the common 255-byte name limit.
const MAX_STEM_BYTES: usize = 200;

/// Bytes taken by the `_<hash>` disambiguation suffix
const HASH_SUFFIX_BYTES: usize = 9;

/// Stem used when nothing usable is left after sanitizing
const FALLBACK_STEM: &str = "documento";

/// Suffix of in-progress downloads
pub const PART_SUFFIX: &str = ".part";

/// Derives the final file name of a document
///
/// 1. `official_id` present: `<id>.pdf`
/// 2. PDF URL basename ends in `.pdf`: the decoded basename plus a short URL hash
/// 3. Otherwise the display-text slug plus a short URL hash
///
/// The hash keeps repeated labels like "Ver documento" and same-named files
/// in different folders from colliding.
///
/// # Example
///
/// ```
/// use resolution_harvest::derive_filename;
/// use url::Url;
///
/// let url = Url::parse("https://example.org/descarga?id=1").unwrap();
/// assert_eq!(derive_filename(Some("PS-00421-2024"), "", &url), "PS-00421-2024.pdf");
/// ```
pub fn derive_filename(official_id: Option<&str>, display_text: &str, pdf_url: &Url) -> String {
    if let Some(id) = official_id.map(sanitize_component).filter(|s| !s.is_empty()) {
        return format!("{}.pdf", truncate(&id, MAX_STEM_BYTES));
    }

    let stem = url_pdf_stem(pdf_url)
        .or_else(|| Some(sanitize_component(display_text)).filter(|s| !s.is_empty()))
        .map(|stem| truncate(&stem, MAX_STEM_BYTES - HASH_SUFFIX_BYTES))
        .filter(|stem| !stem.is_empty())
        .unwrap_or_else(|| FALLBACK_STEM.to_string());

    format!("{}_{}.pdf", stem, short_hash(pdf_url))
}

/// Replaces characters that are illegal or awkward in file names with `_`
///
/// Runs of separators collapse to one `_`; leading and trailing `_` and `.`
/// are trimmed so the result is never hidden and never `..`.
pub fn sanitize_component(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut prev_sep = false;

    for ch in value.chars() {
        let mapped = match ch {
            c if c.is_alphanumeric() || matches!(c, '-' | '.') => c,
            _ => '_',
        };
        if mapped == '_' {
            if !prev_sep {
                out.push('_');
                prev_sep = true;
            }
        } else {
            out.push(mapped);
            prev_sep = false;
        }
    }

    out.trim_matches(|c| c == '_' || c == '.').to_string()
}

/// Path of the temporary file a download streams into
pub fn part_path_for(final_path: &Path) -> PathBuf {
    let mut name = final_path.as_os_str().to_owned();
    name.push(PART_SUFFIX);
    PathBuf::from(name)
}

/// Percent-decoded basename of a `.pdf` URL without its extension, sanitized
fn url_pdf_stem(url: &Url) -> Option<String> {
    let raw = url.path_segments()?.next_back()?;
    let last = urlencoding::decode(raw).map(|s| s.into_owned()).unwrap_or_else(|_| raw.to_string());
    let lowered = last.to_ascii_lowercase();
    let stem = &last[..lowered.strip_suffix(".pdf")?.len()];
    let stem = sanitize_component(stem);
    (!stem.is_empty()).then_some(stem)
}

/// Cuts `value` to at most `max_bytes`, on a char boundary
fn truncate(value: &str, max_bytes: usize) -> String {
    let mut end = value.len().min(max_bytes);
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    value[..end]
        .trim_end_matches(|c| c == '_' || c == '.')
        .to_string()
}

/// First 8 hex digits of the SHA-256 of the URL
fn short_hash(url: &Url) -> String {
    let digest = Sha256::digest(url.as_str().as_bytes());
    hex::encode(&digest[..4])
}
