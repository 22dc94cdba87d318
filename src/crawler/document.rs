//! Candidate links, resolved documents and official identifiers

use regex::Regex;
use std::sync::LazyLock;
use url::Url;

/// Structured document code such as `PS-00421-2024`: letters, digits, year
static OFFICIAL_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[A-Z]{1,4}-\d{3,6}-\d{4}").expect("official id regex is valid") // Static pattern
});

/// A link found on a listing page that may lead to a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateLink {
    /// Anchor text, whitespace-collapsed
    pub display_text: String,
    /// Absolute URL of the link
    pub href: Url,
}

/// How a candidate has to be resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    /// The href already points at a PDF
    DirectPdf,
    /// The href points at an intermediate page holding the PDF link
    DetailPage,
}

impl CandidateLink {
    pub fn new(display_text: impl Into<String>, href: Url) -> Self {
        Self {
            display_text: display_text.into(),
            href,
        }
    }

    pub fn kind(&self) -> LinkKind {
        if is_pdf_url(&self.href) {
            LinkKind::DirectPdf
        } else {
            LinkKind::DetailPage
        }
    }

    /// Identifier visible without any request: display text, then href path
    pub fn official_id(&self) -> Option<String> {
        find_official_id(&self.display_text).or_else(|| find_official_id(self.href.path()))
    }
}

/// A candidate whose PDF URL is known
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDocument {
    pub source: CandidateLink,
    pub pdf_url: Url,
    pub official_id: Option<String>,
}

impl ResolvedDocument {
    /// Builds a document, extracting the identifier from the display text,
    /// then the URL paths, then the detail page text when there is one
    pub fn new(source: CandidateLink, pdf_url: Url, page_text: Option<&str>) -> Self {
        let official_id = source
            .official_id()
            .or_else(|| find_official_id(pdf_url.path()))
            .or_else(|| page_text.and_then(find_official_id));

        Self {
            source,
            pdf_url,
            official_id,
        }
    }
}

/// Returns the first official identifier in `text`
pub fn find_official_id(text: &str) -> Option<String> {
    OFFICIAL_ID_RE.find(text).map(|m| m.as_str().to_string())
}

/// Returns true if the URL path ends in `.pdf` (case-insensitive, query ignored)
pub fn is_pdf_url(url: &Url) -> bool {
    url.path().to_ascii_lowercase().ends_with(".pdf")
}
