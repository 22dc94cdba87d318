//! Candidate resolution: from a listing link to a validated PDF URL
//!
//! Each candidate is classified as a [`LinkKind`]. Direct PDF links are only
//! validated with a HEAD request. Detail pages are fetched and scanned for
//! their PDF anchor. Anything that cannot be resolved becomes a
//! [`ResolveError`], which the coordinator logs and counts as skipped.

use crate::crawler::document::{find_official_id, is_pdf_url, CandidateLink, LinkKind, ResolvedDocument};
use crate::crawler::fetcher::{content_type_of, is_pdf_content_type, read_page, HttpClient};
use crate::crawler::pacer::Pacer;
use crate::crawler::parser::{parse_html, Anchor};
use crate::FetchError;
use thiserror::Error;
use url::Url;

/// Why a candidate could not be resolved to a PDF
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("No PDF link found on {url}")]
    NoPdfFound { url: String },

    #[error("Fetch failed for {url}: {source}")]
    FetchFailed { url: String, source: FetchError },

    #[error("{url} is not a PDF (Content-Type: {content_type})")]
    ContentMismatch { url: String, content_type: String },
}

/// Resolves candidate links into [`ResolvedDocument`]s
#[derive(Debug, Clone)]
pub struct LinkResolver {
    client: HttpClient,
}

impl LinkResolver {
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }

    /// Resolves one candidate
    ///
    /// Every request waits on `pacer` first. A `DirectPdf` candidate never
    /// triggers a detail-page fetch.
    pub async fn resolve(
        &self,
        candidate: &CandidateLink,
        pacer: &mut Pacer,
    ) -> Result<ResolvedDocument, ResolveError> {
        match candidate.kind() {
            LinkKind::DirectPdf => {
                let pdf_url = self.validate(&candidate.href, pacer).await?;
                Ok(ResolvedDocument::new(candidate.clone(), pdf_url, None))
            }
            LinkKind::DetailPage => self.resolve_detail(candidate, pacer).await,
        }
    }

    async fn resolve_detail(
        &self,
        candidate: &CandidateLink,
        pacer: &mut Pacer,
    ) -> Result<ResolvedDocument, ResolveError> {
        let fetch_failed = |source: FetchError| ResolveError::FetchFailed {
            url: candidate.href.to_string(),
            source,
        };

        pacer.wait().await;
        tracing::debug!("Fetching detail page {}", candidate.href);
        let response = self.client.get(&candidate.href).await.map_err(fetch_failed)?;

        // Some "detail" links serve the PDF itself
        if is_pdf_content_type(&content_type_of(&response)) {
            let pdf_url = response.url().clone();
            return Ok(ResolvedDocument::new(candidate.clone(), pdf_url, None));
        }

        let page = read_page(response).await.map_err(fetch_failed)?;
        let parsed = parse_html(&page.body, &page.final_url);
        let page_text = parsed.identifying_text();

        let page_id = find_official_id(&page_text).or_else(|| candidate.official_id());
        let chosen = select_pdf_anchor(&parsed.anchors, page_id.as_deref()).ok_or_else(|| {
            ResolveError::NoPdfFound {
                url: page.final_url.to_string(),
            }
        })?;

        let pdf_url = self.validate(&chosen.href, pacer).await?;
        let body_text = format!("{} | {}", page_text, chosen.text);
        Ok(ResolvedDocument::new(
            candidate.clone(),
            pdf_url,
            Some(&body_text),
        ))
    }

    /// Confirms a URL serves a PDF and returns its final location
    ///
    /// A PDF Content-Type or a `.pdf` final URL is accepted. A 404/410 is
    /// a fetch failure. Other HEAD failures on a `.pdf` URL fall back to
    /// the extension, since some servers reject HEAD.
    async fn validate(&self, url: &Url, pacer: &mut Pacer) -> Result<Url, ResolveError> {
        pacer.wait().await;

        match self.client.head(url).await {
            Ok(meta) => {
                if is_pdf_content_type(&meta.content_type) || is_pdf_url(&meta.final_url) {
                    Ok(meta.final_url)
                } else {
                    Err(ResolveError::ContentMismatch {
                        url: meta.final_url.to_string(),
                        content_type: meta.content_type,
                    })
                }
            }
            Err(e) if matches!(e.status(), Some(404 | 410)) => Err(ResolveError::FetchFailed {
                url: url.to_string(),
                source: e,
            }),
            Err(e) if is_pdf_url(url) => {
                tracing::debug!("HEAD {} failed ({}), trusting the .pdf extension", url, e);
                Ok(url.clone())
            }
            Err(e) => Err(ResolveError::FetchFailed {
                url: url.to_string(),
                source: e,
            }),
        }
    }
}

/// Picks the PDF anchor of a detail page
///
/// Prefers the first `.pdf` anchor whose href or text carries `page_id`,
/// else the first `.pdf` anchor.
pub fn select_pdf_anchor<'a>(anchors: &'a [Anchor], page_id: Option<&str>) -> Option<&'a Anchor> {
    let mut pdf_anchors = anchors.iter().filter(|a| is_pdf_url(&a.href)).peekable();
    let first = *pdf_anchors.peek()?;

    let matching = page_id.and_then(|id| {
        pdf_anchors.find(|a| a.href.as_str().contains(id) || a.text.contains(id))
    });

    Some(matching.unwrap_or(first))
}
