//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the main crawl loop that ties the other parts
//! together:
//! - Loading or creating the crawl state
//! - Fetching each listing page and extracting its candidates
//! - Resolving and downloading every candidate, one request at a time
//! - Persisting the state after each fully processed page
//! - Deciding when to stop

use crate::config::Config;
use crate::crawler::document::CandidateLink;
use crate::crawler::fetcher::HttpClient;
use crate::crawler::pacer::Pacer;
use crate::crawler::parser::LinkExtractor;
use crate::crawler::resolver::LinkResolver;
use crate::download::{Downloader, ProgressSink};
use crate::output::CrawlStats;
use crate::robots::{fetch_robots, RobotsRules};
use crate::state::{CrawlState, DownloadOutcome, SkipReason};
use crate::storage::{JsonStateStore, StateStore};
use crate::HarvestError;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use url::Url;

/// Why a crawl ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The last listing page had no next page
    Exhausted,

    /// The page ceiling for this run was reached
    PageLimit,

    /// A listing page could not be fetched; the state points at it for the next run
    ListingUnavailable,

    /// robots.txt disallows the next listing page
    RobotsDenied,

    /// The next page link led back to a page visited in this run
    PaginationLoop,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Exhausted => "catalog exhausted",
            Self::PageLimit => "page limit reached",
            Self::ListingUnavailable => "listing page unavailable",
            Self::RobotsDenied => "disallowed by robots.txt",
            Self::PaginationLoop => "pagination loop",
        };
        write!(f, "{}", s)
    }
}

/// Result of a completed run
#[derive(Debug, Clone)]
pub struct CrawlReport {
    /// Listing pages fully processed in this run
    pub pages: u32,
    pub stats: CrawlStats,
    pub stop_reason: StopReason,
    /// State as last persisted
    pub state: CrawlState,
}

/// Main crawler coordinator structure
pub struct Coordinator {
    config: Config,
    start_url: Url,
    client: HttpClient,
    extractor: LinkExtractor,
    resolver: LinkResolver,
    downloader: Downloader,
    store: Box<dyn StateStore>,
    pacer: Pacer,
}

impl Coordinator {
    /// Creates a coordinator from a validated configuration
    ///
    /// Creates the output directory if needed; failing that is fatal.
    pub fn new(config: Config) -> Result<Self, HarvestError> {
        let out_dir = config.output.directory.clone();
        std::fs::create_dir_all(&out_dir).map_err(|source| HarvestError::OutputDir {
            path: out_dir.clone(),
            source,
        })?;

        let start_url = Url::parse(&config.crawler.start_url)?;
        let client = HttpClient::from_config(&config)?;
        let store = JsonStateStore::new(config.output.state_path());

        Ok(Self {
            start_url,
            extractor: LinkExtractor::from_config(&config.heuristics),
            resolver: LinkResolver::new(client.clone()),
            downloader: Downloader::new(client.clone(), out_dir, config.crawler.resume),
            store: Box::new(store),
            pacer: Pacer::new(config.crawler.delay()),
            client,
            config,
        })
    }

    /// Replaces the state store
    pub fn with_store(mut self, store: impl StateStore + 'static) -> Self {
        self.store = Box::new(store);
        self
    }

    /// Sets the sink that receives download progress
    pub fn with_progress(mut self, progress: Arc<dyn ProgressSink>) -> Self {
        self.downloader = self.downloader.with_progress(progress);
        self
    }

    /// Picks the state this run starts from
    ///
    /// The completed set always carries over. Without resume the cursor goes
    /// back to the start URL. With resume, a saved state continues at its
    /// cursor; an exhausted one starts a new pass from the start URL.
    pub fn initial_state(&self) -> CrawlState {
        let Some(mut state) = self.store.load() else {
            tracing::info!("No saved state, starting at {}", self.start_url);
            return CrawlState::new(&self.start_url);
        };

        if !self.config.crawler.resume {
            tracing::info!(
                "Starting at {} ({} documents completed in earlier runs)",
                self.start_url,
                state.completed_ids.len()
            );
            state.restart_pass(&self.start_url);
            return state;
        }

        if state.next_page().is_err() {
            tracing::warn!(
                "Saved cursor {:?} is not a URL, restarting from {}",
                state.next_page_url,
                self.start_url
            );
            state.restart_pass(&self.start_url);
        } else if state.exhausted {
            tracing::info!(
                "Previous pass finished after {} pages, starting a new pass ({} documents completed)",
                state.pages_visited,
                state.completed_ids.len()
            );
            state.restart_pass(&self.start_url);
        } else {
            tracing::info!(
                "Resuming at {} ({} pages visited, {} documents completed)",
                state.next_page_url,
                state.pages_visited,
                state.completed_ids.len()
            );
        }

        state
    }

    /// Runs the crawl until one of the [`StopReason`]s applies
    ///
    /// Per-candidate failures are logged and counted. Only failures to
    /// write files or the state end the run with an error.
    pub async fn run(&mut self) -> Result<CrawlReport, HarvestError> {
        let mut state = self.initial_state();
        let robots = self.load_robots().await;
        let agent = self.config.user_agent.crawler_name.clone();
        let max_pages = self.config.crawler.max_pages;

        let mut total = CrawlStats::new();
        let mut visited: HashSet<Url> = HashSet::new();
        let mut seen_pdfs: HashSet<Url> = HashSet::new();
        let mut pages = 0u32;

        let stop_reason = loop {
            if max_pages > 0 && pages >= max_pages {
                tracing::info!("Reached the page limit of {}", max_pages);
                break StopReason::PageLimit;
            }

            let page_url = state.next_page()?;
            if let Some(rules) = &robots {
                if !rules.allows(page_url.as_str(), &agent) {
                    tracing::warn!("robots.txt disallows {}, stopping", page_url);
                    break StopReason::RobotsDenied;
                }
            }

            self.pacer.wait().await;
            tracing::info!("Fetching listing page {}", page_url);
            let page = match self.client.get_page(&page_url).await {
                Ok(page) => page,
                Err(e) => {
                    tracing::error!("Listing page unavailable, stopping: {}", e);
                    break StopReason::ListingUnavailable;
                }
            };
            visited.insert(page_url);
            visited.insert(page.final_url.clone());

            let listing = self.extractor.extract(&page.body, &page.final_url);
            tracing::info!(
                "Found {} candidates on {}",
                listing.candidates.len(),
                listing.url
            );

            let mut page_stats = CrawlStats::new();
            for candidate in &listing.candidates {
                self.process_candidate(candidate, &mut state, &mut seen_pdfs, &mut page_stats)
                    .await?;
            }

            let looped = listing
                .next_page
                .as_ref()
                .is_some_and(|next| visited.contains(next));
            let next = listing.next_page.as_ref().filter(|_| !looped);

            state.advance(next);
            self.store.save(&state)?;
            pages += 1;
            page_stats.log_page_summary(state.pages_visited, listing.url.as_str());
            total.merge(&page_stats);

            if looped {
                tracing::warn!(
                    "Next page of {} was already visited in this run, stopping",
                    listing.url
                );
                break StopReason::PaginationLoop;
            }
            if next.is_none() {
                tracing::info!("No next page after {}", listing.url);
                break StopReason::Exhausted;
            }
        };

        tracing::info!(
            "Harvest stopped ({}) after {} pages: {}",
            stop_reason,
            pages,
            total.summary_line()
        );

        Ok(CrawlReport {
            pages,
            stats: total,
            stop_reason,
            state,
        })
    }

    /// Fetches robots.txt and applies its `Crawl-delay`, unless disabled
    async fn load_robots(&mut self) -> Option<RobotsRules> {
        if !self.config.crawler.respect_robots {
            tracing::debug!("robots.txt checks disabled");
            return None;
        }

        let rules = fetch_robots(&self.client, &self.start_url, &mut self.pacer).await;
        if let Some(delay) = rules.crawl_delay(&self.config.user_agent.crawler_name) {
            self.pacer.raise_to(delay);
        }
        Some(rules)
    }

    /// Resolves and downloads one candidate, recording the outcome
    async fn process_candidate(
        &mut self,
        candidate: &CandidateLink,
        state: &mut CrawlState,
        seen_pdfs: &mut HashSet<Url>,
        stats: &mut CrawlStats,
    ) -> Result<(), HarvestError> {
        let resume = self.config.crawler.resume;

        if resume && candidate.official_id().is_some_and(|id| state.is_completed(&id)) {
            tracing::debug!("Already completed: {}", candidate.display_text);
            stats.record_skip(SkipReason::AlreadyCompleted);
            return Ok(());
        }

        let document = match self.resolver.resolve(candidate, &mut self.pacer).await {
            Ok(document) => document,
            Err(e) => {
                tracing::warn!("Skipping {:?}: {}", candidate.display_text, e);
                stats.record_unresolved();
                return Ok(());
            }
        };

        if !seen_pdfs.insert(document.pdf_url.clone()) {
            tracing::debug!("Duplicate PDF {}", document.pdf_url);
            stats.record_skip(SkipReason::Duplicate);
            return Ok(());
        }

        if resume && document.official_id.as_deref().is_some_and(|id| state.is_completed(id)) {
            tracing::debug!("Already completed: {}", document.pdf_url);
            stats.record_skip(SkipReason::AlreadyCompleted);
            return Ok(());
        }

        let result = self.downloader.download(&document, &mut self.pacer).await?;
        match &result.outcome {
            DownloadOutcome::Saved => tracing::info!(
                "Saved {} ({} bytes)",
                result.local_path.display(),
                result.byte_size
            ),
            DownloadOutcome::Skipped(reason) => {
                tracing::debug!("Skipped {}: {}", result.local_path.display(), reason)
            }
            DownloadOutcome::Failed(e) => tracing::warn!("Download failed: {}", e),
        }

        if result.outcome.is_complete() {
            state.mark_completed(result.completion_key());
        }
        stats.record(&result.outcome, result.byte_size);
        Ok(())
    }
}
