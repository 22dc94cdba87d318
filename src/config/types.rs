use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Listing page the harvester starts from when no state is resumed
pub const DEFAULT_START_URL: &str = "https://www.aepd.es/informes-y-resoluciones/resoluciones";

/// Main configuration structure for Resolution-Harvest
///
/// Every section has defaults, so an empty TOML file (or no file at all)
/// yields a usable configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default, rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub heuristics: HeuristicsConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// First listing page of the catalog
    #[serde(rename = "start-url")]
    pub start_url: String,

    /// Delay awaited before every outbound request (seconds)
    pub delay: f64,

    /// Maximum listing pages to visit in one run (0 = unbounded)
    #[serde(rename = "max-pages")]
    pub max_pages: u32,

    /// Per-request timeout (seconds)
    pub timeout: f64,

    /// Attempts per request, including the first one
    #[serde(rename = "max-attempts")]
    pub max_attempts: u32,

    /// Base delay of the exponential backoff (seconds)
    #[serde(rename = "backoff-base")]
    pub backoff_base: f64,

    /// Upper bound for a single backoff delay (seconds)
    #[serde(rename = "backoff-max")]
    pub backoff_max: f64,

    /// Skip existing files and reuse the persisted cursor
    pub resume: bool,

    /// Honor robots.txt of the start host
    #[serde(rename = "respect-robots")]
    pub respect_robots: bool,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            start_url: DEFAULT_START_URL.to_string(),
            delay: 1.5,
            max_pages: 0,
            timeout: 25.0,
            max_attempts: 5,
            backoff_base: 0.8,
            backoff_max: 30.0,
            resume: false,
            respect_robots: true,
        }
    }
}

impl CrawlerConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_secs_f64(self.delay)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs_f64(self.timeout)
    }

    pub fn backoff_base(&self) -> Duration {
        Duration::from_secs_f64(self.backoff_base)
    }

    pub fn backoff_max(&self) -> Duration {
        Duration::from_secs_f64(self.backoff_max)
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "Resolution-Harvest".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: "https://example.org/bot".to_string(),
        }
    }
}

impl UserAgentConfig {
    /// Formats the User-Agent header value: `Name/Version (+ContactURL)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{})",
            self.crawler_name, self.crawler_version, self.contact_url
        )
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory receiving the PDFs and the state file
    pub directory: PathBuf,

    /// State file name, relative to `directory`
    #[serde(rename = "state-file")]
    pub state_file: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("./aepd_pdfs"),
            state_file: "_state.json".to_string(),
        }
    }
}

impl OutputConfig {
    pub fn state_path(&self) -> PathBuf {
        self.directory.join(&self.state_file)
    }
}

/// Portal-specific markup heuristics
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HeuristicsConfig {
    /// Anchor texts that mark a link to a detail page ("ficha")
    #[serde(rename = "detail-link-texts")]
    pub detail_link_texts: Vec<String>,

    /// Anchor texts or labels that mark the next listing page
    #[serde(rename = "next-link-texts")]
    pub next_link_texts: Vec<String>,
}

impl Default for HeuristicsConfig {
    fn default() -> Self {
        Self {
            detail_link_texts: vec!["Ver documento".to_string()],
            next_link_texts: ["siguiente", "next", "»", ">>", "›"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}
