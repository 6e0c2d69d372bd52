use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure for the document ingestor
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub transform: TransformConfig,
}

impl Config {
    /// Builds a configuration with defaults for everything but the seeds and paths
    pub fn new(
        seed_urls: Vec<String>,
        output_dir: impl Into<PathBuf>,
        metadata_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            crawler: CrawlerConfig {
                seed_urls,
                output_dir: output_dir.into(),
                metadata_path: metadata_path.into(),
                max_concurrent_fetches: default_max_concurrent_fetches(),
                request_timeout_secs: default_request_timeout_secs(),
            },
            user_agent: UserAgentConfig::default(),
            transform: TransformConfig::default(),
        }
    }
}

/// Flat JSON form with the three core keys at the top level
///
/// ```json
/// {"seed_urls": ["https://example.com/doc"], "output_dir": "out", "metadata_path": "meta.json"}
/// ```
///
/// Everything else takes its default.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct FlatConfig {
    #[serde(alias = "seedUrls", default)]
    seed_urls: Vec<String>,

    #[serde(alias = "outputDir", default = "default_output_dir")]
    output_dir: PathBuf,

    #[serde(alias = "metadataPath", default = "default_metadata_path")]
    metadata_path: PathBuf,
}

impl FlatConfig {
    pub(crate) fn into_config(self) -> Config {
        Config::new(self.seed_urls, self.output_dir, self.metadata_path)
    }
}

/// Fetch behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// URLs to fetch on every run
    #[serde(rename = "seed-urls", alias = "seed_urls", default)]
    pub seed_urls: Vec<String>,

    /// Root directory for persisted document bytes
    #[serde(
        rename = "output-dir",
        alias = "output_dir",
        default = "default_output_dir"
    )]
    pub output_dir: PathBuf,

    /// Durable location of the per-URL metadata file
    #[serde(
        rename = "metadata-path",
        alias = "metadata_path",
        default = "default_metadata_path"
    )]
    pub metadata_path: PathBuf,

    /// Maximum number of fetches in flight at once
    #[serde(
        rename = "max-concurrent-fetches",
        alias = "max_concurrent_fetches",
        default = "default_max_concurrent_fetches"
    )]
    pub max_concurrent_fetches: u32,

    /// Per-request timeout in seconds
    #[serde(
        rename = "request-timeout-secs",
        alias = "request_timeout_secs",
        default = "default_request_timeout_secs"
    )]
    pub request_timeout_secs: u64,
}

impl CrawlerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name", alias = "crawler_name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version", alias = "crawler_version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url", alias = "contact_url", default)]
    pub contact_url: Option<String>,
}

impl UserAgentConfig {
    /// Formats the `User-Agent` header value
    ///
    /// Format: `CrawlerName/Version` or `CrawlerName/Version (+ContactURL)`
    pub fn header_value(&self) -> String {
        match &self.contact_url {
            Some(contact) => format!(
                "{}/{} (+{})",
                self.crawler_name, self.crawler_version, contact
            ),
            None => format!("{}/{}", self.crawler_name, self.crawler_version),
        }
    }
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "document-ingestor".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: None,
        }
    }
}

/// Text extraction configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TransformConfig {
    /// Whether freshly fetched documents are converted to text
    #[serde(default)]
    pub enabled: bool,

    /// Directory for extracted text files
    #[serde(rename = "text-dir", alias = "text_dir", default = "default_text_dir")]
    pub text_dir: PathBuf,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            text_dir: default_text_dir(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("data/raw")
}

fn default_metadata_path() -> PathBuf {
    PathBuf::from("crawl_metadata.json")
}

fn default_text_dir() -> PathBuf {
    PathBuf::from("data/text")
}

fn default_max_concurrent_fetches() -> u32 {
    8
}

fn default_request_timeout_secs() -> u64 {
    30
}
