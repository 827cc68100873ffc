use serde::Deserialize;

/// Main configuration structure for Tender-Sweep
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub source: SourceConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub enrichment: EnrichmentConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    pub storage: StorageConfig,
}

/// Where the listing pages live and how detail pages are addressed
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    /// Listing URL with a `{page}` placeholder
    #[serde(rename = "listing-url-template")]
    pub listing_url_template: String,

    /// Page numbers to walk, in order
    pub pages: Vec<u32>,

    /// Appended verbatim to every detail link before fetching
    #[serde(rename = "detail-suffix", default = "default_detail_suffix")]
    pub detail_suffix: String,

    /// Pause between two listing pages (milliseconds)
    #[serde(rename = "page-delay-ms", default)]
    pub page_delay_ms: u64,
}

impl SourceConfig {
    /// Builds the listing URL for one page number
    pub fn listing_url(&self, page: u32) -> String {
        self.listing_url_template
            .replace("{page}", &page.to_string())
    }
}

/// Request headers and timeouts
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,

    #[serde(rename = "accept-language", default = "default_accept_language")]
    pub accept_language: String,

    /// Per-request timeout for listing pages (seconds)
    #[serde(rename = "listing-timeout-secs", default = "default_listing_timeout")]
    pub listing_timeout_secs: u64,

    /// Per-request timeout for detail pages (seconds)
    #[serde(rename = "detail-timeout-secs", default = "default_detail_timeout")]
    pub detail_timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            accept_language: default_accept_language(),
            listing_timeout_secs: default_listing_timeout(),
            detail_timeout_secs: default_detail_timeout(),
        }
    }
}

/// Retry policy for transient fetch failures
#[derive(Debug, Clone, Deserialize)]
pub struct RetryConfig {
    /// Total attempts per URL, including the first
    #[serde(rename = "max-retries", default = "default_max_retries")]
    pub max_retries: u32,

    /// Backoff before the first retry; doubles with every further attempt
    #[serde(rename = "base-delay-ms", default = "default_base_delay")]
    pub base_delay_ms: u64,

    #[serde(rename = "jitter-min-ms", default = "default_jitter_min")]
    pub jitter_min_ms: u64,

    #[serde(rename = "jitter-max-ms", default = "default_jitter_max")]
    pub jitter_max_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            base_delay_ms: default_base_delay(),
            jitter_min_ms: default_jitter_min(),
            jitter_max_ms: default_jitter_max(),
        }
    }
}

/// Detail enrichment fan-out
#[derive(Debug, Clone, Deserialize)]
pub struct EnrichmentConfig {
    /// Maximum detail fetches in flight
    #[serde(default = "default_concurrency")]
    pub concurrency: u32,

    /// Randomized pause before each detail fetch (milliseconds)
    #[serde(rename = "min-delay-ms", default = "default_min_delay")]
    pub min_delay_ms: u64,

    #[serde(rename = "max-delay-ms", default = "default_max_delay")]
    pub max_delay_ms: u64,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            min_delay_ms: default_min_delay(),
            max_delay_ms: default_max_delay(),
        }
    }
}

/// Periodic refresh settings
#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerConfig {
    #[serde(rename = "interval-secs", default = "default_interval")]
    pub interval_secs: u64,

    /// Compute the refresh without writing to the store
    #[serde(rename = "dry-run", default = "default_dry_run")]
    pub dry_run: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval(),
            dry_run: default_dry_run(),
        }
    }
}

/// Persisted store location
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

fn default_detail_suffix() -> String {
    "?tab=general".to_string()
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36"
        .to_string()
}

fn default_accept_language() -> String {
    "ru-RU,ru;q=0.9,en;q=0.8".to_string()
}

fn default_listing_timeout() -> u64 {
    20
}

fn default_detail_timeout() -> u64 {
    25
}

fn default_max_retries() -> u32 {
    3
}

fn default_base_delay() -> u64 {
    2000
}

fn default_jitter_min() -> u64 {
    200
}

fn default_jitter_max() -> u64 {
    800
}

fn default_concurrency() -> u32 {
    20
}

fn default_min_delay() -> u64 {
    50
}

fn default_max_delay() -> u64 {
    200
}

fn default_interval() -> u64 {
    3 * 60 * 60
}

fn default_dry_run() -> bool {
    true
}
