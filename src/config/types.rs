use serde::Deserialize;

/// Main configuration structure for Tidewalk
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawl: CrawlConfig,
    pub storage: StorageConfig,
    pub extraction: ExtractionConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub host: HostConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Crawl plan limits and retry policy
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlConfig {
    /// Upper bound on the number of locations accepted at start
    #[serde(rename = "max-items", default = "default_max_items")]
    pub max_items: usize,

    /// Attempts per location before it is recorded as failed
    #[serde(rename = "retry-limit", default = "default_retry_limit")]
    pub retry_limit: u32,

    /// Base offset for the 1-based item numbers shown to consumers
    #[serde(rename = "skip-offset", default)]
    pub skip_offset: u64,

    /// Wildcard pattern a location must match to be accepted
    #[serde(rename = "location-pattern", default = "default_location_pattern")]
    pub location_pattern: String,

    /// Seconds without forward progress before a plan is abandoned
    #[serde(rename = "plan-max-age-secs", default = "default_plan_max_age")]
    pub plan_max_age_secs: u64,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            max_items: default_max_items(),
            retry_limit: default_retry_limit(),
            skip_offset: 0,
            location_pattern: default_location_pattern(),
            plan_max_age_secs: default_plan_max_age(),
        }
    }
}

/// Durable store configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,

    /// Maximum age of supplementary cache entries (seconds)
    #[serde(rename = "cache-max-age-secs", default = "default_cache_max_age")]
    pub cache_max_age_secs: u64,
}

/// Selector-driven extraction configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractionConfig {
    /// CSS selector that must match before the page counts as loaded
    #[serde(rename = "ready-selector")]
    pub ready_selector: String,

    /// Hard limit on waiting for the ready selector (milliseconds)
    #[serde(rename = "ready-timeout-ms", default = "default_ready_timeout")]
    pub ready_timeout_ms: u64,

    /// Initial delay between readiness polls (milliseconds)
    #[serde(rename = "poll-interval-ms", default = "default_poll_interval")]
    pub poll_interval_ms: u64,

    #[serde(default)]
    pub fields: Vec<FieldRule>,
}

/// One extracted field
#[derive(Debug, Clone, Deserialize)]
pub struct FieldRule {
    pub name: String,
    pub selector: String,

    /// Read this attribute instead of the element text
    #[serde(default)]
    pub attribute: Option<String>,
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    #[serde(rename = "contact-url")]
    pub contact_url: String,

    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

/// Settings for the process host that performs navigations
#[derive(Debug, Clone, Deserialize)]
pub struct HostConfig {
    /// Base URL that relative locations are resolved against
    #[serde(rename = "base-url", default)]
    pub base_url: Option<String>,

    /// Pause before loading the next location (milliseconds)
    #[serde(rename = "navigation-delay-ms", default = "default_navigation_delay")]
    pub navigation_delay_ms: u64,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            navigation_delay_ms: default_navigation_delay(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputConfig {
    /// Where the final report is written as JSON
    #[serde(rename = "results-path", default)]
    pub results_path: Option<String>,
}

fn default_max_items() -> usize {
    100
}

fn default_retry_limit() -> u32 {
    2
}

fn default_location_pattern() -> String {
    "*".to_string()
}

fn default_plan_max_age() -> u64 {
    60 * 60
}

fn default_cache_max_age() -> u64 {
    5 * 60
}

fn default_ready_timeout() -> u64 {
    10_000
}

fn default_poll_interval() -> u64 {
    250
}

fn default_navigation_delay() -> u64 {
    1500
}
