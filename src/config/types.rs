use serde::Deserialize;

/// Main configuration structure for Batch-Atlas
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub directory: DirectoryConfig,
    #[serde(default)]
    pub scraper: ScraperConfig,
    pub analyzer: AnalyzerConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub export: ExportConfig,
}

/// Target directory configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DirectoryConfig {
    /// Listing page URL, without the batch query (e.g. "https://www.ycombinator.com/companies")
    #[serde(rename = "listing-url")]
    pub listing_url: String,

    /// Path prefix that identifies profile pages on the site
    #[serde(rename = "entity-path-prefix", default = "default_entity_path_prefix")]
    pub entity_path_prefix: String,

    /// Batch labels to enumerate (e.g. ["Winter 2025", "W25"])
    #[serde(default)]
    pub batches: Vec<String>,
}

/// Scraper behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ScraperConfig {
    /// Timeout for navigation and element waits (milliseconds)
    #[serde(rename = "navigation-timeout-ms", default = "default_navigation_timeout")]
    pub navigation_timeout_ms: u64,

    /// Wait after each scroll before re-measuring rendered cards (milliseconds)
    #[serde(rename = "settle-delay-ms", default = "default_settle_delay")]
    pub settle_delay_ms: u64,

    /// Consecutive unchanged measurements that end directory enumeration
    #[serde(rename = "stall-threshold", default = "default_stall_threshold")]
    pub stall_threshold: u32,

    /// Retries per URL after the initial attempt
    #[serde(rename = "max-retries", default = "default_max_retries")]
    pub max_retries: u32,

    /// Base delay between retries; multiplied by the attempt number (milliseconds)
    #[serde(rename = "base-retry-delay-ms", default = "default_base_retry_delay")]
    pub base_retry_delay_ms: u64,
}

/// LLM classification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AnalyzerConfig {
    /// Model identifier passed to the classification collaborator
    pub model: String,

    /// Bodies shorter than this (after trimming) are skipped, not classified
    #[serde(rename = "min-body-chars", default = "default_min_body_chars")]
    pub min_body_chars: usize,

    /// Retries per profile after the initial classification attempt
    #[serde(rename = "max-retries", default = "default_max_retries")]
    pub max_retries: u32,

    /// Fixed delay between classification retries (milliseconds)
    #[serde(rename = "retry-delay-ms", default = "default_classify_retry_delay")]
    pub retry_delay_ms: u64,

    /// Analysis prompt template; "{{body}}" is replaced with the profile body
    #[serde(rename = "classification-prompt")]
    pub classification_prompt: String,
}

/// Storage configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

/// CSV export configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ExportConfig {
    /// Directory that export files are written into
    #[serde(default = "default_export_path")]
    pub path: String,

    /// Profile columns to project, in output order
    #[serde(default = "default_export_columns")]
    pub columns: Vec<String>,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            navigation_timeout_ms: default_navigation_timeout(),
            settle_delay_ms: default_settle_delay(),
            stall_threshold: default_stall_threshold(),
            max_retries: default_max_retries(),
            base_retry_delay_ms: default_base_retry_delay(),
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            path: default_export_path(),
            columns: default_export_columns(),
        }
    }
}

fn default_entity_path_prefix() -> String {
    "/companies/".to_string()
}

fn default_navigation_timeout() -> u64 {
    30_000
}

fn default_settle_delay() -> u64 {
    1_500
}

fn default_stall_threshold() -> u32 {
    3
}

fn default_max_retries() -> u32 {
    3
}

fn default_base_retry_delay() -> u64 {
    2_000
}

fn default_min_body_chars() -> usize {
    10
}

fn default_classify_retry_delay() -> u64 {
    5_000
}

fn default_export_path() -> String {
    "data/exports".to_string()
}

fn default_export_columns() -> Vec<String> {
    [
        "name",
        "batch",
        "location",
        "description",
        "website",
        "directory_url",
        "founder_names",
        "theme",
        "tags",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}
