use crate::config::types::{
    AnalyzerConfig, Config, DirectoryConfig, ExportConfig, ScraperConfig, StorageConfig,
};
use crate::url::parse_http_url;
use crate::ConfigError;

/// Profile columns the exporter knows how to project
pub const EXPORTABLE_COLUMNS: &[&str] = &[
    "name",
    "batch",
    "location",
    "description",
    "website",
    "directory_url",
    "founder_names",
    "founder_profile_links",
    "company_profile_links",
    "theme",
    "tags",
    "rationale",
    "last_updated",
];

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_directory_config(&config.directory)?;
    validate_scraper_config(&config.scraper)?;
    validate_analyzer_config(&config.analyzer)?;
    validate_storage_config(&config.storage)?;
    validate_export_config(&config.export)?;
    Ok(())
}

/// Validates the target directory configuration
fn validate_directory_config(config: &DirectoryConfig) -> Result<(), ConfigError> {
    parse_http_url(&config.listing_url)
        .map_err(|_| ConfigError::InvalidUrl(config.listing_url.clone()))?;

    if !config.entity_path_prefix.starts_with('/') {
        return Err(ConfigError::Validation(format!(
            "entity-path-prefix must start with '/', got '{}'",
            config.entity_path_prefix
        )));
    }

    for batch in &config.batches {
        if batch.trim().is_empty() {
            return Err(ConfigError::Validation(
                "batch labels cannot be empty".to_string(),
            ));
        }
    }

    Ok(())
}

/// Validates scraper configuration
fn validate_scraper_config(config: &ScraperConfig) -> Result<(), ConfigError> {
    if config.navigation_timeout_ms < 1_000 {
        return Err(ConfigError::Validation(format!(
            "navigation-timeout-ms must be >= 1000ms, got {}ms",
            config.navigation_timeout_ms
        )));
    }

    if config.settle_delay_ms < 100 {
        return Err(ConfigError::Validation(format!(
            "settle-delay-ms must be >= 100ms, got {}ms",
            config.settle_delay_ms
        )));
    }

    if config.stall_threshold < 1 {
        return Err(ConfigError::Validation(
            "stall-threshold must be >= 1".to_string(),
        ));
    }

    if config.max_retries > 10 {
        return Err(ConfigError::Validation(format!(
            "max-retries must be <= 10, got {}",
            config.max_retries
        )));
    }

    Ok(())
}

/// Validates analyzer configuration
fn validate_analyzer_config(config: &AnalyzerConfig) -> Result<(), ConfigError> {
    if config.model.is_empty() {
        return Err(ConfigError::Validation(
            "analyzer model cannot be empty".to_string(),
        ));
    }

    if config.classification_prompt.trim().is_empty() {
        return Err(ConfigError::Validation(
            "classification-prompt cannot be empty".to_string(),
        ));
    }

    if !config.classification_prompt.contains("{{body}}") {
        return Err(ConfigError::Validation(
            "classification-prompt must contain the {{body}} placeholder".to_string(),
        ));
    }

    if config.min_body_chars < 1 {
        return Err(ConfigError::Validation(
            "min-body-chars must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates storage configuration
fn validate_storage_config(config: &StorageConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database-path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates export configuration
fn validate_export_config(config: &ExportConfig) -> Result<(), ConfigError> {
    if config.columns.is_empty() {
        return Err(ConfigError::Validation(
            "export columns cannot be empty".to_string(),
        ));
    }

    for column in &config.columns {
        if !EXPORTABLE_COLUMNS.contains(&column.as_str()) {
            return Err(ConfigError::Validation(format!(
                "unknown export column '{}' (known: {})",
                column,
                EXPORTABLE_COLUMNS.join(", ")
            )));
        }
    }

    Ok(())
}
