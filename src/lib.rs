//! Batch-Atlas: a startup directory profile harvester
//!
//! This crate implements a pipeline that discovers company profile URLs in a
//! lazily-rendered accelerator directory, extracts structured attributes from
//! each rendered profile page, persists them, and annotates the free-text
//! body with an LLM-provided classification.

pub mod classify;
pub mod config;
pub mod crawler;
pub mod output;
pub mod render;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for Batch-Atlas operations
#[derive(Debug, Error)]
pub enum AtlasError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Navigation failure for {url}: {message}")]
    Navigation { url: String, message: String },

    #[error("Timed out waiting for `{selector}` on {url}")]
    ElementWait { url: String, selector: String },

    #[error("Persistence error: {0}")]
    Persistence(#[from] storage::StoreError),

    #[error("Classification response failed validation: {0}")]
    ClassificationValidation(String),

    #[error("Classification collaborator error: {0}")]
    Classifier(String),

    #[error("Render surface error: {0}")]
    Render(#[from] render::RenderError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,
}

/// Result type alias for Batch-Atlas operations
pub type Result<T> = std::result::Result<T, AtlasError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::CompanyProfile;
pub use state::ScrapeStatus;
pub use storage::{SqliteStore, Store};
