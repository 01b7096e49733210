//! Storage module for persisting harvest data
//!
//! This module handles all database operations for the harvester, including:
//! - SQLite database initialization and schema management
//! - The URL frontier (discovered profile URLs and their lifecycle status)
//! - Company profile persistence with wholesale overwrite on re-scrape
//! - Classification triple storage and reset

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStore;
pub use traits::{Store, StoreError, StoreResult};

use crate::state::ScrapeStatus;
use crate::AtlasError;

use std::path::Path;

/// Initializes or opens a storage database
pub fn open_store(path: &Path) -> Result<SqliteStore, AtlasError> {
    SqliteStore::new(path)
}

/// Represents a discovered profile URL in the database
#[derive(Debug, Clone)]
pub struct UrlRecord {
    pub id: i64,
    pub url: String,
    pub batch: String,
    pub status: ScrapeStatus,
    pub discovered_at: String,
    pub last_scraped_at: Option<String>,
    /// Opaque handle written back by the external sync collaborator
    pub sync_id: Option<String>,
}

/// Represents a scraped company profile in the database
///
/// One-to-one with a [`UrlRecord`] via `url_id`. Ordered-set fields
/// (founder names, profile links, tags) are stored comma-joined and split
/// on read. The classification triple (`theme`, `tags`, `rationale`) is
/// either entirely absent or entirely present.
#[derive(Debug, Clone)]
pub struct ProfileRecord {
    pub id: i64,
    pub url_id: i64,
    pub name: String,
    pub location: Option<String>,
    pub description: Option<String>,
    /// The directory URL this profile was scraped from
    pub directory_url: String,
    pub website: Option<String>,
    pub company_profile_links: Vec<String>,
    pub founder_profile_links: Vec<String>,
    pub founder_names: Vec<String>,
    pub batch: String,
    pub body_text: Option<String>,
    pub last_updated: String,
    pub theme: Option<String>,
    pub tags: Vec<String>,
    pub rationale: Option<String>,
}

/// Joins an ordered set for column storage; empty sets become NULL
pub(crate) fn join_list(items: &[String]) -> Option<String> {
    if items.is_empty() {
        None
    } else {
        Some(items.join(","))
    }
}

/// Splits a comma-joined column back into its ordered set
pub(crate) fn split_list(column: Option<String>) -> Vec<String> {
    match column {
        Some(joined) if !joined.is_empty() => joined.split(',').map(|s| s.to_string()).collect(),
        _ => Vec::new(),
    }
}
