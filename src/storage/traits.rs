//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::classify::Classification;
use crate::crawler::CompanyProfile;
use crate::state::ScrapeStatus;
use crate::storage::{ProfileRecord, UrlRecord};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("URL not found: {0}")]
    UrlNotFound(String),

    #[error("Profile not found for id {0}")]
    ProfileNotFound(i64),

    #[error("Invalid status transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: ScrapeStatus,
        to: ScrapeStatus,
    },

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Trait for storage backend implementations
///
/// Each operation is individually transactional; no operation spans more
/// than one URL or profile.
pub trait Store {
    // ===== URL Frontier =====

    /// Inserts a discovered URL if it is not already present
    ///
    /// Idempotent by `url`: a duplicate insert is a logged no-op. Newly
    /// inserted URLs start in [`ScrapeStatus::Pending`].
    ///
    /// # Returns
    ///
    /// `true` if the URL was inserted, `false` if it already existed
    fn insert_url_if_absent(&mut self, url: &str, batch: &str) -> StoreResult<bool>;

    /// Gets a URL record by its URL key
    fn get_url(&self, url: &str) -> StoreResult<Option<UrlRecord>>;

    /// Gets all URL records in a given status, oldest discovery first
    fn urls_by_status(
        &self,
        status: ScrapeStatus,
        limit: Option<usize>,
    ) -> StoreResult<Vec<UrlRecord>>;

    /// Moves a URL to a new status, stamping `last_scraped_at`
    ///
    /// Rejects transitions that [`ScrapeStatus::can_transition`] does not
    /// allow with [`StoreError::InvalidTransition`].
    fn mark_status(
        &mut self,
        url: &str,
        status: ScrapeStatus,
        timestamp: DateTime<Utc>,
    ) -> StoreResult<()>;

    /// Returns every failed URL to `Pending` (the external re-enqueue)
    ///
    /// # Returns
    ///
    /// The number of URLs requeued
    fn requeue_failed(&mut self) -> StoreResult<usize>;

    /// Records the sync collaborator's opaque handle on a URL record
    fn set_sync_id(&mut self, url: &str, sync_id: &str) -> StoreResult<()>;

    // ===== Profiles =====

    /// Inserts or overwrites the profile owned by `url_id`
    ///
    /// If a profile already exists for this URL, every scrapeable column is
    /// replaced wholesale; a re-scrape that failed to find a field nulls
    /// it out. Classification columns are left untouched.
    ///
    /// # Returns
    ///
    /// The profile ID (newly created or existing)
    fn upsert_profile(
        &mut self,
        url_id: i64,
        profile: &CompanyProfile,
        timestamp: DateTime<Utc>,
    ) -> StoreResult<i64>;

    /// Gets the profile owned by a URL record, if one has been scraped
    fn get_profile_by_url_id(&self, url_id: i64) -> StoreResult<Option<ProfileRecord>>;

    /// Gets profiles with a non-null body and no classification yet
    fn unclassified_profiles(&self, limit: Option<usize>) -> StoreResult<Vec<ProfileRecord>>;

    /// Stores the classification triple on a profile in a single update
    ///
    /// All three fields are set together, preserving the all-or-nothing
    /// invariant on the classification columns.
    fn store_classification(
        &mut self,
        profile_id: i64,
        classification: &Classification,
    ) -> StoreResult<()>;

    /// Clears the classification triple on a profile (external reset path)
    fn reset_classification(&mut self, profile_id: i64) -> StoreResult<()>;

    // ===== Export and Statistics =====

    /// Gets all profiles, ordered by name
    fn all_profiles(&self) -> StoreResult<Vec<ProfileRecord>>;

    /// Gets all profiles belonging to a batch, ordered by name
    fn profiles_by_batch(&self, batch: &str) -> StoreResult<Vec<ProfileRecord>>;

    /// Counts URLs in a given status
    fn count_urls_by_status(&self, status: ScrapeStatus) -> StoreResult<u64>;

    /// Counts all discovered URLs
    fn count_total_urls(&self) -> StoreResult<u64>;

    /// Counts scraped profiles
    fn count_profiles(&self) -> StoreResult<u64>;

    /// Counts profiles carrying a classification
    fn count_classified(&self) -> StoreResult<u64>;

    /// Gets URL counts per batch label
    fn urls_per_batch(&self) -> StoreResult<HashMap<String, u64>>;
}
