//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Store trait.

use crate::classify::Classification;
use crate::crawler::CompanyProfile;
use crate::state::ScrapeStatus;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Store, StoreError, StoreResult};
use crate::storage::{join_list, split_list, ProfileRecord, UrlRecord};
use crate::AtlasError;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::HashMap;
use std::path::Path;

/// SQLite storage backend
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Creates a new SqliteStore instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    pub fn new(path: &Path) -> Result<Self, AtlasError> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for tests and dry runs)
    pub fn new_in_memory() -> Result<Self, AtlasError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    fn url_from_row(row: &Row<'_>) -> rusqlite::Result<UrlRecord> {
        Ok(UrlRecord {
            id: row.get(0)?,
            url: row.get(1)?,
            batch: row.get(2)?,
            status: ScrapeStatus::from_db_string(&row.get::<_, String>(3)?)
                .unwrap_or(ScrapeStatus::Failed),
            discovered_at: row.get(4)?,
            last_scraped_at: row.get(5)?,
            sync_id: row.get(6)?,
        })
    }

    fn profile_from_row(row: &Row<'_>) -> rusqlite::Result<ProfileRecord> {
        Ok(ProfileRecord {
            id: row.get(0)?,
            url_id: row.get(1)?,
            name: row.get(2)?,
            location: row.get(3)?,
            description: row.get(4)?,
            directory_url: row.get(5)?,
            website: row.get(6)?,
            company_profile_links: split_list(row.get(7)?),
            founder_profile_links: split_list(row.get(8)?),
            founder_names: split_list(row.get(9)?),
            batch: row.get(10)?,
            body_text: row.get(11)?,
            last_updated: row.get(12)?,
            theme: row.get(13)?,
            tags: split_list(row.get(14)?),
            rationale: row.get(15)?,
        })
    }
}

const URL_COLUMNS: &str = "id, url, batch, status, discovered_at, last_scraped_at, sync_id";

const PROFILE_COLUMNS: &str = "id, url_id, name, location, description, directory_url, website,
     company_profile_links, founder_profile_links, founder_names, batch,
     body_text, last_updated, theme, tags, rationale";

impl Store for SqliteStore {
    // ===== URL Frontier =====

    fn insert_url_if_absent(&mut self, url: &str, batch: &str) -> StoreResult<bool> {
        let existing: Option<i64> = self
            .conn
            .query_row(
                "SELECT id FROM directory_urls WHERE url = ?1",
                params![url],
                |row| row.get(0),
            )
            .optional()?;

        if existing.is_some() {
            tracing::debug!(url, "URL already known, skipping insert");
            return Ok(false);
        }

        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO directory_urls (url, batch, status, discovered_at) VALUES (?1, ?2, ?3, ?4)",
            params![url, batch, ScrapeStatus::Pending.to_db_string(), now],
        )?;

        tracing::info!(url, batch, "discovered new profile URL");
        Ok(true)
    }

    fn get_url(&self, url: &str) -> StoreResult<Option<UrlRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM directory_urls WHERE url = ?1",
            URL_COLUMNS
        ))?;

        let record = stmt
            .query_row(params![url], Self::url_from_row)
            .optional()?;

        Ok(record)
    }

    fn urls_by_status(
        &self,
        status: ScrapeStatus,
        limit: Option<usize>,
    ) -> StoreResult<Vec<UrlRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM directory_urls WHERE status = ?1 ORDER BY id LIMIT ?2",
            URL_COLUMNS
        ))?;

        // SQLite treats a negative LIMIT as unlimited
        let limit = limit.map(|l| l as i64).unwrap_or(-1);

        let records = stmt
            .query_map(params![status.to_db_string(), limit], Self::url_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(records)
    }

    fn mark_status(
        &mut self,
        url: &str,
        status: ScrapeStatus,
        timestamp: DateTime<Utc>,
    ) -> StoreResult<()> {
        let current = self
            .get_url(url)?
            .ok_or_else(|| StoreError::UrlNotFound(url.to_string()))?;

        if !current.status.can_transition(status) {
            return Err(StoreError::InvalidTransition {
                from: current.status,
                to: status,
            });
        }

        self.conn.execute(
            "UPDATE directory_urls SET status = ?1, last_scraped_at = ?2 WHERE url = ?3",
            params![status.to_db_string(), timestamp.to_rfc3339(), url],
        )?;

        Ok(())
    }

    fn requeue_failed(&mut self) -> StoreResult<usize> {
        let changed = self.conn.execute(
            "UPDATE directory_urls SET status = ?1 WHERE status = ?2",
            params![
                ScrapeStatus::Pending.to_db_string(),
                ScrapeStatus::Failed.to_db_string()
            ],
        )?;

        Ok(changed)
    }

    fn set_sync_id(&mut self, url: &str, sync_id: &str) -> StoreResult<()> {
        let changed = self.conn.execute(
            "UPDATE directory_urls SET sync_id = ?1 WHERE url = ?2",
            params![sync_id, url],
        )?;

        if changed == 0 {
            return Err(StoreError::UrlNotFound(url.to_string()));
        }

        Ok(())
    }

    // ===== Profiles =====

    fn upsert_profile(
        &mut self,
        url_id: i64,
        profile: &CompanyProfile,
        timestamp: DateTime<Utc>,
    ) -> StoreResult<i64> {
        let existing: Option<i64> = self
            .conn
            .query_row(
                "SELECT id FROM company_profiles WHERE url_id = ?1",
                params![url_id],
                |row| row.get(0),
            )
            .optional()?;

        // An empty body is stored as NULL so the classification query can
        // filter on body presence alone
        let body = if profile.body_text.trim().is_empty() {
            None
        } else {
            Some(profile.body_text.as_str())
        };

        let now = timestamp.to_rfc3339();

        if let Some(id) = existing {
            self.conn.execute(
                "UPDATE company_profiles SET name = ?1, location = ?2, description = ?3,
                 directory_url = ?4, website = ?5, company_profile_links = ?6,
                 founder_profile_links = ?7, founder_names = ?8, batch = ?9,
                 body_text = ?10, last_updated = ?11
                 WHERE id = ?12",
                params![
                    profile.name,
                    profile.location,
                    profile.description,
                    profile.directory_url,
                    profile.website,
                    join_list(&profile.company_profile_links),
                    join_list(&profile.founder_profile_links),
                    join_list(&profile.founder_names),
                    profile.batch,
                    body,
                    now,
                    id
                ],
            )?;

            tracing::info!(name = %profile.name, "updated existing profile");
            Ok(id)
        } else {
            self.conn.execute(
                "INSERT INTO company_profiles
                 (url_id, name, location, description, directory_url, website,
                  company_profile_links, founder_profile_links, founder_names,
                  batch, body_text, last_updated)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                params![
                    url_id,
                    profile.name,
                    profile.location,
                    profile.description,
                    profile.directory_url,
                    profile.website,
                    join_list(&profile.company_profile_links),
                    join_list(&profile.founder_profile_links),
                    join_list(&profile.founder_names),
                    profile.batch,
                    body,
                    now
                ],
            )?;

            tracing::info!(name = %profile.name, "stored new profile");
            Ok(self.conn.last_insert_rowid())
        }
    }

    fn get_profile_by_url_id(&self, url_id: i64) -> StoreResult<Option<ProfileRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM company_profiles WHERE url_id = ?1",
            PROFILE_COLUMNS
        ))?;

        let record = stmt
            .query_row(params![url_id], Self::profile_from_row)
            .optional()?;

        Ok(record)
    }

    fn unclassified_profiles(&self, limit: Option<usize>) -> StoreResult<Vec<ProfileRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM company_profiles
             WHERE body_text IS NOT NULL AND theme IS NULL
             ORDER BY id LIMIT ?1",
            PROFILE_COLUMNS
        ))?;

        let limit = limit.map(|l| l as i64).unwrap_or(-1);

        let records = stmt
            .query_map(params![limit], Self::profile_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(records)
    }

    fn store_classification(
        &mut self,
        profile_id: i64,
        classification: &Classification,
    ) -> StoreResult<()> {
        let tags = join_list(&classification.tags);

        let changed = self.conn.execute(
            "UPDATE company_profiles SET theme = ?1, tags = ?2, rationale = ?3 WHERE id = ?4",
            params![
                classification.theme,
                tags,
                classification.rationale,
                profile_id
            ],
        )?;

        if changed == 0 {
            return Err(StoreError::ProfileNotFound(profile_id));
        }

        Ok(())
    }

    fn reset_classification(&mut self, profile_id: i64) -> StoreResult<()> {
        let changed = self.conn.execute(
            "UPDATE company_profiles SET theme = NULL, tags = NULL, rationale = NULL WHERE id = ?1",
            params![profile_id],
        )?;

        if changed == 0 {
            return Err(StoreError::ProfileNotFound(profile_id));
        }

        Ok(())
    }

    // ===== Export and Statistics =====

    fn all_profiles(&self) -> StoreResult<Vec<ProfileRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM company_profiles ORDER BY name",
            PROFILE_COLUMNS
        ))?;

        let records = stmt
            .query_map([], Self::profile_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(records)
    }

    fn profiles_by_batch(&self, batch: &str) -> StoreResult<Vec<ProfileRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM company_profiles WHERE batch = ?1 ORDER BY name",
            PROFILE_COLUMNS
        ))?;

        let records = stmt
            .query_map(params![batch], Self::profile_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(records)
    }

    fn count_urls_by_status(&self, status: ScrapeStatus) -> StoreResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM directory_urls WHERE status = ?1",
            params![status.to_db_string()],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn count_total_urls(&self) -> StoreResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM directory_urls", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn count_profiles(&self) -> StoreResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM company_profiles", [], |row| {
                row.get(0)
            })?;
        Ok(count as u64)
    }

    fn count_classified(&self) -> StoreResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM company_profiles WHERE theme IS NOT NULL",
            [],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn urls_per_batch(&self) -> StoreResult<HashMap<String, u64>> {
        let mut stmt = self
            .conn
            .prepare("SELECT batch, COUNT(*) FROM directory_urls GROUP BY batch")?;

        let mut counts = HashMap::new();
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;

        for row in rows {
            let (batch, count) = row?;
            counts.insert(batch, count as u64);
        }

        Ok(counts)
    }
}
