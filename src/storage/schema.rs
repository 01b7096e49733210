//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the Batch-Atlas
//! database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Every profile URL discovered in the directory, with its lifecycle status
CREATE TABLE IF NOT EXISTS directory_urls (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    url TEXT NOT NULL UNIQUE,
    batch TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'pending',
    discovered_at TEXT NOT NULL,
    last_scraped_at TEXT,
    sync_id TEXT
);

CREATE INDEX IF NOT EXISTS idx_directory_urls_status ON directory_urls(status);
CREATE INDEX IF NOT EXISTS idx_directory_urls_batch ON directory_urls(batch);

-- One scraped profile per URL; every successful scrape overwrites all
-- scrapeable columns (latest scrape wins)
CREATE TABLE IF NOT EXISTS company_profiles (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    url_id INTEGER NOT NULL UNIQUE REFERENCES directory_urls(id),
    name TEXT NOT NULL,
    location TEXT,
    description TEXT,
    directory_url TEXT NOT NULL,
    website TEXT,
    company_profile_links TEXT,
    founder_profile_links TEXT,
    founder_names TEXT,
    batch TEXT NOT NULL,
    body_text TEXT,
    last_updated TEXT NOT NULL,
    theme TEXT,
    tags TEXT,
    rationale TEXT
);

CREATE INDEX IF NOT EXISTS idx_company_profiles_batch ON company_profiles(batch);
CREATE INDEX IF NOT EXISTS idx_company_profiles_theme ON company_profiles(theme);
"#;

/// Initializes the database schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
