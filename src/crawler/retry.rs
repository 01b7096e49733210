//! Per-URL scrape orchestration with bounded retry
//!
//! Each URL gets a fresh rendering context per attempt. Failures feed a
//! plain bounded loop, never a recursive re-entry, so the attempt count
//! stays explicit and inspectable. Only after the loop exhausts every attempt does
//! a URL become terminally `failed`, and nothing un-fails it short of an
//! explicit requeue.

use crate::config::Config;
use crate::crawler::extractor::{
    extract_profile, FOUNDER_BLOCK_SELECTOR, TITLE_SELECTOR,
};
use crate::render::{PageSession, RenderError, RenderSurface};
use crate::state::ScrapeStatus;
use crate::storage::{Store, UrlRecord};
use crate::{AtlasError, Result};
use chrono::Utc;
use std::time::Duration;

/// Outcome counts for a scrape pass
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ScrapeSummary {
    pub completed: usize,
    pub no_content: usize,
    pub failed: usize,
}

/// Scrapes every pending URL, one at a time
///
/// Each URL is handled independently: a URL that exhausts its retries is
/// marked failed and logged, and the pass moves on to the next one.
pub async fn scrape_pending(
    surface: &dyn RenderSurface,
    store: &mut dyn Store,
    config: &Config,
    limit: Option<usize>,
) -> Result<ScrapeSummary> {
    let pending = store.urls_by_status(ScrapeStatus::Pending, limit)?;
    tracing::info!(count = pending.len(), "scraping pending profile URLs");

    let mut summary = ScrapeSummary::default();

    for record in pending {
        match scrape_url(surface, store, config, &record).await {
            Ok(ScrapeStatus::Completed) => summary.completed += 1,
            Ok(ScrapeStatus::CompletedNoContent) => summary.no_content += 1,
            Ok(_) => summary.failed += 1,
            Err(e) => {
                tracing::error!(url = %record.url, error = %e, "unrecoverable error while scraping");
                summary.failed += 1;
            }
        }
    }

    tracing::info!(
        completed = summary.completed,
        no_content = summary.no_content,
        failed = summary.failed,
        "scrape pass finished"
    );

    Ok(summary)
}

/// Scrapes a single URL with bounded retry
///
/// With `max_retries` retries configured, at most `max_retries + 1` attempts
/// run. Between attempts the loop backs off `base_delay × attempt_number`.
/// On exhaustion the URL is marked [`ScrapeStatus::Failed`], the sole point
/// where partial failure becomes terminal, externally-visible state.
pub async fn scrape_url(
    surface: &dyn RenderSurface,
    store: &mut dyn Store,
    config: &Config,
    record: &UrlRecord,
) -> Result<ScrapeStatus> {
    let base_delay = Duration::from_millis(config.scraper.base_retry_delay_ms);
    let mut attempt: u32 = 0;

    loop {
        attempt += 1;

        match attempt_scrape(surface, store, config, record).await {
            Ok(status) => {
                tracing::info!(url = %record.url, status = %status, attempt, "scrape succeeded");
                return Ok(status);
            }
            Err(e) => {
                tracing::warn!(url = %record.url, attempt, error = %e, "scrape attempt failed");

                if attempt > config.scraper.max_retries {
                    store.mark_status(&record.url, ScrapeStatus::Failed, Utc::now())?;
                    tracing::error!(
                        url = %record.url,
                        attempts = attempt,
                        "scrape attempts exhausted, marked failed"
                    );
                    return Ok(ScrapeStatus::Failed);
                }

                tokio::time::sleep(base_delay * attempt).await;
            }
        }
    }
}

/// Runs one attempt in a fresh rendering context, torn down afterwards
async fn attempt_scrape(
    surface: &dyn RenderSurface,
    store: &mut dyn Store,
    config: &Config,
    record: &UrlRecord,
) -> Result<ScrapeStatus> {
    let mut session = surface.open_session().await?;
    let outcome = run_attempt(session.as_mut(), store, config, record).await;
    session.close().await;
    outcome
}

async fn run_attempt(
    session: &mut dyn PageSession,
    store: &mut dyn Store,
    config: &Config,
    record: &UrlRecord,
) -> Result<ScrapeStatus> {
    let timeout = Duration::from_millis(config.scraper.navigation_timeout_ms);

    session
        .navigate(&record.url, timeout)
        .await
        .map_err(|e| match e {
            RenderError::Navigation { url, message } => AtlasError::Navigation { url, message },
            other => AtlasError::Render(other),
        })?;

    // Readiness gate: both the title and the founder block must have
    // rendered, otherwise the page is half-rendered or has drifted
    for required in [TITLE_SELECTOR, FOUNDER_BLOCK_SELECTOR] {
        session
            .wait_for(required, timeout)
            .await
            .map_err(|e| match e {
                RenderError::WaitTimeout { selector, .. } => AtlasError::ElementWait {
                    url: record.url.clone(),
                    selector,
                },
                other => AtlasError::Render(other),
            })?;
    }

    let html = session.content().await?;
    let profile = extract_profile(&html, &record.url);

    let status = if profile.has_body() {
        ScrapeStatus::Completed
    } else {
        ScrapeStatus::CompletedNoContent
    };

    let now = Utc::now();
    store.upsert_profile(record.id, &profile, now)?;
    store.mark_status(&record.url, status, now)?;

    Ok(status)
}
