//! Directory enumeration
//!
//! Discovers profile URLs for a batch by driving the lazily-rendered listing
//! page: scroll to the bottom, let the page settle, re-measure the realized
//! entity cards, and stop once the count has been stable for a configured
//! number of iterations. Termination is traded against completeness: a slow
//! network can end enumeration early, but the loop always finishes.

use crate::config::Config;
use crate::render::{PageSession, RenderError, RenderSurface};
use crate::storage::Store;
use crate::url::{parse_http_url, resolve_entity_url};
use crate::{AtlasError, Result};
use std::collections::HashSet;
use std::time::Duration;

/// Entity-card anchors on the listing page (the class carries a build hash
/// suffix, so match on the stable stem)
pub const ENTITY_CARD_SELECTOR: &str = r#"a[class*="_company_"]"#;

/// Enumerates a lazily-rendered directory listing
pub struct DirectoryCrawler<'a> {
    config: &'a Config,
}

impl<'a> DirectoryCrawler<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// Builds the listing URL for a batch label
    pub fn listing_url(&self, batch: &str) -> String {
        format!(
            "{}/?batch={}",
            self.config.directory.listing_url.trim_end_matches('/'),
            batch.replace(' ', "%20")
        )
    }

    /// Discovers all profile URLs for a batch and records them
    ///
    /// Opens one fresh rendering context for the listing page, runs the
    /// convergence loop, resolves and deduplicates the collected links, and
    /// inserts each into the store tagged with the batch label. Returns the
    /// discovered URLs in document order.
    pub async fn discover_batch(
        &self,
        surface: &dyn RenderSurface,
        store: &mut dyn Store,
        batch: &str,
    ) -> Result<Vec<String>> {
        tracing::info!(batch, "starting directory enumeration");

        let mut session = surface.open_session().await?;
        let enumerated = self.enumerate(session.as_mut(), batch).await;
        session.close().await;

        let urls = enumerated?;

        let mut inserted = 0;
        for url in &urls {
            if store.insert_url_if_absent(url, batch)? {
                inserted += 1;
            }
        }

        tracing::info!(
            batch,
            found = urls.len(),
            inserted,
            "directory enumeration complete"
        );

        Ok(urls)
    }

    async fn enumerate(&self, session: &mut dyn PageSession, batch: &str) -> Result<Vec<String>> {
        let listing = self.listing_url(batch);
        let timeout = Duration::from_millis(self.config.scraper.navigation_timeout_ms);

        session
            .navigate(&listing, timeout)
            .await
            .map_err(|e| as_navigation_failure(e, &listing))?;

        // The listing counts as unreachable until at least one card renders
        session
            .wait_for(ENTITY_CARD_SELECTOR, timeout)
            .await
            .map_err(|e| as_navigation_failure(e, &listing))?;

        self.converge(session, batch).await?;

        let base = parse_http_url(&listing)?;
        let hrefs = session.attr_values(ENTITY_CARD_SELECTOR, "href").await?;

        let mut seen = HashSet::new();
        let mut urls = Vec::new();
        for href in hrefs {
            if let Some(resolved) =
                resolve_entity_url(&href, &base, &self.config.directory.entity_path_prefix)
            {
                if seen.insert(resolved.clone()) {
                    urls.push(resolved);
                }
            }
        }

        Ok(urls)
    }

    /// Scroll/settle/re-measure until the card count stops growing
    ///
    /// The stall counter increments on every measurement that matches the
    /// previous one and resets whenever the count changes; the loop ends
    /// once it reaches the configured threshold.
    async fn converge(&self, session: &mut dyn PageSession, batch: &str) -> Result<()> {
        let settle = Duration::from_millis(self.config.scraper.settle_delay_ms);
        let threshold = self.config.scraper.stall_threshold;

        let mut last_count = 0usize;
        let mut stalled = 0u32;

        while stalled < threshold {
            let current = session.count(ENTITY_CARD_SELECTOR).await?;
            tracing::debug!(batch, count = current, stalled, "measured entity cards");

            session.scroll_to_bottom().await?;
            tokio::time::sleep(settle).await;

            if current == last_count {
                stalled += 1;
            } else {
                stalled = 0;
                tracing::info!(
                    batch,
                    count = current,
                    new = current.saturating_sub(last_count),
                    "new entity cards realized"
                );
            }

            last_count = current;
        }

        Ok(())
    }
}

fn as_navigation_failure(err: RenderError, listing: &str) -> AtlasError {
    match err {
        RenderError::Navigation { url, message } => AtlasError::Navigation { url, message },
        RenderError::WaitTimeout {
            selector,
            timeout_ms,
        } => AtlasError::Navigation {
            url: listing.to_string(),
            message: format!("no `{}` rendered within {}ms", selector, timeout_ms),
        },
        other => AtlasError::Render(other),
    }
}
