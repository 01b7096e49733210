//! Statistics generation from the harvest database
//!
//! This module provides functionality for extracting and displaying
//! harvest statistics from the storage layer.

use crate::state::ScrapeStatus;
use crate::storage::Store;
use crate::Result;
use std::collections::HashMap;

/// Harvest statistics summary
#[derive(Debug, Clone)]
pub struct HarvestStatistics {
    /// Total number of profile URLs discovered
    pub total_urls: u64,

    /// Count of URLs by lifecycle status
    pub urls_by_status: HashMap<ScrapeStatus, u64>,

    /// URL counts per batch label
    pub urls_per_batch: HashMap<String, u64>,

    /// Number of scraped profiles
    pub total_profiles: u64,

    /// Number of profiles carrying a classification
    pub classified_profiles: u64,
}

/// Loads statistics from the store
pub fn load_statistics(store: &dyn Store) -> Result<HarvestStatistics> {
    let total_urls = store.count_total_urls()?;

    let mut urls_by_status = HashMap::new();
    for status in ScrapeStatus::all_statuses() {
        let count = store.count_urls_by_status(status)?;
        if count > 0 {
            urls_by_status.insert(status, count);
        }
    }

    Ok(HarvestStatistics {
        total_urls,
        urls_by_status,
        urls_per_batch: store.urls_per_batch()?,
        total_profiles: store.count_profiles()?,
        classified_profiles: store.count_classified()?,
    })
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &HarvestStatistics) {
    println!("=== Harvest Statistics ===\n");

    println!("Overview:");
    println!("  URLs discovered: {}", stats.total_urls);
    println!("  Profiles scraped: {}", stats.total_profiles);
    println!("  Profiles classified: {}", stats.classified_profiles);
    println!();

    println!("URLs by Status:");
    let mut status_counts: Vec<_> = stats.urls_by_status.iter().collect();
    status_counts.sort_by(|a, b| b.1.cmp(a.1));

    for (status, count) in status_counts {
        let percentage = if stats.total_urls > 0 {
            (*count as f64 / stats.total_urls as f64) * 100.0
        } else {
            0.0
        };
        println!("  {}: {} ({:.1}%)", status, count, percentage);
    }
    println!();

    if !stats.urls_per_batch.is_empty() {
        println!("URLs per Batch:");
        let mut batch_counts: Vec<_> = stats.urls_per_batch.iter().collect();
        batch_counts.sort_by(|a, b| a.0.cmp(b.0));

        for (batch, count) in batch_counts {
            println!("  {}: {}", batch, count);
        }
        println!();
    }

    let scraped = stats
        .urls_by_status
        .get(&ScrapeStatus::Completed)
        .copied()
        .unwrap_or(0)
        + stats
            .urls_by_status
            .get(&ScrapeStatus::CompletedNoContent)
            .copied()
            .unwrap_or(0);
    let success_rate = if stats.total_urls > 0 {
        (scraped as f64 / stats.total_urls as f64) * 100.0
    } else {
        0.0
    };

    println!(
        "Success Rate: {:.1}% ({} / {} URLs scraped)",
        success_rate, scraped, stats.total_urls
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::CompanyProfile;
    use crate::storage::SqliteStore;
    use chrono::Utc;

    #[test]
    fn test_load_statistics() {
        let mut store = SqliteStore::new_in_memory().unwrap();

        store
            .insert_url_if_absent("https://d.example.com/companies/a", "W25")
            .unwrap();
        store
            .insert_url_if_absent("https://d.example.com/companies/b", "W25")
            .unwrap();
        store
            .mark_status(
                "https://d.example.com/companies/a",
                ScrapeStatus::Completed,
                Utc::now(),
            )
            .unwrap();

        let url_id = store
            .get_url("https://d.example.com/companies/a")
            .unwrap()
            .unwrap()
            .id;
        store
            .upsert_profile(
                url_id,
                &CompanyProfile {
                    name: "A".to_string(),
                    description: None,
                    location: None,
                    directory_url: "https://d.example.com/companies/a".to_string(),
                    website: None,
                    company_profile_links: vec![],
                    founder_profile_links: vec![],
                    founder_names: vec![],
                    batch: "W25".to_string(),
                    body_text: "body".to_string(),
                },
                Utc::now(),
            )
            .unwrap();

        let stats = load_statistics(&store).unwrap();

        assert_eq!(stats.total_urls, 2);
        assert_eq!(stats.total_profiles, 1);
        assert_eq!(stats.classified_profiles, 0);
        assert_eq!(
            stats.urls_by_status.get(&ScrapeStatus::Completed),
            Some(&1)
        );
        assert_eq!(stats.urls_by_status.get(&ScrapeStatus::Pending), Some(&1));
        assert_eq!(stats.urls_per_batch.get("W25"), Some(&2));
    }

    #[test]
    fn test_empty_store_statistics() {
        let store = SqliteStore::new_in_memory().unwrap();
        let stats = load_statistics(&store).unwrap();

        assert_eq!(stats.total_urls, 0);
        assert!(stats.urls_by_status.is_empty());
        assert!(stats.urls_per_batch.is_empty());
    }
}
