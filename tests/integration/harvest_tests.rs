//! End-to-end pipeline tests
//!
//! These tests drive the full discover / scrape / classify / export cycle
//! against fixture render surfaces and an on-disk database, without any
//! browser or network.

use async_trait::async_trait;
use batch_atlas::classify::{ClassificationOrchestrator, Classifier};
use batch_atlas::config::{
    AnalyzerConfig, Config, DirectoryConfig, ExportConfig, ScraperConfig, StorageConfig,
};
use batch_atlas::crawler::{scrape_pending, DirectoryCrawler};
use batch_atlas::output::{export_profiles, load_statistics};
use batch_atlas::render::FixtureSurface;
use batch_atlas::state::ScrapeStatus;
use batch_atlas::storage::{SqliteStore, Store};
use serde_json::{json, Value};
use tempfile::TempDir;

fn test_config(db_path: &str, export_path: &str) -> Config {
    Config {
        directory: DirectoryConfig {
            listing_url: "https://www.ycombinator.com/companies".to_string(),
            entity_path_prefix: "/companies/".to_string(),
            batches: vec!["W25".to_string()],
        },
        scraper: ScraperConfig {
            navigation_timeout_ms: 1_000,
            settle_delay_ms: 1,
            stall_threshold: 3,
            max_retries: 1,
            base_retry_delay_ms: 1,
        },
        analyzer: AnalyzerConfig {
            model: "o4-mini".to_string(),
            min_body_chars: 10,
            max_retries: 1,
            retry_delay_ms: 1,
            classification_prompt: "Analyze this company: {{body}}".to_string(),
        },
        storage: StorageConfig {
            database_path: db_path.to_string(),
        },
        export: ExportConfig {
            path: export_path.to_string(),
            columns: vec![
                "name".to_string(),
                "batch".to_string(),
                "theme".to_string(),
            ],
        },
    }
}

/// One document that serves as both the listing and every profile page
fn combined_fixture_html() -> String {
    r##"<html><body>
    <a class="_company_i9oky_355" href="/companies/acme">Acme</a>
    <a class="_company_i9oky_355" href="/companies/beta">Beta</a>
    <section class="relative isolate">
        <div>
            <h1>Acme Robotics</h1>
            <div>Warehouse robots that never sleep</div>
        </div>
        <a href="/companies?batch=W25"><div class="yc-tw-Pill"><span>W25</span></div></a>
        <div class="group flex gap-4">Founders</div>
    </section>
    </body></html>"##
        .to_string()
}

struct StubClassifier {
    response: Value,
}

#[async_trait]
impl Classifier for StubClassifier {
    async fn classify(&self, _name: &str, _body: &str) -> anyhow::Result<Value> {
        Ok(self.response.clone())
    }
}

#[tokio::test]
async fn test_full_pipeline() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("harvest.db");
    let export_path = dir.path().join("exports");
    let config = test_config(
        &db_path.to_string_lossy(),
        &export_path.to_string_lossy(),
    );

    let mut store = SqliteStore::new(&db_path).expect("Failed to open DB");
    let surface = FixtureSurface::new(combined_fixture_html());

    // Discover: both cards become pending URLs
    let crawler = DirectoryCrawler::new(&config);
    let urls = crawler
        .discover_batch(&surface, &mut store, "W25")
        .await
        .expect("Discovery failed");
    assert_eq!(urls.len(), 2);
    assert_eq!(store.count_urls_by_status(ScrapeStatus::Pending).unwrap(), 2);

    // Scrape: every pending URL completes with a profile
    let summary = scrape_pending(&surface, &mut store, &config, None)
        .await
        .expect("Scrape pass failed");
    assert_eq!(summary.completed, 2);
    assert_eq!(store.count_profiles().unwrap(), 2);
    assert_eq!(
        store.count_urls_by_status(ScrapeStatus::Completed).unwrap(),
        2
    );

    // Classify: the stub collaborator annotates both profiles
    let classifier = StubClassifier {
        response: json!({
            "theme": "AI Agents",
            "tags": ["Agentic Workflow"],
            "rationale": "Builds autonomous robots."
        }),
    };
    let orchestrator = ClassificationOrchestrator::new(&classifier, &config.analyzer);
    let summary = orchestrator.run(&mut store, None).await.unwrap();
    assert_eq!(summary.classified, 2);

    let url_id = store.get_url(&urls[0]).unwrap().unwrap().id;
    let profile = store.get_profile_by_url_id(url_id).unwrap().unwrap();
    assert_eq!(profile.theme, Some("AI Agents".to_string()));
    assert_eq!(profile.tags, vec!["Agentic Workflow".to_string()]);

    // Export: both rows appear with the classification column
    let path = export_profiles(&store, &config.export, Some("out.csv"), None).unwrap();
    let content = std::fs::read_to_string(path).unwrap();
    assert_eq!(content.lines().count(), 3);
    assert!(content.contains("Acme Robotics,W25,AI Agents"));

    // Stats reflect the finished run
    let stats = load_statistics(&store).unwrap();
    assert_eq!(stats.total_urls, 2);
    assert_eq!(stats.classified_profiles, 2);
}

#[tokio::test]
async fn test_rerun_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("harvest.db");
    let config = test_config(&db_path.to_string_lossy(), "unused");

    let mut store = SqliteStore::new(&db_path).unwrap();
    let surface = FixtureSurface::new(combined_fixture_html());
    let crawler = DirectoryCrawler::new(&config);

    // First full pass
    crawler
        .discover_batch(&surface, &mut store, "W25")
        .await
        .unwrap();
    scrape_pending(&surface, &mut store, &config, None)
        .await
        .unwrap();

    // Second pass over an unchanged directory: no new URLs, no pending
    // work, and still exactly one profile per URL
    crawler
        .discover_batch(&surface, &mut store, "W25")
        .await
        .unwrap();
    let summary = scrape_pending(&surface, &mut store, &config, None)
        .await
        .unwrap();

    assert_eq!(summary.completed + summary.no_content + summary.failed, 0);
    assert_eq!(store.count_total_urls().unwrap(), 2);
    assert_eq!(store.count_profiles().unwrap(), 2);
}

#[tokio::test]
async fn test_failed_urls_recover_through_requeue() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("harvest.db");
    let config = test_config(&db_path.to_string_lossy(), "unused");

    let mut store = SqliteStore::new(&db_path).unwrap();
    let crawler = DirectoryCrawler::new(&config);

    // Discovery works, but every profile navigation fails
    let broken = FixtureSurface::new(combined_fixture_html());
    crawler
        .discover_batch(&broken, &mut store, "W25")
        .await
        .unwrap();

    let failing =
        FixtureSurface::new(combined_fixture_html()).with_navigation_error("connection reset");
    let summary = scrape_pending(&failing, &mut store, &config, None)
        .await
        .unwrap();
    assert_eq!(summary.failed, 2);
    assert_eq!(store.count_urls_by_status(ScrapeStatus::Failed).unwrap(), 2);

    // Failed URLs stay failed until the external requeue flips them back
    let summary = scrape_pending(&failing, &mut store, &config, None)
        .await
        .unwrap();
    assert_eq!(summary.failed, 0);

    let requeued = store.requeue_failed().unwrap();
    assert_eq!(requeued, 2);

    // With a healthy surface the requeued URLs complete normally
    let healthy = FixtureSurface::new(combined_fixture_html());
    let summary = scrape_pending(&healthy, &mut store, &config, None)
        .await
        .unwrap();
    assert_eq!(summary.completed, 2);
    assert_eq!(store.count_urls_by_status(ScrapeStatus::Failed).unwrap(), 0);
}

#[tokio::test]
async fn test_database_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("harvest.db");
    let config = test_config(&db_path.to_string_lossy(), "unused");

    {
        let mut store = SqliteStore::new(&db_path).unwrap();
        let surface = FixtureSurface::new(combined_fixture_html());
        let crawler = DirectoryCrawler::new(&config);
        crawler
            .discover_batch(&surface, &mut store, "W25")
            .await
            .unwrap();
        scrape_pending(&surface, &mut store, &config, Some(1))
            .await
            .unwrap();
    }

    // Reopen: one URL completed, one still pending, progress intact
    let store = SqliteStore::new(&db_path).unwrap();
    assert_eq!(store.count_total_urls().unwrap(), 2);
    assert_eq!(
        store.count_urls_by_status(ScrapeStatus::Completed).unwrap(),
        1
    );
    assert_eq!(store.count_urls_by_status(ScrapeStatus::Pending).unwrap(), 1);
}
