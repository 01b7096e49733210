//! Batch-Atlas main entry point
//!
//! This is the command-line interface for the Batch-Atlas directory
//! harvester.

use batch_atlas::classify::{ClassificationOrchestrator, OpenAiClassifier};
use batch_atlas::config::{load_config_with_hash, Config};
use batch_atlas::crawler::{scrape_pending, DirectoryCrawler};
use batch_atlas::output::{export_profiles, load_statistics, print_statistics};
use batch_atlas::render::ChromeSurface;
use batch_atlas::storage::{open_store, Store};
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Batch-Atlas: a startup directory profile harvester
///
/// Batch-Atlas discovers company profile URLs in a lazily-rendered
/// directory, scrapes structured attributes from each profile page,
/// classifies the free-text body with an LLM, and exports the results.
#[derive(Parser, Debug)]
#[command(name = "batch-atlas")]
#[command(version = "1.0.0")]
#[command(about = "A startup directory profile harvester", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Batch labels to harvest, overriding the configured list
    #[arg(long, num_args = 1.., value_name = "BATCH")]
    batches: Vec<String>,

    /// Only discover and scrape; skip LLM classification
    #[arg(long, conflicts_with = "analyze_only")]
    scrape_only: bool,

    /// Only classify already-scraped profiles; skip discovery and scraping
    #[arg(long, conflicts_with = "scrape_only")]
    analyze_only: bool,

    /// Return failed URLs to pending before the run
    #[arg(long)]
    requeue_failed: bool,

    /// Maximum number of URLs to scrape this run
    #[arg(long, value_name = "N")]
    url_limit: Option<usize>,

    /// Maximum number of profiles to classify this run
    #[arg(long, value_name = "N")]
    company_limit: Option<usize>,

    /// Export profiles to CSV after the run
    #[arg(long)]
    export: bool,

    /// Filename for the CSV export (default is timestamped)
    #[arg(long, value_name = "FILE", requires = "export")]
    export_file: Option<String>,

    /// Show statistics from the database and exit
    #[arg(long, conflicts_with_all = ["scrape_only", "analyze_only", "export"])]
    stats: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, _config_hash) = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (cfg, hash)
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    // Make sure the database directory exists
    if let Some(parent) = Path::new(&config.storage.database_path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut store = open_store(Path::new(&config.storage.database_path))?;

    if cli.stats {
        let stats = load_statistics(&store)?;
        print_statistics(&stats);
        return Ok(());
    }

    if cli.requeue_failed {
        let requeued = store.requeue_failed()?;
        tracing::info!(requeued, "returned failed URLs to pending");
    }

    let batches = if cli.batches.is_empty() {
        config.directory.batches.clone()
    } else {
        cli.batches.clone()
    };

    if !cli.analyze_only {
        harvest(&config, &mut store, &batches, cli.url_limit).await?;
    }

    if !cli.scrape_only {
        classify(&config, &mut store, cli.company_limit).await?;
    }

    if cli.export {
        let path = export_profiles(
            &store,
            &config.export,
            cli.export_file.as_deref(),
            None,
        )?;
        println!("Exported profiles to: {}", path.display());
    }

    tracing::info!("Harvest workflow completed");
    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("batch_atlas=info,warn"),
            1 => EnvFilter::new("batch_atlas=debug,info"),
            2 => EnvFilter::new("batch_atlas=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Runs discovery for every batch, then scrapes all pending URLs
///
/// All directory enumeration completes before any profile scraping begins;
/// a batch whose enumeration fails is logged and does not stop the others.
async fn harvest(
    config: &Config,
    store: &mut dyn Store,
    batches: &[String],
    url_limit: Option<usize>,
) -> batch_atlas::Result<()> {
    tracing::info!(batches = batches.len(), "starting harvest");

    let surface = ChromeSurface::launch().await?;
    let crawler = DirectoryCrawler::new(config);

    for batch in batches {
        match crawler.discover_batch(&surface, store, batch).await {
            Ok(urls) => {
                tracing::info!(batch = %batch, found = urls.len(), "batch enumeration finished")
            }
            Err(e) => {
                tracing::error!(batch = %batch, error = %e, "directory enumeration failed")
            }
        }
    }

    let result = scrape_pending(&surface, store, config, url_limit).await;

    // Tear the browser down before surfacing any scrape error
    surface.shutdown().await;
    result?;

    Ok(())
}

/// Runs one classification pass over scraped-but-unclassified profiles
async fn classify(
    config: &Config,
    store: &mut dyn Store,
    company_limit: Option<usize>,
) -> Result<(), Box<dyn std::error::Error>> {
    let classifier = match OpenAiClassifier::from_env(&config.analyzer) {
        Ok(classifier) => classifier,
        Err(e) => {
            tracing::error!("Cannot run classification: {}", e);
            return Err(e.into());
        }
    };

    let orchestrator = ClassificationOrchestrator::new(&classifier, &config.analyzer);
    orchestrator.run(store, company_limit).await?;

    Ok(())
}
