//! # DOJ News Scraper
//!
//! Harvests press releases from the Department of Justice Briefing Room
//! (<https://www.justice.gov/news>) into one JSON record per release plus a
//! combined newline-delimited dataset.
//!
//! ## Usage
//!
//! ```sh
//! doj_news_scraper --data-dir ./data scrape --start-page 0
//! ```
//!
//! ## Architecture
//!
//! The run is three sequential stages, each safe to restart:
//! 1. **Links**: walk the paginated listing and update `links.txt`
//! 2. **Details**: fetch every registered release without a record yet
//! 3. **Combine**: concatenate all records into `combined.json`

use clap::Parser;
use std::error::Error;
use std::path::Path;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod config;
mod error;
mod fetch;
mod models;
mod outputs;
mod pipeline;
mod scrapers;
mod storage;
mod utils;

use cli::{Cli, Command};
use config::{ScraperConfig, SiteSelectors};
use fetch::HttpFetcher;
use pipeline::Scraper;
use utils::ensure_writable_dir;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("doj_news_scraper starting up");

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    let config = ScraperConfig::new(
        &args.base_url,
        &args.data_dir,
        &args.links_file,
        &args.combined_file,
        args.delay,
    )?;

    if let Err(e) = ensure_writable_dir(Path::new(&args.data_dir)).await {
        error!(
            path = %args.data_dir,
            error = %e,
            "Data directory is not writable (fix perms or choose a different path)"
        );
        return Err(e);
    }

    let selectors = SiteSelectors::load(args.selectors.as_deref()).await?.compile()?;
    let scraper = Scraper::new(HttpFetcher::new()?, config, selectors);

    let command = args.command();
    info!(
        ?command,
        delay_secs = args.delay,
        base_url = %args.base_url,
        data_dir = %scraper.storage().data_dir().display(),
        registry = %scraper.storage().registry_path().display(),
        "Running"
    );
    let outcome = match command {
        Command::Scrape { start_page } => scraper.scrape(start_page).await.map(|_| ()),
        Command::Links { start_page } => scraper.collect_links(start_page).await.map(|_| ()),
        Command::Details => scraper.extract_all().await.map(|_| ()),
        Command::Combine => scraper.combine().await.map(|_| ()),
    };

    let elapsed = start_time.elapsed();
    match outcome {
        Ok(()) => {
            info!(
                ?elapsed,
                secs = elapsed.as_secs(),
                millis = elapsed.subsec_millis(),
                "Execution complete"
            );
            Ok(())
        }
        Err(e) => {
            error!(?elapsed, error = %e, "Run aborted; safe to re-run to resume");
            Err(e.into())
        }
    }
}
