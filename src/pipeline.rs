//! Orchestration of the three stages: links → details → combined output.

use crate::config::{CompiledSelectors, ScraperConfig};
use crate::error::ScrapeResult;
use crate::fetch::Fetch;
use crate::models::{CollectStats, ExtractStats};
use crate::outputs::combined;
use crate::scrapers::{detail, listing};
use crate::storage::Storage;
use tracing::{info, instrument};

/// Counters from a full `scrape` run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub links: CollectStats,
    pub details: ExtractStats,
    pub combined: usize,
}

/// Press release scraper bound to one fetcher, configuration and store.
#[derive(Debug)]
pub struct Scraper<F> {
    fetcher: F,
    config: ScraperConfig,
    selectors: CompiledSelectors,
    storage: Storage,
}

impl<F: Fetch> Scraper<F> {
    pub fn new(fetcher: F, config: ScraperConfig, selectors: CompiledSelectors) -> Self {
        let storage = Storage::from_config(&config);
        Self {
            fetcher,
            config,
            selectors,
            storage,
        }
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    pub async fn collect_links(&self, start_page: u32) -> ScrapeResult<CollectStats> {
        listing::collect_links(
            &self.fetcher,
            &self.config,
            &self.selectors,
            &self.storage,
            start_page,
        )
        .await
    }

    pub async fn extract_all(&self) -> ScrapeResult<ExtractStats> {
        detail::extract_all(&self.fetcher, &self.config, &self.selectors, &self.storage).await
    }

    pub async fn combine(&self) -> ScrapeResult<usize> {
        combined::combine(&self.storage, &self.config.combined_path).await
    }

    /// Run every stage in order, stopping at the first error.
    #[instrument(level = "info", skip(self))]
    pub async fn scrape(&self, start_page: u32) -> ScrapeResult<RunSummary> {
        let links = self.collect_links(start_page).await?;
        let details = self.extract_all().await?;
        let combined = self.combine().await?;
        info!(
            pages = links.pages_visited,
            total_pages = links.total_pages,
            links_added = links.added,
            links_skipped = links.skipped,
            registry = links.registry_len,
            records_written = details.written,
            skipped_speech = details.skipped_speech,
            skipped_existing = details.skipped_existing,
            combined,
            "Scrape complete"
        );
        Ok(RunSummary {
            links,
            details,
            combined,
        })
    }
}
