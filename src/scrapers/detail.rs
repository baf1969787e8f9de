//! Detail page extraction.
//!
//! Walks the registry in order and turns each press release page into a
//! [`ReleaseRecord`] on disk. Title, body and publish date must be present;
//! topics, components and the release number are optional and default to
//! empty / `null`.
//!
//! Re-running is cheap: speech transcripts are skipped outright and any URL
//! that already has a record file is not fetched again.

use crate::config::{CompiledSelectors, ScraperConfig};
use crate::error::{ScrapeError, ScrapeResult};
use crate::fetch::Fetch;
use crate::models::{ExtractStats, ReleaseRecord};
use crate::storage::Storage;
use crate::utils::truncate_for_log;
use itertools::Itertools;
use scraper::{ElementRef, Html};
use tokio::time::sleep;
use tracing::{debug, error, info, instrument};

fn text_of(element: ElementRef<'_>) -> String {
    element.text().collect()
}

/// Extract a [`ReleaseRecord`] from a detail page.
///
/// `url` is only used to label errors.
pub fn parse_release(
    html: &str,
    url: &str,
    selectors: &CompiledSelectors,
) -> ScrapeResult<ReleaseRecord> {
    let document = Html::parse_document(html);
    let missing = |field: &'static str| ScrapeError::Extraction {
        url: url.to_string(),
        field,
    };

    let title = document
        .select(&selectors.title)
        .next()
        .map(text_of)
        .ok_or_else(|| missing("title"))?;

    let contents = document
        .select(&selectors.body)
        .next()
        .ok_or_else(|| missing("contents"))?
        .select(&selectors.paragraph)
        .map(text_of)
        .join(" ");

    let date = document
        .select(&selectors.date)
        .next()
        .and_then(|el| el.value().attr(&selectors.date_attr))
        .map(str::to_string)
        .ok_or_else(|| missing("date"))?;

    let topics: Vec<String> = document
        .select(&selectors.topic_list)
        .next()
        .map(|list| list.select(&selectors.topic_item).map(text_of).collect())
        .unwrap_or_default();

    let components: Vec<String> = document
        .select(&selectors.component_list)
        .next()
        .map(|list| list.select(&selectors.anchor).map(text_of).collect())
        .unwrap_or_default();

    let id = document
        .select(&selectors.id_container)
        .next()
        .and_then(|container| container.select(&selectors.id_item).next())
        .map(text_of);

    Ok(ReleaseRecord {
        id,
        title,
        contents,
        date,
        topics,
        components,
    })
}

/// Fetch and persist a record for every registry URL that lacks one.
///
/// Aborts at the first page missing a required field; records written
/// before that point stay on disk.
#[instrument(level = "info", skip_all)]
pub async fn extract_all<F: Fetch>(
    fetcher: &F,
    config: &ScraperConfig,
    selectors: &CompiledSelectors,
    storage: &Storage,
) -> ScrapeResult<ExtractStats> {
    let urls = storage.read_registry().await?;
    let total = urls.len();
    info!(total, "Loaded registry");

    let mut stats = ExtractStats::default();
    for (i, url) in urls.iter().enumerate() {
        if url.contains(config.skip_marker.as_str()) {
            info!(%url, "Skipping speech");
            stats.skipped_speech += 1;
            continue;
        }

        if storage.has_record(url).await? {
            debug!(path = %storage.record_path(url).display(), "Record already exists");
            stats.skipped_existing += 1;
            continue;
        }

        info!(index = i + 1, total, %url, "Scraping release");
        let page_url = config.detail_url(url)?;
        let html = fetcher.fetch(&page_url).await?;
        let record = parse_release(&html, &page_url, selectors).inspect_err(|e| {
            error!(%url, error = %e, "Required field missing; stopping extraction");
        })?;
        debug!(title = %truncate_for_log(&record.title, 80), "Extracted release");

        storage.write_record(url, &record).await?;
        stats.written += 1;
        sleep(config.delay).await;
    }

    info!(
        written = stats.written,
        skipped_speech = stats.skipped_speech,
        skipped_existing = stats.skipped_existing,
        "Extraction finished"
    );
    Ok(stats)
}
