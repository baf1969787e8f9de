//! Link collection from the paginated Briefing Room listing.
//!
//! The listing lives at `{base}/news?page={n}` with roughly 25 releases per
//! page, newest first. The first page fetched also tells us how many pages
//! exist, via the `page` query parameter of the "Go to last page" anchor.
//!
//! Collection resumes from the existing registry: known URLs are loaded
//! first and kept in their original order, new URLs are appended. Once two
//! pages in a row contain already-known URLs, the crawl has caught up with
//! the previous run and stops early.

use crate::config::{CompiledSelectors, ScraperConfig};
use crate::error::{ScrapeError, ScrapeResult};
use crate::fetch::Fetch;
use crate::models::CollectStats;
use crate::storage::Storage;
use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::Html;
use std::collections::HashSet;
use tokio::time::sleep;
use tracing::{debug, info, instrument};

/// Consecutive pages with at least one known URL that end the crawl.
pub const CAUGHT_UP_PAGES: u32 = 2;

static PAGE_PARAM: Lazy<Regex> = Lazy::new(|| Regex::new(r"[?&]page=(\d+)").unwrap());

/// Read the total page index from the last-page anchor.
pub fn parse_last_page(html: &str, selectors: &CompiledSelectors, url: &str) -> ScrapeResult<u32> {
    let document = Html::parse_document(html);
    let missing = || ScrapeError::Extraction {
        url: url.to_string(),
        field: "last_page",
    };

    let href = document
        .select(&selectors.last_page)
        .next()
        .and_then(|a| a.value().attr("href"))
        .ok_or_else(missing)?;

    PAGE_PARAM
        .captures(href)
        .and_then(|caps| caps[1].parse::<u32>().ok())
        .ok_or_else(missing)
}

/// Relative URLs of every release entry on a listing page, in page order.
///
/// Entries without an anchor (or an anchor without `href`) are ignored.
pub fn parse_release_links(html: &str, selectors: &CompiledSelectors) -> Vec<String> {
    let document = Html::parse_document(html);
    document
        .select(&selectors.release_entry)
        .filter_map(|entry| {
            entry
                .select(&selectors.anchor)
                .next()
                .and_then(|a| a.value().attr("href"))
                .map(str::to_string)
        })
        .collect()
}

/// Walk the listing from `start_page` and persist the de-duplicated registry.
///
/// URLs are compared by exact string match. The registry file is only
/// written after the loop finishes; any fetch or parse failure aborts the
/// run with the previous registry still available at its backup path.
#[instrument(level = "info", skip(fetcher, config, selectors, storage))]
pub async fn collect_links<F: Fetch>(
    fetcher: &F,
    config: &ScraperConfig,
    selectors: &CompiledSelectors,
    storage: &Storage,
    start_page: u32,
) -> ScrapeResult<CollectStats> {
    let mut urls: Vec<String> = storage
        .load_registry_for_collection()
        .await?
        .into_iter()
        .unique()
        .collect();
    let mut seen: HashSet<String> = urls.iter().cloned().collect();

    let first_url = config.listing_url(start_page)?;
    let mut html = fetcher.fetch(&first_url).await?;
    let total_pages = parse_last_page(&html, selectors, &first_url)?;
    info!(total_pages, "Found listing pages");

    let mut stats = CollectStats {
        total_pages,
        ..CollectStats::default()
    };
    let mut current_page = start_page;
    let mut consecutive_known = 0u32;

    loop {
        let (mut added, mut skipped) = (0usize, 0usize);
        for link in parse_release_links(&html, selectors) {
            if seen.insert(link.clone()) {
                urls.push(link);
                added += 1;
            } else {
                debug!(url = %link, "Already known");
                skipped += 1;
            }
        }
        stats.pages_visited += 1;
        stats.added += added;
        stats.skipped += skipped;
        info!(
            page = current_page,
            total_pages, added, skipped, "Processed listing page"
        );

        if skipped > 0 {
            consecutive_known += 1;
        } else {
            consecutive_known = 0;
        }

        let Some(next_page) = current_page.checked_add(1).filter(|n| *n <= total_pages) else {
            info!("Reached last listing page");
            break;
        };
        current_page = next_page;
        if consecutive_known >= CAUGHT_UP_PAGES {
            info!(
                pages = consecutive_known,
                "Consecutive pages with known releases; caught up with previous run"
            );
            break;
        }

        sleep(config.delay).await;
        let url = config.listing_url(current_page)?;
        html = fetcher.fetch(&url).await?;
    }

    info!(count = urls.len(), "Writing release URLs to registry");
    storage.write_registry(&urls).await?;
    stats.registry_len = urls.len();
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteSelectors;
    use crate::fetch::testing::StaticSite;
    use std::time::Duration;

    fn config(tmp: &tempfile::TempDir) -> ScraperConfig {
        ScraperConfig::new(
            "https://www.justice.gov",
            tmp.path().join("data"),
            tmp.path().join("links.txt"),
            tmp.path().join("combined.json"),
            0.0,
        )
        .unwrap()
    }

    fn selectors() -> CompiledSelectors {
        SiteSelectors::default().compile().unwrap()
    }

    fn listing(last: u32, links: &[&str]) -> String {
        let entries: String = links
            .iter()
            .map(|l| {
                format!(
                    r#"<div class="views-row"><div class="views-field views-field-title"><span class="field-content"><a href="{l}">Release {l}</a></span></div></div>"#
                )
            })
            .collect();
        format!(
            r#"<html><body><div class="view-content">{entries}</div>
            <ul class="pager"><li class="pager-next"><a title="Go to next page" href="/news?page=1">next</a></li>
            <li class="pager-last"><a title="Go to last page" href="/news?page={last}">last »</a></li></ul></body></html>"#
        )
    }

    fn site(cfg: &ScraperConfig, last: u32, pages: Vec<(u32, Vec<&str>)>) -> StaticSite {
        pages.into_iter().fold(StaticSite::new(), |site, (n, links)| {
            site.page(cfg.listing_url(n).unwrap(), listing(last, &links))
        })
    }

    #[test]
    fn test_parse_last_page() {
        let html = listing(612, &["/opa/pr/a"]);
        assert_eq!(parse_last_page(&html, &selectors(), "u").unwrap(), 612);
    }

    #[test]
    fn test_parse_last_page_with_other_params() {
        let html = r#"<a title="Go to last page" href="/news?f%5B0%5D=type%3Apr&amp;page=77">last</a>"#;
        assert_eq!(parse_last_page(html, &selectors(), "u").unwrap(), 77);
    }

    #[test]
    fn test_parse_last_page_missing_anchor() {
        let err = parse_last_page("<html><body></body></html>", &selectors(), "https://x/news?page=0")
            .unwrap_err();
        assert!(matches!(err, ScrapeError::Extraction { field: "last_page", .. }));
    }

    #[test]
    fn test_parse_release_links_in_order() {
        let html = listing(1, &["/opa/pr/b", "/opa/speech/a", "/usao-sdny/pr/c"]);
        assert_eq!(
            parse_release_links(&html, &selectors()),
            vec!["/opa/pr/b", "/opa/speech/a", "/usao-sdny/pr/c"]
        );
    }

    #[test]
    fn test_parse_release_links_skips_entries_without_href() {
        let html = r#"<div class="views-field views-field-title"><span>no link</span></div>
            <div class="views-field views-field-title"><a name="x">anchor only</a></div>
            <div class="views-field views-field-title"><a href="/opa/pr/ok">ok</a></div>
            <div class="views-field views-field-title extra"><a href="/opa/pr/other-class">no</a></div>"#;
        assert_eq!(parse_release_links(html, &selectors()), vec!["/opa/pr/ok"]);
    }

    #[tokio::test]
    async fn test_collect_walks_all_pages() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = config(&tmp);
        let storage = Storage::from_config(&cfg);
        let site = site(
            &cfg,
            2,
            vec![(0, vec!["/a", "/b"]), (1, vec!["/c", "/d"]), (2, vec!["/e"])],
        );

        let stats = collect_links(&site, &cfg, &selectors(), &storage, 0)
            .await
            .unwrap();
        assert_eq!(stats.pages_visited, 3);
        assert_eq!(stats.added, 5);
        assert_eq!(stats.total_pages, 2);
        assert_eq!(
            storage.read_registry().await.unwrap(),
            vec!["/a", "/b", "/c", "/d", "/e"]
        );
        assert_eq!(site.requests().len(), 3);
    }

    #[tokio::test]
    async fn test_collect_never_writes_duplicates() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = config(&tmp);
        let storage = Storage::from_config(&cfg);
        let site = site(
            &cfg,
            3,
            vec![
                (0, vec!["/a", "/b", "/a"]),
                (1, vec!["/c"]),
                (2, vec!["/b", "/d"]),
                (3, vec!["/e"]),
            ],
        );

        let stats = collect_links(&site, &cfg, &selectors(), &storage, 0)
            .await
            .unwrap();
        assert_eq!(stats.skipped, 2);
        let registry = storage.read_registry().await.unwrap();
        assert_eq!(registry, vec!["/a", "/b", "/c", "/d", "/e"]);
    }

    #[tokio::test]
    async fn test_collect_twice_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = config(&tmp);
        let storage = Storage::from_config(&cfg);
        let site = site(
            &cfg,
            2,
            vec![(0, vec!["/a", "/b"]), (1, vec!["/c", "/d"]), (2, vec!["/e", "/f"])],
        );

        collect_links(&site, &cfg, &selectors(), &storage, 0).await.unwrap();
        let first = storage.read_registry().await.unwrap();

        let stats = collect_links(&site, &cfg, &selectors(), &storage, 0).await.unwrap();
        assert_eq!(stats.added, 0);
        assert_eq!(storage.read_registry().await.unwrap(), first);
        assert_eq!(
            std::fs::read_to_string(storage.backup_path()).unwrap(),
            first.join("\n")
        );
    }

    #[tokio::test]
    async fn test_collect_stops_after_two_caught_up_pages() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = config(&tmp);
        let storage = Storage::from_config(&cfg);
        std::fs::write(storage.registry_path(), "/old1\n/old2\n/old3\n/old4").unwrap();
        let site = site(
            &cfg,
            10,
            vec![
                (1, vec!["/new1", "/new2"]),
                (2, vec!["/new3"]),
                (3, vec!["/old1", "/old2"]),
                (4, vec!["/old3", "/old4"]),
                (5, vec!["/never"]),
            ],
        );

        let stats = collect_links(&site, &cfg, &selectors(), &storage, 1)
            .await
            .unwrap();
        assert_eq!(stats.pages_visited, 4);
        assert_eq!(site.request_count(&cfg.listing_url(5).unwrap()), 0);
        assert_eq!(site.requests().len(), 4);
        assert_eq!(
            storage.read_registry().await.unwrap(),
            vec!["/old1", "/old2", "/old3", "/old4", "/new1", "/new2", "/new3"]
        );
    }

    #[tokio::test]
    async fn test_caught_up_counter_resets_on_clean_page() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = config(&tmp);
        let storage = Storage::from_config(&cfg);
        std::fs::write(storage.registry_path(), "/old").unwrap();
        let site = site(
            &cfg,
            3,
            vec![
                (0, vec!["/old", "/a"]),
                (1, vec!["/b"]),
                (2, vec!["/old", "/c"]),
                (3, vec!["/d"]),
            ],
        );

        let stats = collect_links(&site, &cfg, &selectors(), &storage, 0)
            .await
            .unwrap();
        assert_eq!(stats.pages_visited, 4);
        assert_eq!(stats.registry_len, 5);
    }

    #[tokio::test]
    async fn test_fetch_failure_leaves_backup_and_no_registry() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = config(&tmp);
        let storage = Storage::from_config(&cfg);
        std::fs::write(storage.registry_path(), "/known").unwrap();
        // page 1 is not served
        let site = site(&cfg, 3, vec![(0, vec!["/a"])]);

        let err = collect_links(&site, &cfg, &selectors(), &storage, 0)
            .await
            .unwrap_err();
        assert!(
            matches!(&err, ScrapeError::Transport { url, .. } if *url == cfg.listing_url(1).unwrap()),
            "expected transport error for page 1, got {err}"
        );
        assert!(!storage.registry_path().exists());
        assert_eq!(std::fs::read_to_string(storage.backup_path()).unwrap(), "/known");

        // A retry picks the known URLs back up from the backup.
        let site = site_with_all(&cfg);
        collect_links(&site, &cfg, &selectors(), &storage, 0).await.unwrap();
        assert_eq!(storage.read_registry().await.unwrap(), vec!["/known", "/a", "/b"]);
    }

    fn site_with_all(cfg: &ScraperConfig) -> StaticSite {
        site(cfg, 1, vec![(0, vec!["/a"]), (1, vec!["/b"])])
    }

    #[tokio::test]
    async fn test_start_page_at_u32_max_fetches_once() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = config(&tmp);
        let storage = Storage::from_config(&cfg);
        let site = site(&cfg, 5, vec![(u32::MAX, vec!["/a"]), (0, vec!["/b"])]);

        let stats = collect_links(&site, &cfg, &selectors(), &storage, u32::MAX)
            .await
            .unwrap();
        assert_eq!(stats.pages_visited, 1);
        assert_eq!(site.requests(), vec![cfg.listing_url(u32::MAX).unwrap()]);
        assert_eq!(storage.read_registry().await.unwrap(), vec!["/a"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_between_listing_pages() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = ScraperConfig {
            delay: Duration::from_millis(1500),
            ..config(&tmp)
        };
        let storage = Storage::from_config(&cfg);
        let site = site(&cfg, 2, vec![(0, vec!["/a"]), (1, vec!["/b"]), (2, vec!["/c"])]);

        let t0 = tokio::time::Instant::now();
        collect_links(&site, &cfg, &selectors(), &storage, 0).await.unwrap();
        let elapsed = t0.elapsed();

        // two pauses: before page 1 and before page 2
        assert!(elapsed >= Duration::from_secs(3), "elapsed {elapsed:?}");
        assert!(elapsed < Duration::from_millis(4500), "elapsed {elapsed:?}");
    }
}
