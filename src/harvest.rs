//! Harvest orchestration: listing pages first, then article bodies.
//!
//! # Pipeline
//!
//! 1. **Plan**: a static list of listing-page URLs (`max_pages` pages of
//!    `page_size` items each, addressed by offset)
//! 2. **Index**: fetch every listing page concurrently and parse headlines
//! 3. **Fetch**: fetch every article body concurrently and merge it with its
//!    listing entry
//!
//! Concurrency is bounded by the [`Fetch`] implementation handed in
//! (normally a [`RateLimited`](crate::fetcher::RateLimited) wrapper), so both
//! phases draw from the same permit pool.
//!
//! # Ordering
//!
//! Results are written into an index-addressed slot buffer, one slot per
//! planned request, so output order is page order then document order no
//! matter which response lands first.
//!
//! # Failure isolation
//!
//! A failed listing page contributes zero entries. A failed article still
//! yields a record, with the cause embedded in its body text.

use crate::errors::FetchError;
use crate::fetcher::Fetch;
use crate::models::{ArticleRecord, ListingEntry};
use crate::scrapers::ifpi::{extract_body, listing_page_url, parse_listing};
use crate::utils::truncate_for_log;
use futures::stream::{FuturesUnordered, StreamExt};
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Default listing base URL.
pub const DEFAULT_BASE_URL: &str = "https://www.ifpi.edu.br/ultimas-noticias";
/// Maximum characters of body text kept per article.
pub const BODY_MAX_CHARS: usize = 2000;

/// Knobs for one harvest run.
#[derive(Debug, Clone)]
pub struct HarvestConfig {
    pub base_url: Url,
    pub page_size: usize,
    pub max_pages: usize,
    pub listing_timeout: Duration,
    pub article_timeout: Duration,
    pub body_max_chars: usize,
}

impl HarvestConfig {
    /// The upfront request plan: one URL per listing page, in page order.
    ///
    /// Planning stops at the first page whose offset would overflow `usize`.
    pub fn listing_urls(&self) -> Vec<String> {
        (0..self.max_pages)
            .map_while(|page| page.checked_mul(self.page_size))
            .map(|offset| listing_page_url(&self.base_url, offset))
            .collect()
    }
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_BASE_URL).expect("static URL"),
            page_size: 30,
            max_pages: 10,
            listing_timeout: Duration::from_secs(15),
            article_timeout: Duration::from_secs(60),
            body_max_chars: BODY_MAX_CHARS,
        }
    }
}

/// Outcome of a harvest run.
#[derive(Debug, Clone, Default)]
pub struct HarvestReport {
    /// One record per listing entry found, in page then document order.
    pub records: Vec<ArticleRecord>,
    pub pages_planned: usize,
    pub pages_failed: usize,
    pub articles_failed: usize,
}

/// Run a full harvest. Returns once every dispatched fetch has settled.
///
/// Listing pages are fetched first, then every article they name. A failed
/// page contributes no entries; a failed article still yields a record.
///
/// # Arguments
///
/// * `fetcher` - Fetch implementation; wrap it in [`RateLimited`](crate::fetcher::RateLimited)
///   to cap in-flight requests across both phases
/// * `config` - Page plan, timeouts and body length cap
///
/// # Returns
///
/// A [`HarvestReport`] whose records are in page order, then document order.
#[instrument(level = "info", skip_all, fields(base_url = %config.base_url, max_pages = config.max_pages))]
pub async fn harvest<F: Fetch>(fetcher: &F, config: &HarvestConfig) -> HarvestReport {
    let t0 = Instant::now();
    let page_urls = config.listing_urls();
    info!(pages = page_urls.len(), "Starting listing page harvest");

    let pages = gather_in_order(
        page_urls
            .iter()
            .enumerate()
            .map(|(index, url)| fetch_listing_page(fetcher, config, index, url)),
    )
    .await;

    let pages_failed = pages.iter().filter(|p| p.is_err()).count();
    let entries: Vec<ListingEntry> = pages.into_iter().flat_map(|p| p.unwrap_or_default()).collect();
    info!(
        entries = entries.len(),
        pages_failed,
        "Listing harvest complete; fetching article bodies"
    );

    let records = gather_in_order(
        entries
            .into_iter()
            .enumerate()
            .map(|(index, entry)| fetch_article(fetcher, config, index, entry)),
    )
    .await;

    let articles_failed = records.iter().filter(|r| r.fetch_error.is_some()).count();
    info!(
        total = records.len(),
        failed = articles_failed,
        elapsed_ms = t0.elapsed().as_millis() as u64,
        "Article harvest complete"
    );

    HarvestReport {
        records,
        pages_planned: page_urls.len(),
        pages_failed,
        articles_failed,
    }
}

async fn fetch_listing_page<F: Fetch>(
    fetcher: &F,
    config: &HarvestConfig,
    index: usize,
    url: &str,
) -> Result<Vec<ListingEntry>, FetchError> {
    match fetcher.fetch(url, config.listing_timeout).await {
        Ok(page) => {
            let entries = parse_listing(&page.body, &config.base_url);
            if entries.is_empty() {
                info!(index, %url, "Listing page has no headlines");
            } else {
                debug!(index, %url, count = entries.len(), "Parsed listing page");
            }
            Ok(entries)
        }
        Err(e) => {
            warn!(index, %url, kind = e.kind(), error = %e, "Listing page fetch failed");
            Err(e)
        }
    }
}

async fn fetch_article<F: Fetch>(
    fetcher: &F,
    config: &HarvestConfig,
    index: usize,
    entry: ListingEntry,
) -> ArticleRecord {
    if !entry.has_link() {
        warn!(index, title = %truncate_for_log(&entry.title, 80), "Listing entry has no link");
        return ArticleRecord::failed(entry, &FetchError::MissingLink.to_string(), config.body_max_chars);
    }

    match fetcher.fetch(&entry.article_url, config.article_timeout).await {
        Ok(page) => {
            let body = extract_body(&page.body, config.body_max_chars);
            debug!(
                index,
                url = %entry.article_url,
                status = page.status,
                chars = body.chars().count(),
                "Fetched article"
            );
            ArticleRecord::fetched(entry, body)
        }
        Err(e) => {
            warn!(index, url = %entry.article_url, kind = e.kind(), error = %e, "Article fetch failed");
            ArticleRecord::failed(entry, &e.to_string(), config.body_max_chars)
        }
    }
}

/// Drive all futures concurrently and return their outputs in input order.
///
/// Each future owns exactly one slot of the result buffer, keyed by its
/// position in the input.
async fn gather_in_order<T, Fut>(futures: impl IntoIterator<Item = Fut>) -> Vec<T>
where
    Fut: Future<Output = T>,
{
    let mut pending: FuturesUnordered<_> = futures
        .into_iter()
        .enumerate()
        .map(|(slot, fut)| async move { (slot, fut.await) })
        .collect();

    let mut slots: Vec<Option<T>> = std::iter::repeat_with(|| None).take(pending.len()).collect();
    while let Some((slot, value)) = pending.next().await {
        slots[slot] = Some(value);
    }
    slots.into_iter().flatten().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::RateLimited;
    use crate::fetcher::testing::StaticFetcher;
    use crate::models::{FETCH_ERROR_PREFIX, NOT_AVAILABLE};
    use crate::scrapers::ifpi::CONTENT_NOT_FOUND;

    const BASE: &str = "https://portal.test/noticias";

    fn config(max_pages: usize) -> HarvestConfig {
        HarvestConfig {
            base_url: Url::parse(BASE).unwrap(),
            page_size: 2,
            max_pages,
            ..HarvestConfig::default()
        }
    }

    fn page_url(offset: usize) -> String {
        format!("{BASE}?b_start:int={offset}")
    }

    fn listing(items: &[(&str, &str)]) -> String {
        items
            .iter()
            .map(|(title, href)| {
                format!(
                    r#"<div><div class="tileContent"><h2 class="tileHeadline"><a class="summary url" href="{href}">{title}</a></h2></div>
                       <span class="documentByLine"><span><i class="icon-day"></i>01/02/2025</span></span></div>"#
                )
            })
            .collect()
    }

    fn article(text: &str) -> String {
        format!(r#"<div property="rnews:articleBody"><p>{text}</p></div>"#)
    }

    #[test]
    fn test_listing_plan_is_static() {
        let cfg = HarvestConfig::default();
        let urls = cfg.listing_urls();
        assert_eq!(urls.len(), 10);
        assert_eq!(urls[0], format!("{DEFAULT_BASE_URL}?b_start:int=0"));
        assert_eq!(urls[9], format!("{DEFAULT_BASE_URL}?b_start:int=270"));
    }

    #[test]
    fn test_listing_plan_stops_before_offset_overflow() {
        let cfg = HarvestConfig {
            page_size: usize::MAX,
            max_pages: 3,
            ..config(3)
        };
        let urls = cfg.listing_urls();
        assert_eq!(urls.len(), 2);
        assert_eq!(urls[1], page_url(usize::MAX));
    }

    #[tokio::test]
    async fn test_order_follows_pages_not_completion() {
        // Page 1 and its articles answer long before page 0.
        let fake = StaticFetcher::new()
            .ok(&page_url(0), 80, &listing(&[("E1", "https://portal.test/e1"), ("E2", "https://portal.test/e2")]))
            .ok(&page_url(2), 1, &listing(&[("E3", "https://portal.test/e3"), ("E4", "https://portal.test/e4")]))
            .ok("https://portal.test/e1", 60, &article("um"))
            .ok("https://portal.test/e2", 40, &article("dois"))
            .ok("https://portal.test/e3", 1, &article("três"))
            .ok("https://portal.test/e4", 1, &article("quatro"));
        let limited = RateLimited::new(fake, 5);

        let report = harvest(&limited, &config(2)).await;
        let titles: Vec<&str> = report.records.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["E1", "E2", "E3", "E4"]);
        let bodies: Vec<&str> = report.records.iter().map(|r| r.body_text.as_str()).collect();
        assert_eq!(bodies, vec!["um", "dois", "três", "quatro"]);
        assert_eq!(report.records[0].publish_date, "01/02/2025");
        assert_eq!(report.articles_failed, 0);
    }

    #[tokio::test]
    async fn test_failed_articles_still_produce_records() {
        let fake = StaticFetcher::new()
            .ok(
                &page_url(0),
                0,
                &listing(&[("ok", "https://portal.test/ok"), ("down", "https://portal.test/down")]),
            )
            .ok(&page_url(2), 0, &listing(&[("no body", "https://portal.test/nobody")]))
            .ok("https://portal.test/ok", 0, &article("conteúdo"))
            .fail(
                "https://portal.test/down",
                0,
                FetchError::Status {
                    url: "https://portal.test/down".into(),
                    status: 503,
                },
            )
            .ok("https://portal.test/nobody", 0, "<html><p>sem container</p></html>");
        let limited = RateLimited::new(fake, 3);

        let report = harvest(&limited, &config(2)).await;
        assert_eq!(report.records.len(), 3);
        assert_eq!(report.articles_failed, 1);

        let down = &report.records[1];
        assert!(down.body_text.starts_with(FETCH_ERROR_PREFIX));
        assert!(down.body_text.contains("HTTP 503"));
        assert!(down.fetch_error.is_some());

        assert_eq!(report.records[2].body_text, CONTENT_NOT_FOUND);
        assert!(report.records[2].fetch_error.is_none());
    }

    #[tokio::test]
    async fn test_failed_or_empty_pages_contribute_nothing() {
        // Page 0 fails, page 1 is empty, page 2 has one entry.
        let fake = StaticFetcher::new()
            .fail(
                &page_url(0),
                0,
                FetchError::Timeout {
                    url: page_url(0),
                    after: Duration::from_secs(15),
                },
            )
            .ok(&page_url(2), 0, "<html><body>fim</body></html>")
            .ok(&page_url(4), 0, &listing(&[("só", "https://portal.test/so")]))
            .ok("https://portal.test/so", 0, &article("texto"));
        let limited = RateLimited::new(fake, 5);

        let report = harvest(&limited, &config(3)).await;
        assert_eq!(report.pages_planned, 3);
        assert_eq!(report.pages_failed, 1);
        assert_eq!(report.records.len(), 1);
        assert_eq!(report.records[0].title, "só");
    }

    #[tokio::test]
    async fn test_entry_without_link_is_kept() {
        let html = r#"<div class="tileContent"><h2 class="tileHeadline">Sem âncora</h2></div>"#;
        let fake = StaticFetcher::new().ok(&page_url(0), 0, html);
        let limited = RateLimited::new(fake, 5);

        let report = harvest(&limited, &config(1)).await;
        assert_eq!(report.records.len(), 1);
        assert_eq!(report.records[0].article_url, NOT_AVAILABLE);
        assert!(report.records[0].fetch_error.is_some());
        // Only the listing page was requested.
        assert_eq!(limited.inner().calls(), 1);
    }

    #[tokio::test]
    async fn test_both_phases_share_the_permit_pool() {
        let mut fake = StaticFetcher::new();
        let mut items = Vec::new();
        for i in 0..6 {
            items.push((format!("A{i}"), format!("https://portal.test/a{i}")));
        }
        let refs: Vec<(&str, &str)> = items.iter().map(|(t, h)| (t.as_str(), h.as_str())).collect();
        fake = fake.ok(&page_url(0), 10, &listing(&refs));
        for i in 1..4 {
            fake = fake.ok(&page_url(i * 2), 10, "");
        }
        for (_, href) in &items {
            fake = fake.ok(href, 15, &article("x"));
        }
        let limited = RateLimited::new(fake, 2);

        let report = harvest(&limited, &config(4)).await;
        assert_eq!(report.records.len(), 6);
        assert!(limited.inner().max_in_flight() <= 2);
    }

    #[tokio::test]
    async fn test_gather_in_order_reassembles_by_slot() {
        let delays = [30u64, 1, 20, 5];
        let out = gather_in_order(delays.iter().map(|&ms| async move {
            tokio::time::sleep(Duration::from_millis(ms)).await;
            ms
        }))
        .await;
        assert_eq!(out, vec![30, 1, 20, 5]);
    }
}
