//! IFPI news portal scraper.
//!
//! The portal is a Plone site. Its "últimas notícias" listing paginates with
//! a `b_start:int` offset parameter and renders each headline as:
//!
//! ```text
//! div
//! ├── div.tileContent
//! │   └── h2.tileHeadline > a.summary.url[href]   (title + link)
//! └── span.documentByLine
//!     └── span > i.icon-day + "05/03/2025"        (publish date)
//! ```
//!
//! Article bodies live in `div[property="rnews:articleBody"]`.

use crate::models::{ListingEntry, NOT_AVAILABLE};
use crate::utils::truncate_chars;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, instrument};
use url::Url;

/// Body text used when the article container is missing.
pub const CONTENT_NOT_FOUND: &str = "content not found";

static HEADLINE: Lazy<Selector> =
    Lazy::new(|| Selector::parse("h2.tileHeadline").expect("static selector"));
static HEADLINE_LINK: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a.summary.url").expect("static selector"));
static BYLINE: Lazy<Selector> =
    Lazy::new(|| Selector::parse("span.documentByLine").expect("static selector"));
static DATE_ICON: Lazy<Selector> =
    Lazy::new(|| Selector::parse("i.icon-day").expect("static selector"));
static ARTICLE_BODY: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#"div[property="rnews:articleBody"]"#).expect("static selector")
});
static PARAGRAPH: Lazy<Selector> = Lazy::new(|| Selector::parse("p").expect("static selector"));
static DATE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d{2}/\d{2}/\d{4}").expect("static regex"));

/// URL of the listing page starting at item `offset`.
pub fn listing_page_url(base: &Url, offset: usize) -> String {
    let sep = if base.query().is_some() { '&' } else { '?' };
    format!("{base}{sep}b_start:int={offset}")
}

/// Parse one listing page into its headlines, in document order.
///
/// Relative hrefs are resolved against `base`.
///
/// # Arguments
///
/// * `html` - Raw listing page markup
/// * `base` - URL the page was fetched from
///
/// # Returns
///
/// One [`ListingEntry`] per headline. Missing title, link or date become
/// `"N/A"`. An empty vector means the page had no headline markup.
#[instrument(level = "debug", skip(html), fields(bytes = html.len()))]
pub fn parse_listing(html: &str, base: &Url) -> Vec<ListingEntry> {
    let document = Html::parse_document(html);
    let entries: Vec<ListingEntry> = document
        .select(&HEADLINE)
        .map(|headline| parse_headline(headline, base))
        .collect();
    debug!(count = entries.len(), "Parsed listing page");
    entries
}

fn parse_headline(headline: ElementRef<'_>, base: &Url) -> ListingEntry {
    let link = headline.select(&HEADLINE_LINK).next();

    let title = link
        .map(|a| stripped_text(a, " "))
        .unwrap_or_else(|| NOT_AVAILABLE.to_string());

    let article_url = link
        .and_then(|a| a.value().attr("href"))
        .map(|href| {
            base.join(href)
                .map(|u| u.to_string())
                .unwrap_or_else(|_| href.to_string())
        })
        .unwrap_or_else(|| NOT_AVAILABLE.to_string());

    let publish_date = find_date(headline).unwrap_or_else(|| NOT_AVAILABLE.to_string());

    ListingEntry {
        title,
        article_url,
        publish_date,
    }
}

/// Walk from the headline up to its tile container, then down into the
/// byline's date marker.
fn find_date(headline: ElementRef<'_>) -> Option<String> {
    let tile = headline
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == "div" && el.value().classes().any(|c| c == "tileContent"))?;
    let container = tile.parent().and_then(ElementRef::wrap)?;
    let byline = container.select(&BYLINE).next()?;
    let icon = byline.select(&DATE_ICON).next()?;
    let holder = icon.parent().and_then(ElementRef::wrap)?;

    let text = stripped_text(holder, "");
    DATE_PATTERN.find(&text).map(|m| m.as_str().to_string())
}

/// Extract the article's main text: every paragraph inside the body
/// container, trimmed, joined by single spaces.
///
/// # Arguments
///
/// * `html` - Raw article page markup
/// * `max_chars` - Maximum characters kept (counted as chars, not bytes)
///
/// # Returns
///
/// The body text, or [`CONTENT_NOT_FOUND`] when the container is absent.
#[instrument(level = "debug", skip(html), fields(bytes = html.len()))]
pub fn extract_body(html: &str, max_chars: usize) -> String {
    let document = Html::parse_document(html);
    let Some(container) = document.select(&ARTICLE_BODY).next() else {
        debug!("Article body container not found");
        return CONTENT_NOT_FOUND.to_string();
    };

    let text = container
        .select(&PARAGRAPH)
        .map(|p| p.text().collect::<String>().trim().to_string())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    truncate_chars(&text, max_chars)
}

/// Text nodes of `el`, each trimmed, empty ones dropped, joined by `sep`.
fn stripped_text(el: ElementRef<'_>, sep: &str) -> String {
    el.text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(sep)
}
