//! Data models for harvested and classified news records.
//!
//! - [`ListingEntry`]: one headline scraped from a listing page
//! - [`ArticleRecord`]: a listing entry merged with its article body; this is
//!   the row shape of the harvest table
//! - [`Classification`]: the derived per-record labels
//! - [`AnalyzedRecord`]: the row shape of the analysis table
//!
//! Serde renames map the Rust field names onto the Portuguese column headers
//! that downstream consumers expect.

use serde::{Deserialize, Serialize};

/// Sentinel for a title, link or date that the listing markup did not carry.
pub const NOT_AVAILABLE: &str = "N/A";

/// Prefix of the body text written for an article whose fetch failed.
pub const FETCH_ERROR_PREFIX: &str = "ERROR: ";

/// A headline scraped from one listing page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingEntry {
    pub title: String,
    /// Absolute article URL, or [`NOT_AVAILABLE`].
    pub article_url: String,
    /// `DD/MM/YYYY`, or [`NOT_AVAILABLE`].
    pub publish_date: String,
}

impl ListingEntry {
    pub fn has_link(&self) -> bool {
        self.article_url != NOT_AVAILABLE
    }
}

/// A harvested article: listing metadata plus (truncated) body text.
///
/// Column order in the harvest table is `titulo, link, data, texto`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleRecord {
    #[serde(rename = "titulo")]
    pub title: String,
    #[serde(rename = "link")]
    pub article_url: String,
    #[serde(rename = "data")]
    pub publish_date: String,
    #[serde(rename = "texto")]
    pub body_text: String,
    /// Summary of the fetch failure, when there was one. Not a column of its
    /// own; recovered from the body's [`FETCH_ERROR_PREFIX`] on read.
    #[serde(skip)]
    pub fetch_error: Option<String>,
}

impl ArticleRecord {
    /// Merge a listing entry with the body extracted from its article page.
    pub fn fetched(entry: ListingEntry, body_text: String) -> Self {
        Self {
            title: entry.title,
            article_url: entry.article_url,
            publish_date: entry.publish_date,
            body_text,
            fetch_error: None,
        }
    }

    /// Build the record for an entry whose article could not be fetched.
    /// The cause is embedded in the body so failure rates stay auditable.
    pub fn failed(entry: ListingEntry, cause: &str, max_chars: usize) -> Self {
        let body = crate::utils::truncate_chars(&format!("{FETCH_ERROR_PREFIX}{cause}"), max_chars);
        Self {
            title: entry.title,
            article_url: entry.article_url,
            publish_date: entry.publish_date,
            fetch_error: body.strip_prefix(FETCH_ERROR_PREFIX).map(str::to_string),
            body_text: body,
        }
    }

    /// Re-derive [`ArticleRecord::fetch_error`] from the body text.
    pub fn with_recovered_error(mut self) -> Self {
        self.fetch_error = self
            .body_text
            .strip_prefix(FETCH_ERROR_PREFIX)
            .map(str::to_string);
        self
    }

    /// Title and body joined by a single space, the text every classifier sees.
    pub fn full_text(&self) -> String {
        format!("{} {}", self.title, self.body_text)
    }
}

/// Labels derived for one record. Stateless, recomputed on every run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub is_notice: bool,
    pub topic: String,
    pub resolved_location: String,
}

/// One row of the analysis table:
/// `titulo, link, data, Is_Edital, Campus_Citado, Topico_Classificado`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzedRecord {
    #[serde(rename = "titulo")]
    pub title: String,
    #[serde(rename = "link")]
    pub article_url: String,
    #[serde(rename = "data")]
    pub publish_date: String,
    #[serde(rename = "Is_Edital", deserialize_with = "crate::outputs::table::flexible_bool")]
    pub is_notice: bool,
    #[serde(rename = "Campus_Citado")]
    pub campus: String,
    #[serde(rename = "Topico_Classificado")]
    pub topic: String,
}

impl AnalyzedRecord {
    pub fn new(record: &ArticleRecord, classification: Classification) -> Self {
        Self {
            title: record.title.clone(),
            article_url: record.article_url.clone(),
            publish_date: record.publish_date.clone(),
            is_notice: classification.is_notice,
            campus: classification.resolved_location,
            topic: classification.topic,
        }
    }
}
