//! Markup parsers for the news portal.
//!
//! Scraping follows a two-phase pattern:
//!
//! 1. **Indexing**: parse each listing page into [`ListingEntry`] triples
//!    (title, article URL, publish date)
//! 2. **Fetching**: parse each article page into its truncated body text
//!
//! Parsers here are pure: they take markup and return values. Network access
//! lives in [`crate::fetcher`] and scheduling in [`crate::harvest`].
//!
//! Missing optional markup never fails a parse. It degrades to the
//! [`NOT_AVAILABLE`] sentinel, to [`ifpi::CONTENT_NOT_FOUND`], or to an empty
//! listing (the normal "no more pages" signal).
//!
//! [`ListingEntry`]: crate::models::ListingEntry
//! [`NOT_AVAILABLE`]: crate::models::NOT_AVAILABLE

pub mod ifpi;
