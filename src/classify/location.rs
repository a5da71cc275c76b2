//! Entity-to-location resolution by majority vote.
//!
//! # Algorithm
//!
//! 1. Run NER over the text.
//! 2. Keep `LOC` and `ORG` entities only.
//! 3. Lowercase and trim each kept entity, then scan the alias table in order:
//!    the first alias that is a substring of the entity casts one vote for its
//!    canonical location. Later aliases are not consulted for that entity.
//! 4. The location with the most votes wins. On a tie, the location that
//!    received its first vote earliest wins.
//! 5. No votes at all gives the unmapped sentinel.
//!
//! Alias matching is a plain substring test, so short aliases can hit inside
//! unrelated words ("ead" in "leadership").

use crate::classify::config::LocationAlias;
use crate::classify::ner::{EntityLabel, EntityRecognizer};
use tracing::trace;

#[derive(Debug)]
pub struct LocationResolver<R> {
    recognizer: R,
    aliases: Vec<LocationAlias>,
    unmapped: String,
}

impl<R: EntityRecognizer> LocationResolver<R> {
    /// `aliases` must already be lowercase.
    pub fn new(recognizer: R, aliases: Vec<LocationAlias>, unmapped: String) -> Self {
        Self {
            recognizer,
            aliases,
            unmapped,
        }
    }

    /// Vote for the campus `text` talks about.
    ///
    /// Each LOC or ORG entity votes for the first alias it contains. The most
    /// voted campus wins; ties go to the one voted for first.
    ///
    /// # Arguments
    ///
    /// * `text` - Title and body, concatenated
    ///
    /// # Returns
    ///
    /// The winning campus name, or the unmapped sentinel when nothing voted.
    pub fn resolve(&self, text: &str) -> String {
        let votes = self.tally(text);
        let mut best: Option<(&str, usize)> = None;
        for &(location, count) in &votes {
            if best.is_none_or(|(_, top)| count > top) {
                best = Some((location, count));
            }
        }
        best.map_or_else(|| self.unmapped.clone(), |(location, _)| location.to_string())
    }

    /// Votes per canonical location, in order of first vote.
    fn tally(&self, text: &str) -> Vec<(&str, usize)> {
        let mut votes: Vec<(&str, usize)> = Vec::new();
        for entity in self.recognizer.entities(text) {
            if !matches!(entity.label, EntityLabel::Location | EntityLabel::Organization) {
                continue;
            }
            let normalized = entity.text.trim().to_lowercase();
            let Some(alias) = self
                .aliases
                .iter()
                .find(|a| normalized.contains(a.alias.as_str()))
            else {
                continue;
            };
            trace!(entity = %normalized, alias = %alias.alias, location = %alias.location, "Location vote");
            match votes.iter_mut().find(|(loc, _)| *loc == alias.location) {
                Some((_, count)) => *count += 1,
                None => votes.push((alias.location.as_str(), 1)),
            }
        }
        votes
    }
}
