//! Classification engine: notice flag, topic and cited campus per record.
//!
//! # Submodules
//!
//! - [`config`]: ordered keyword and alias tables (built-in or YAML)
//! - [`notice`]: notice ("edital") keyword detection
//! - [`topics`]: first-match-wins topic rules
//! - [`ner`]: the entity-recognition capability and its gazetteer model
//! - [`location`]: NER + alias voting to pick one canonical campus
//!
//! All three classifiers are pure and independent per record. The NER model
//! is loaded by the caller and handed in, so a missing model fails before
//! any record is touched.

pub mod config;
pub mod location;
pub mod ner;
pub mod notice;
pub mod topics;

use crate::models::{AnalyzedRecord, ArticleRecord, Classification};
use config::ClassifierConfig;
use location::LocationResolver;
use ner::EntityRecognizer;
use notice::NoticeDetector;
use std::time::Instant;
use tracing::{debug, info, instrument};
use topics::TopicClassifier;

/// The three classifiers bundled for per-record use.
#[derive(Debug)]
pub struct Classifier<R> {
    notices: NoticeDetector,
    topics: TopicClassifier,
    locations: LocationResolver<R>,
}

impl<R: EntityRecognizer> Classifier<R> {
    pub fn new(config: ClassifierConfig, recognizer: R) -> Self {
        Self {
            notices: NoticeDetector::new(config.notice_keywords),
            topics: TopicClassifier::new(config.topics, config.catch_all_topic),
            locations: LocationResolver::new(
                recognizer,
                config.locations,
                config.unmapped_location,
            ),
        }
    }

    pub fn classify(&self, record: &ArticleRecord) -> Classification {
        Classification {
            is_notice: self.notices.is_notice(&record.title, &record.body_text),
            topic: self
                .topics
                .classify(&record.title, &record.body_text)
                .to_string(),
            resolved_location: self.locations.resolve(&record.full_text()),
        }
    }

    /// Classify every record, keeping input order.
    #[instrument(level = "info", skip_all, fields(records = records.len()))]
    pub fn analyze(&self, records: &[ArticleRecord]) -> Vec<AnalyzedRecord> {
        let t0 = Instant::now();
        let analyzed: Vec<AnalyzedRecord> = records
            .iter()
            .enumerate()
            .map(|(index, record)| {
                let classification = self.classify(record);
                debug!(
                    index,
                    is_notice = classification.is_notice,
                    topic = %classification.topic,
                    campus = %classification.resolved_location,
                    "Classified record"
                );
                AnalyzedRecord::new(record, classification)
            })
            .collect();

        info!(
            notices = analyzed.iter().filter(|r| r.is_notice).count(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Classification complete"
        );
        analyzed
    }
}
