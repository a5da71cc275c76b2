//! Named-entity recognition capability.
//!
//! The location resolver only needs `text -> [(span, label)]`, expressed by
//! [`EntityRecognizer`]. The shipped implementation, [`GazetteerRecognizer`],
//! is a regex gazetteer loaded from a YAML model file:
//!
//! ```yaml
//! entities:
//!   - pattern: '\bPicos\b'
//!     label: LOC
//!   - pattern: '(?i)\bIFPI\b'
//!     label: ORG
//! ```
//!
//! Patterns use the `regex` crate syntax. When matches overlap, the longer
//! one wins, then the one listed first.
//!
//! The model must be loaded explicitly and the handle passed to whoever needs
//! it; a model that cannot be loaded is a stage-fatal configuration error.

use crate::errors::StageError;
use regex::Regex;
use serde::Deserialize;
use std::cmp::Reverse;
use std::path::Path;
use tracing::{info, instrument};

/// Entity categories, using the usual CoNLL short names on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
pub enum EntityLabel {
    #[serde(rename = "LOC")]
    Location,
    #[serde(rename = "ORG")]
    Organization,
    #[serde(rename = "PER")]
    Person,
    #[serde(rename = "MISC")]
    Misc,
}

/// A recognized span of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    pub text: String,
    pub label: EntityLabel,
}

impl Entity {
    pub fn new(text: impl Into<String>, label: EntityLabel) -> Self {
        Self {
            text: text.into(),
            label,
        }
    }
}

/// Anything that can pull labeled entity spans out of text, in text order.
pub trait EntityRecognizer {
    fn entities(&self, text: &str) -> Vec<Entity>;
}

impl<T: EntityRecognizer + ?Sized> EntityRecognizer for &T {
    fn entities(&self, text: &str) -> Vec<Entity> {
        (**self).entities(text)
    }
}

#[derive(Debug, Deserialize)]
struct ModelFile {
    #[serde(default)]
    entities: Vec<PatternEntry>,
}

#[derive(Debug, Deserialize)]
struct PatternEntry {
    pattern: String,
    label: EntityLabel,
}

#[derive(Debug)]
struct CompiledPattern {
    regex: Regex,
    label: EntityLabel,
}

/// Regex-gazetteer recognizer.
#[derive(Debug)]
pub struct GazetteerRecognizer {
    patterns: Vec<CompiledPattern>,
}

impl GazetteerRecognizer {
    /// Load and compile a model file.
    #[instrument(level = "info", skip_all, fields(path = %path.display()))]
    pub fn load(path: &Path) -> Result<Self, StageError> {
        let resource = path.display().to_string();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            StageError::configuration(&resource, format!("cannot read NER model: {e}"))
        })?;
        let model = Self::from_yaml_str(&raw, &resource)?;
        info!(patterns = model.patterns.len(), "Loaded NER model");
        Ok(model)
    }

    pub fn from_yaml_str(raw: &str, resource: &str) -> Result<Self, StageError> {
        let file: ModelFile =
            serde_yaml::from_str(raw).map_err(|e| StageError::configuration(resource, e))?;
        if file.entities.is_empty() {
            return Err(StageError::configuration(resource, "NER model has no entities"));
        }

        let patterns = file
            .entities
            .into_iter()
            .map(|entry| {
                Regex::new(&entry.pattern)
                    .map(|regex| CompiledPattern {
                        regex,
                        label: entry.label,
                    })
                    .map_err(|e| {
                        StageError::configuration(
                            resource,
                            format!("bad pattern {:?}: {e}", entry.pattern),
                        )
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { patterns })
    }
}

impl EntityRecognizer for GazetteerRecognizer {
    fn entities(&self, text: &str) -> Vec<Entity> {
        // (start, end, pattern index)
        let mut spans: Vec<(usize, usize, usize)> = self
            .patterns
            .iter()
            .enumerate()
            .flat_map(|(i, p)| p.regex.find_iter(text).map(move |m| (m.start(), m.end(), i)))
            .filter(|(start, end, _)| end > start)
            .collect();
        spans.sort_by_key(|&(start, end, i)| (start, Reverse(end - start), i));

        let mut entities = Vec::new();
        let mut covered_until = 0;
        for (start, end, i) in spans {
            if start < covered_until {
                continue;
            }
            covered_until = end;
            entities.push(Entity::new(&text[start..end], self.patterns[i].label));
        }
        entities
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MODEL: &str = r#"
entities:
  - pattern: '\bTeresina\b'
    label: LOC
  - pattern: '\bTeresina Central\b'
    label: LOC
  - pattern: '(?i)\bifpi\b'
    label: ORG
  - pattern: '\bMaria da Silva\b'
    label: PER
"#;

    #[test]
    fn test_entities_in_text_order_with_labels() {
        let ner = GazetteerRecognizer::from_yaml_str(MODEL, "model").unwrap();
        let found = ner.entities("Maria da Silva visitou o IFPI em Teresina.");
        assert_eq!(
            found,
            vec![
                Entity::new("Maria da Silva", EntityLabel::Person),
                Entity::new("IFPI", EntityLabel::Organization),
                Entity::new("Teresina", EntityLabel::Location),
            ]
        );
    }

    #[test]
    fn test_longest_overlapping_match_wins() {
        let ner = GazetteerRecognizer::from_yaml_str(MODEL, "model").unwrap();
        let found = ner.entities("Campus Teresina Central e Teresina");
        assert_eq!(
            found,
            vec![
                Entity::new("Teresina Central", EntityLabel::Location),
                Entity::new("Teresina", EntityLabel::Location),
            ]
        );
    }

    #[test]
    fn test_no_entities() {
        let ner = GazetteerRecognizer::from_yaml_str(MODEL, "model").unwrap();
        assert!(ner.entities("nada a declarar").is_empty());
    }

    #[test]
    fn test_empty_model_is_configuration_error() {
        let err = GazetteerRecognizer::from_yaml_str("entities: []", "m.yaml").unwrap_err();
        assert!(matches!(err, StageError::Configuration { .. }));
    }

    #[test]
    fn test_bad_regex_and_label_are_rejected() {
        let bad_regex = "entities:\n  - pattern: '(unclosed'\n    label: LOC\n";
        assert!(GazetteerRecognizer::from_yaml_str(bad_regex, "m").is_err());
        let bad_label = "entities:\n  - pattern: 'x'\n    label: PLACE\n";
        assert!(GazetteerRecognizer::from_yaml_str(bad_label, "m").is_err());
    }

    #[test]
    fn test_missing_model_file() {
        let err = GazetteerRecognizer::load(Path::new("/no/such/ner.yaml")).unwrap_err();
        assert!(err.to_string().contains("cannot read NER model"));
    }

    #[test]
    fn test_shipped_model_compiles() {
        let raw = include_str!("../../config/ner_pt.yaml");
        let ner = GazetteerRecognizer::from_yaml_str(raw, "ner_pt.yaml").unwrap();
        let found = ner.entities("O Instituto Federal do Piauí, campus Picos, e o IFPI.");
        assert!(found.iter().any(|e| e.text == "Picos" && e.label == EntityLabel::Location));
        assert!(found.iter().any(|e| e.label == EntityLabel::Organization));
    }
}
