//! Keyword topic classification with ordered, first-match-wins rules.

use crate::classify::config::TopicRule;

/// Assigns exactly one topic per text.
///
/// Rules are checked in order and the first rule with any keyword present
/// wins, so a text mentioning both "bolsa" and "vagas" lands in
/// "Assistência Estudantil" because that rule comes first.
#[derive(Debug, Clone)]
pub struct TopicClassifier {
    rules: Vec<TopicRule>,
    catch_all: String,
}

impl TopicClassifier {
    /// `rules` keywords must already be lowercase.
    pub fn new(rules: Vec<TopicRule>, catch_all: String) -> Self {
        Self { rules, catch_all }
    }

    pub fn classify(&self, title: &str, body: &str) -> &str {
        let text = format!("{title} {body}").to_lowercase();
        self.rules
            .iter()
            .find(|rule| rule.keywords.iter().any(|k| text.contains(k.as_str())))
            .map_or(self.catch_all.as_str(), |rule| rule.topic.as_str())
    }
}
