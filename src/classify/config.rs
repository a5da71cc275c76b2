//! Static classification tables and their optional YAML override.
//!
//! Every table is an ordered list and is matched first-hit-wins, so order
//! encodes priority. The built-in defaults are the IFPI tables; a YAML file
//! can replace any of them:
//!
//! ```yaml
//! notice_keywords: [edital, seleção]
//! topics:
//!   - topic: Assistência Estudantil
//!     keywords: [bolsa, auxílio]
//! locations:
//!   - alias: picos
//!     location: IFPI - Campus Picos
//! ```
//!
//! Keywords and aliases are lowercased on load since they are matched
//! against lowercased text.

use crate::errors::StageError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, instrument};

pub const CATCH_ALL_TOPIC: &str = "Outros/Geral";
pub const UNMAPPED_LOCATION: &str = "Não Mapeado";

const NOTICE_KEYWORDS: &[&str] = &[
    "edital",
    "seleção",
    "processo seletivo",
    "inscrições abertas",
    "chamada pública",
];

const TOPIC_RULES: &[(&str, &[&str])] = &[
    (
        "Assistência Estudantil",
        &["bolsa", "permanência", "auxílio", "moradia", "apoio estudantil"],
    ),
    (
        "Pós-Graduação",
        &["mestrado", "doutorado", "especialização", "pós-graduação"],
    ),
    (
        "Concursos e Seleção de Servidores",
        &["concurso", "servidores", "tae", "professor", "cargo efetivo"],
    ),
    (
        "Ensino e Cursos",
        &["vagas", "cursos", "matrículas", "ensino técnico"],
    ),
    (
        "Pesquisa e Inovação",
        &[
            "pesquisa",
            "iniciação científica",
            "inovação",
            "extensão tecnológica",
            "residência tecnológica",
        ],
    ),
    (
        "Extensão e Cultura",
        &["extensão", "cultura", "evento", "palestra", "curso de férias", "minicurso"],
    ),
];

const LOCATION_ALIASES: &[(&str, &str)] = &[
    ("ifpi", "IFPI - Geral"),
    ("instituto federal do piaui", "IFPI - Geral"),
    ("teresina central", "IFPI - Campus Teresina Central"),
    ("campus central", "IFPI - Campus Teresina Central"),
    ("campus teresina central", "IFPI - Campus Teresina Central"),
    ("teresina dirceu arcoverde", "IFPI - Campus Teresina Dirceu Arcoverde"),
    ("dirceu", "IFPI - Campus Teresina Dirceu Arcoverde"),
    ("campus dirceu", "IFPI - Campus Teresina Dirceu Arcoverde"),
    ("teresina zona sul", "IFPI - Campus Teresina Zona Sul"),
    ("zona sul", "IFPI - Campus Teresina Zona Sul"),
    ("campus teresina zona sul", "IFPI - Campus Teresina Zona Sul"),
    ("angical", "IFPI - Campus Angical"),
    ("campo maior", "IFPI - Campus Campo Maior"),
    ("cocal", "IFPI - Campus Cocal"),
    ("corrente", "IFPI - Campus Corrente"),
    ("floriano", "IFPI - Campus Floriano"),
    ("jose de freitas", "IFPI - Campus José de Freitas"),
    ("josé de freitas", "IFPI - Campus José de Freitas"),
    ("oeiras", "IFPI - Campus Oeiras"),
    ("parnaiba", "IFPI - Campus Parnaíba"),
    ("parnaíba", "IFPI - Campus Parnaíba"),
    ("paulistana", "IFPI - Campus Paulistana"),
    ("pedro ii", "IFPI - Campus Pedro II"),
    ("picos", "IFPI - Campus Picos"),
    ("pio ix", "IFPI - Campus Pio IX"),
    ("piripiri", "IFPI - Campus Piripiri"),
    ("sao joao", "IFPI - Campus São João"),
    ("são joão", "IFPI - Campus São João"),
    ("sao raimundo nonato", "IFPI - Campus São Raimundo Nonato"),
    ("são raimundo nonato", "IFPI - Campus São Raimundo Nonato"),
    ("urucui", "IFPI - Campus Uruçuí"),
    ("uruçuí", "IFPI - Campus Uruçuí"),
    ("valenca", "IFPI - Campus Valença"),
    ("valença", "IFPI - Campus Valença"),
    ("diretoria de educação a distância", "IFPI - EaD"),
    ("ead", "IFPI - EaD"),
];

/// One topic and the keywords that select it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicRule {
    pub topic: String,
    pub keywords: Vec<String>,
}

/// A lowercase alias and the canonical location it stands for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationAlias {
    pub alias: String,
    pub location: String,
}

/// All tables the classification engine needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub notice_keywords: Vec<String>,
    pub topics: Vec<TopicRule>,
    pub catch_all_topic: String,
    pub locations: Vec<LocationAlias>,
    pub unmapped_location: String,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            notice_keywords: NOTICE_KEYWORDS.iter().map(|k| k.to_string()).collect(),
            topics: TOPIC_RULES
                .iter()
                .map(|(topic, keywords)| TopicRule {
                    topic: topic.to_string(),
                    keywords: keywords.iter().map(|k| k.to_string()).collect(),
                })
                .collect(),
            catch_all_topic: CATCH_ALL_TOPIC.to_string(),
            locations: LOCATION_ALIASES
                .iter()
                .map(|(alias, location)| LocationAlias {
                    alias: alias.to_string(),
                    location: location.to_string(),
                })
                .collect(),
            unmapped_location: UNMAPPED_LOCATION.to_string(),
        }
    }
}

impl ClassifierConfig {
    /// Load an override file. Tables the file omits keep their defaults.
    #[instrument(level = "info", skip_all, fields(path = %path.display()))]
    pub fn load(path: &Path) -> Result<Self, StageError> {
        let resource = path.display().to_string();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| StageError::configuration(&resource, e))?;
        let config = Self::from_yaml_str(&raw, &resource)?;
        info!(
            topics = config.topics.len(),
            aliases = config.locations.len(),
            notice_keywords = config.notice_keywords.len(),
            "Loaded classification rules"
        );
        Ok(config)
    }

    pub fn from_yaml_str(raw: &str, resource: &str) -> Result<Self, StageError> {
        let config: ClassifierConfig =
            serde_yaml::from_str(raw).map_err(|e| StageError::configuration(resource, e))?;
        config.normalized().validate(resource)
    }

    fn normalized(mut self) -> Self {
        for k in &mut self.notice_keywords {
            *k = k.trim().to_lowercase();
        }
        for rule in &mut self.topics {
            for k in &mut rule.keywords {
                *k = k.trim().to_lowercase();
            }
        }
        for alias in &mut self.locations {
            alias.alias = alias.alias.trim().to_lowercase();
        }
        self
    }

    fn validate(self, resource: &str) -> Result<Self, StageError> {
        if self.topics.is_empty() {
            return Err(StageError::configuration(resource, "no topic rules defined"));
        }
        if self.locations.is_empty() {
            return Err(StageError::configuration(resource, "no location aliases defined"));
        }
        // An empty keyword is a substring of every text and would shadow
        // everything after it.
        let empty_keyword = self.notice_keywords.iter().any(String::is_empty)
            || self.topics.iter().flat_map(|r| &r.keywords).any(String::is_empty)
            || self.locations.iter().any(|a| a.alias.is_empty());
        if empty_keyword {
            return Err(StageError::configuration(resource, "empty keyword or alias"));
        }
        Ok(self)
    }
}
