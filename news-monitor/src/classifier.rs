use crate::config::ClassifierConfig;
use crate::keywords::{match_text, KeywordSet};
use crate::types::{Classification, MonitorError, Result};
use regex::Regex;
use tracing::debug;

/// Conjunctive two-list gate: an article is in scope when it names a China/HK
/// entity AND either uses policy vocabulary or matches a country-pair pattern.
pub struct RelevanceClassifier {
    entities: KeywordSet,
    policy: KeywordSet,
    relations: Vec<Regex>,
}

impl RelevanceClassifier {
    pub fn new(config: &ClassifierConfig) -> Result<Self> {
        let relations = config
            .relation_patterns
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| {
                    MonitorError::Config(format!("bad relation pattern '{}': {}", pattern, e))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            entities: KeywordSet::new(&config.entity_terms)?,
            policy: KeywordSet::new(&config.policy_terms)?,
            relations,
        })
    }

    pub fn classify(&self, title: &str, summary: &str) -> Classification {
        let text = match_text(title, summary);

        let entity_hits = self.entities.matches(&text);
        let policy_hits = self.policy.matches(&text);
        let relation_hits: Vec<String> = self
            .relations
            .iter()
            .filter_map(|regex| regex.find(&text).map(|m| m.as_str().to_string()))
            .collect();

        let is_relevant =
            !entity_hits.is_empty() && (!policy_hits.is_empty() || !relation_hits.is_empty());

        let mut matched_keywords: Vec<String> = Vec::new();
        let all_hits = entity_hits
            .iter()
            .chain(policy_hits.iter())
            .map(|s| s.to_string())
            .chain(relation_hits);
        for hit in all_hits {
            if !matched_keywords.contains(&hit) {
                matched_keywords.push(hit);
            }
        }

        debug!(
            relevant = is_relevant,
            keywords = ?matched_keywords,
            "Classified '{}'",
            title
        );

        Classification {
            is_relevant,
            matched_keywords,
        }
    }
}
