use super::Scorer;
use crate::config::RuleScorerConfig;
use crate::keywords::{match_text, KeywordSet};
use crate::types::{Article, Category, Result, Score, ScoringMethod};
use async_trait::async_trait;

/// Deterministic keyword scorer. Always produces a score.
#[derive(Debug, Clone)]
pub struct RuleBasedScorer {
    base_score: i64,
    bonus_cap: i64,
    groups: Vec<(Category, KeywordSet)>,
    entities: KeywordSet,
}

impl RuleBasedScorer {
    pub fn new(config: &RuleScorerConfig) -> Result<Self> {
        let mut groups: Vec<(Category, KeywordSet)> = config
            .category_keywords
            .iter()
            .map(|(category, terms)| -> Result<(Category, KeywordSet)> {
                Ok((*category, KeywordSet::new(terms)?))
            })
            .collect::<Result<_>>()?;
        groups.sort_by_key(|(category, _)| *category);

        Ok(Self {
            base_score: config.base_score,
            bonus_cap: config.keyword_bonus_cap.max(0),
            groups,
            entities: KeywordSet::new(&config.entity_terms)?,
        })
    }

    /// Category of the first keyword group (in precedence order) that matches.
    pub fn categorize(&self, title: &str, summary: &str) -> Category {
        let text = match_text(title, summary);
        self.groups
            .iter()
            .find(|(_, set)| set.any_match(&text))
            .map(|(category, _)| *category)
            .unwrap_or(Category::Other)
    }

    pub fn score_text(&self, title: &str, summary: &str) -> Score {
        let text = match_text(title, summary);

        let mut category = None;
        let mut distinct: Vec<&str> = Vec::new();
        for (group_category, set) in &self.groups {
            let hits = set.matches(&text);
            if !hits.is_empty() && category.is_none() {
                category = Some(*group_category);
            }
            for hit in hits {
                if !distinct.contains(&hit) {
                    distinct.push(hit);
                }
            }
        }

        let keyword_bonus = (without_overlaps(distinct).len() as i64).min(self.bonus_cap);
        let entity_hits = without_overlaps(self.entities.matches(&text));
        let entity_bonus = (entity_hits.len() as i64).min(self.bonus_cap);

        Score::new(
            self.base_score + keyword_bonus,
            self.base_score + entity_bonus,
            category.unwrap_or(Category::Other),
            ScoringMethod::RuleBased,
        )
    }
}

/// Drop hits that only matched as part of a longer matched phrase, so
/// "export controls" counts once rather than also as "export".
fn without_overlaps(hits: Vec<&str>) -> Vec<&str> {
    hits.iter()
        .copied()
        .filter(|short| {
            let padded = format!(" {} ", short);
            !hits
                .iter()
                .any(|long| long.len() > short.len() && format!(" {} ", long).contains(&padded))
        })
        .collect()
}

#[async_trait]
impl Scorer for RuleBasedScorer {
    fn scorer_name(&self) -> String {
        "rule-based".to_string()
    }

    async fn attempt(&self, article: &Article) -> Option<Score> {
        Some(self.score_text(&article.title, &article.cleaned_summary))
    }
}
