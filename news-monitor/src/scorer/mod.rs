//! Importance scoring.
//!
//! Strategies implement [`Scorer`] and are tried in order by a [`ScorerChain`];
//! the first one that produces a score wins. The chain always ends in the
//! rule-based scorer, so scoring never fails.

pub mod local;
pub mod remote;
pub mod rules;

pub use local::LocalModelScorer;
pub use remote::RemoteLlmScorer;
pub use rules::RuleBasedScorer;

use crate::config::ScorerConfig;
use crate::types::{AiInsight, Article, Category, MonitorError, Result, Score, ScoringMethod};
use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info};

#[async_trait]
pub trait Scorer: Send + Sync {
    fn scorer_name(&self) -> String;

    /// Score the article, or `None` to let the next strategy try.
    async fn attempt(&self, article: &Article) -> Option<Score>;
}

pub struct ScorerChain {
    scorers: Vec<Box<dyn Scorer>>,
    fallback: RuleBasedScorer,
}

impl ScorerChain {
    pub fn new(fallback: RuleBasedScorer) -> Self {
        Self {
            scorers: Vec::new(),
            fallback,
        }
    }

    /// Remote model first (when a key is configured), then the local model,
    /// then rules.
    pub fn from_config(config: &ScorerConfig) -> Result<Self> {
        let rules = RuleBasedScorer::new(&config.rules)?;
        let mut builder = ScorerChainBuilder::new(rules.clone());

        if let Some(remote) = &config.remote {
            builder = builder.push(Box::new(RemoteLlmScorer::new(remote.clone(), rules.clone())?));
        }
        if let Some(local) = &config.local {
            builder = builder.push(Box::new(LocalModelScorer::new(local.clone(), rules.clone())?));
        }

        Ok(builder.build())
    }

    pub fn register(&mut self, scorer: Box<dyn Scorer>) {
        info!("Registering scorer: {}", scorer.scorer_name());
        self.scorers.push(scorer);
    }

    pub fn scorer_names(&self) -> Vec<String> {
        self.scorers
            .iter()
            .map(|s| s.scorer_name())
            .chain(std::iter::once(self.fallback.scorer_name()))
            .collect()
    }

    pub async fn score(&self, article: &Article) -> Score {
        for scorer in &self.scorers {
            if let Some(score) = scorer.attempt(article).await {
                debug!("'{}' scored by {}", article.title, scorer.scorer_name());
                return score;
            }
            debug!("{} passed on '{}'", scorer.scorer_name(), article.title);
        }

        self.fallback.score_text(&article.title, &article.cleaned_summary)
    }
}

pub struct ScorerChainBuilder {
    chain: ScorerChain,
}

impl ScorerChainBuilder {
    pub fn new(fallback: RuleBasedScorer) -> Self {
        Self {
            chain: ScorerChain::new(fallback),
        }
    }

    pub fn push(mut self, scorer: Box<dyn Scorer>) -> Self {
        self.chain.register(scorer);
        self
    }

    pub fn build(self) -> ScorerChain {
        self.chain
    }
}

/// What a model is asked to return for each article.
#[derive(Debug, Clone, PartialEq)]
pub struct AiAssessment {
    pub relevance_score: f64,
    pub importance_score: f64,
    pub category: Option<Category>,
    pub key_points: Vec<String>,
    pub summary: Option<String>,
}

impl AiAssessment {
    pub fn into_score(self, fallback_category: Category) -> Score {
        let insight = AiInsight {
            key_points: self.key_points,
            summary: self.summary,
        };

        Score::new(
            self.importance_score.round() as i64,
            self.relevance_score.round() as i64,
            self.category.unwrap_or(fallback_category),
            ScoringMethod::Ai,
        )
        .with_insight(insight)
    }
}

/// Pull the JSON object out of a model reply that may be fenced or chatty.
pub fn extract_json_object(raw: &str) -> String {
    let trimmed = raw.trim();

    if trimmed.starts_with('{') && trimmed.ends_with('}') {
        return trimmed.to_string();
    }

    if let Some(start) = trimmed.find("```json") {
        let after = &trimmed[start + 7..];
        if let Some(end) = after.find("```") {
            return after[..end].trim().to_string();
        }
    }

    if let Some(start) = trimmed.find("```") {
        let after = &trimmed[start + 3..];
        if let Some(end) = after.find("```") {
            let inner = after[..end].trim();
            if inner.starts_with('{') {
                return inner.to_string();
            }
        }
    }

    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) {
        if end > start {
            return trimmed[start..=end].to_string();
        }
    }

    trimmed.to_string()
}

pub fn parse_assessment(raw: &str) -> Result<AiAssessment> {
    let json = extract_json_object(raw);
    let value: Value = serde_json::from_str(&json)?;

    let relevance_score = number_field(&value, "relevance_score")?;
    let importance_score = number_field(&value, "importance_score")?;

    let category = value
        .get("category")
        .and_then(Value::as_str)
        .and_then(Category::from_loose);

    let key_points = value
        .get("key_points")
        .and_then(Value::as_array)
        .map(|points| {
            points
                .iter()
                .filter_map(Value::as_str)
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty())
                .collect()
        })
        .unwrap_or_default();

    let summary = value
        .get("summary")
        .and_then(Value::as_str)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());

    Ok(AiAssessment {
        relevance_score,
        importance_score,
        category,
        key_points,
        summary,
    })
}

fn number_field(value: &Value, key: &str) -> Result<f64> {
    let field = value
        .get(key)
        .ok_or_else(|| MonitorError::Parse(format!("model reply is missing '{}'", key)))?;

    let number = match field {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    number
        .filter(|n| n.is_finite())
        .ok_or_else(|| MonitorError::Parse(format!("'{}' is not a number: {}", key, field)))
}

/// Instructions shared by both model-backed scorers.
pub(crate) const ASSESSMENT_FIELDS: &str = r#"Respond with a single JSON object and nothing else:
{
  "relevance_score": <integer 0-10, how closely this concerns China or Hong Kong government policy>,
  "importance_score": <integer 0-10, editorial significance>,
  "category": "<one of: Hong Kong, Trade, Technology, Military, Economy, Diplomacy, Politics, Other>",
  "key_points": ["<short point>", "..."],
  "summary": "<one sentence>"
}"#;
