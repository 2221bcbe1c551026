use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// What kind of outlet a feed is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedKind {
    Official,
    News,
    Aggregated,
}

impl fmt::Display for FeedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FeedKind::Official => "Official",
            FeedKind::News => "News",
            FeedKind::Aggregated => "Aggregated",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedSpec {
    pub name: String,
    pub url: String,
    pub kind: FeedKind,
}

impl FeedSpec {
    pub fn new(name: &str, url: &str, kind: FeedKind) -> Self {
        Self {
            name: name.to_string(),
            url: url.to_string(),
            kind,
        }
    }
}

/// One entry as it comes out of a syndication document, before any cleaning.
#[derive(Debug, Clone)]
pub struct ParsedEntry {
    pub guid: Option<String>,
    pub link: String,
    pub title: String,
    pub summary: String,
    pub published_at: DateTime<Utc>,
}

/// An ingested article. `link` is the stable identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    pub link: String,
    pub raw_summary: String,
    pub cleaned_summary: String,
    pub published_at: DateTime<Utc>,
    pub source: String,
    pub hours_ago: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub is_relevant: bool,
    pub matched_keywords: Vec<String>,
}

/// Topical bucket. Variant order is precedence order for rule-based assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    HongKong,
    Trade,
    Technology,
    Military,
    Economy,
    Diplomacy,
    Politics,
    Other,
}

impl Category {
    pub fn label(&self) -> &'static str {
        match self {
            Category::HongKong => "Hong Kong",
            Category::Trade => "China-Trade",
            Category::Technology => "China-Tech",
            Category::Military => "China-Military",
            Category::Economy => "China-Economy",
            Category::Diplomacy => "China-Diplomacy",
            Category::Politics => "China-Politics",
            Category::Other => "Other",
        }
    }

    /// Map a free-form category string (as returned by a model) onto a bucket.
    pub fn from_loose(value: &str) -> Option<Category> {
        let lowered = value.trim().to_lowercase();
        if lowered.is_empty() {
            return None;
        }

        if lowered.contains("hong kong") || lowered.contains("hongkong") || lowered == "hk" {
            Some(Category::HongKong)
        } else if lowered.contains("trade") || lowered.contains("tariff") {
            Some(Category::Trade)
        } else if lowered.contains("tech") {
            Some(Category::Technology)
        } else if lowered.contains("military") || lowered.contains("defen") || lowered.contains("security") {
            Some(Category::Military)
        } else if lowered.contains("econom") || lowered.contains("financ") || lowered.contains("market") {
            Some(Category::Economy)
        } else if lowered.contains("diplom") || lowered.contains("foreign") || lowered.contains("relations") {
            Some(Category::Diplomacy)
        } else if lowered.contains("politic") || lowered.contains("policy") || lowered.contains("government") {
            Some(Category::Politics)
        } else if lowered.contains("other") || lowered.contains("general") {
            Some(Category::Other)
        } else {
            None
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScoringMethod {
    Ai,
    RuleBased,
}

impl fmt::Display for ScoringMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScoringMethod::Ai => f.write_str("ai"),
            ScoringMethod::RuleBased => f.write_str("rule-based"),
        }
    }
}

/// Extra output an AI strategy can attach to its score.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiInsight {
    pub key_points: Vec<String>,
    pub summary: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Score {
    pub importance: u8,
    pub relevance: u8,
    pub category: Category,
    pub method: ScoringMethod,
    pub insight: Option<AiInsight>,
}

impl Score {
    pub const MAX: u8 = 10;

    /// Build a score, clamping both values into `0..=10`.
    pub fn new(importance: i64, relevance: i64, category: Category, method: ScoringMethod) -> Self {
        Self {
            importance: clamp_score(importance),
            relevance: clamp_score(relevance),
            category,
            method,
            insight: None,
        }
    }

    pub fn with_insight(mut self, insight: AiInsight) -> Self {
        self.insight = Some(insight);
        self
    }

    /// 0.6 * importance + 0.4 * relevance, scaled by ten to stay integral.
    pub fn weighted(&self) -> u32 {
        6 * self.importance as u32 + 4 * self.relevance as u32
    }
}

pub fn clamp_score(value: i64) -> u8 {
    value.clamp(0, Score::MAX as i64) as u8
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredArticle {
    pub article: Article,
    pub classification: Classification,
    pub score: Score,
}

/// Outcome of one monitor run.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub feeds_polled: usize,
    pub feeds_failed: usize,
    pub entries_seen: usize,
    pub already_processed: usize,
    pub irrelevant: usize,
    pub articles: Vec<ScoredArticle>,
    pub email_sent: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Feed parse error: {0}")]
    Parse(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Mail error: {0}")]
    Mail(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("General error: {0}")]
    General(String),
}

pub type Result<T> = std::result::Result<T, MonitorError>;
