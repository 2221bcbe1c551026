use super::{parse_assessment, RuleBasedScorer, Scorer, ASSESSMENT_FIELDS};
use crate::cleaner::truncate_chars;
use crate::config::LocalModelConfig;
use crate::types::{Article, Result, Score};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Scores through a model served on this host (Ollama's generate API).
/// An unreachable server just means "not installed here".
pub struct LocalModelScorer {
    client: Client,
    config: LocalModelConfig,
    rules: RuleBasedScorer,
}

impl LocalModelScorer {
    pub fn new(config: LocalModelConfig, rules: RuleBasedScorer) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self { client, config, rules })
    }

    fn build_prompt(&self, article: &Article) -> String {
        let summary = truncate_chars(&article.cleaned_summary, self.config.max_input_chars);
        format!(
            "Rate this China/Hong Kong news item.\nTitle: {}\nSummary: {}\n\n{}",
            article.title, summary, ASSESSMENT_FIELDS
        )
    }

    async fn request_score(&self, article: &Article) -> std::result::Result<Score, LocalFailure> {
        let request = GenerateRequest {
            model: self.config.model.clone(),
            prompt: self.build_prompt(article),
            stream: false,
            format: "json".to_string(),
            options: GenerateOptions { temperature: 0.1 },
        };

        let response = self
            .client
            .post(&self.config.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    LocalFailure::Unavailable
                } else {
                    LocalFailure::Failed(e.to_string())
                }
            })?
            .error_for_status()
            .map_err(|e| LocalFailure::Failed(e.to_string()))?;

        let generated: GenerateResponse = response
            .json()
            .await
            .map_err(|e| LocalFailure::Failed(e.to_string()))?;

        let assessment =
            parse_assessment(&generated.response).map_err(|e| LocalFailure::Failed(e.to_string()))?;
        let fallback = self.rules.categorize(&article.title, &article.cleaned_summary);
        Ok(assessment.into_score(fallback))
    }
}

enum LocalFailure {
    Unavailable,
    Failed(String),
}

#[async_trait]
impl Scorer for LocalModelScorer {
    fn scorer_name(&self) -> String {
        format!("local-model ({})", self.config.model)
    }

    async fn attempt(&self, article: &Article) -> Option<Score> {
        match self.request_score(article).await {
            Ok(score) => Some(score),
            Err(LocalFailure::Unavailable) => {
                debug!("Local model at {} is not reachable", self.config.url);
                None
            }
            Err(LocalFailure::Failed(reason)) => {
                warn!("Local model scoring failed for '{}': {}", article.title, reason);
                None
            }
        }
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest {
    model: String,
    prompt: String,
    stream: bool,
    format: String,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}
