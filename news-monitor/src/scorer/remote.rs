use super::{parse_assessment, RuleBasedScorer, Scorer, ASSESSMENT_FIELDS};
use crate::cleaner::truncate_chars;
use crate::config::RemoteModelConfig;
use crate::types::{Article, MonitorError, Result, Score};
use async_trait::async_trait;
use backoff::backoff::{Backoff, Constant};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

const SYSTEM_PROMPT: &str = "You are an analyst who triages news for a daily briefing on \
China and Hong Kong government policy. You rate how relevant and how important each \
article is and answer only in JSON.";

/// Scores through an OpenAI-compatible chat completions endpoint.
pub struct RemoteLlmScorer {
    client: Client,
    config: RemoteModelConfig,
    rules: RuleBasedScorer,
}

impl RemoteLlmScorer {
    pub fn new(config: RemoteModelConfig, rules: RuleBasedScorer) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self { client, config, rules })
    }

    pub fn build_prompt(&self, article: &Article) -> String {
        let summary = truncate_chars(&article.cleaned_summary, self.config.max_input_chars);
        format!(
            "Assess this news article.\n\nTitle: {}\nSource: {}\nSummary: {}\n\n{}",
            article.title, article.source, summary, ASSESSMENT_FIELDS
        )
    }

    async fn request_score(&self, article: &Article) -> Result<Score> {
        let request = ChatCompletionRequest {
            model: self.config.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".into(),
                    content: SYSTEM_PROMPT.into(),
                },
                ChatMessage {
                    role: "user".into(),
                    content: self.build_prompt(article),
                },
            ],
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        let response = self
            .client
            .post(&self.config.api_url)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await?
            .error_for_status()?;

        let completion: ChatCompletionResponse = response.json().await?;
        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .ok_or_else(|| MonitorError::Parse("completion has no message content".to_string()))?;

        let assessment = parse_assessment(&content)?;
        let fallback = self.rules.categorize(&article.title, &article.cleaned_summary);
        Ok(assessment.into_score(fallback))
    }
}

#[async_trait]
impl Scorer for RemoteLlmScorer {
    fn scorer_name(&self) -> String {
        format!("remote-llm ({})", self.config.model)
    }

    async fn attempt(&self, article: &Article) -> Option<Score> {
        let mut backoff = Constant::new(self.config.retry_delay);
        let attempts = self.config.max_attempts.max(1);

        for attempt in 1..=attempts {
            match self.request_score(article).await {
                Ok(score) => return Some(score),
                Err(e) => {
                    warn!(
                        "AI scoring attempt {}/{} failed for '{}': {}",
                        attempt, attempts, article.title, e
                    );
                    if is_permanent(&e) {
                        debug!("Not retrying '{}': request was rejected", article.title);
                        break;
                    }
                    if attempt < attempts {
                        if let Some(delay) = backoff.next_backoff() {
                            tokio::time::sleep(delay).await;
                        }
                    }
                }
            }
        }

        debug!("Remote model gave up on '{}'", article.title);
        None
    }
}

/// Client errors other than rate limiting will fail the same way on every retry.
fn is_permanent(error: &MonitorError) -> bool {
    match error {
        MonitorError::Http(e) => e
            .status()
            .map(|status| status.is_client_error() && status != StatusCode::TOO_MANY_REQUESTS)
            .unwrap_or(false),
        _ => false,
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: Option<ChatCompletionMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionMessage {
    content: Option<String>,
}
