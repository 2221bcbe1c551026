use crate::types::{Category, FeedKind, FeedSpec, MonitorError, Result};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

/// Everything a run needs, built once at start-up and handed to each component.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub feeds: Vec<FeedSpec>,
    pub fetch: FetchConfig,
    pub classifier: ClassifierConfig,
    pub scorer: ScorerConfig,
    pub dedup: DedupConfig,
    pub mail: MailConfig,
    pub max_age_hours: i64,
    pub send_empty_digest: bool,
}

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub user_agent: String,
    pub timeout_seconds: u64,
    /// Pause between consecutive feed fetches.
    pub feed_delay: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/120.0 Safari/537.36"
                .to_string(),
            timeout_seconds: 15,
            feed_delay: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    /// China / Hong Kong geography, leaders, parties and companies.
    pub entity_terms: Vec<String>,
    /// Policy, economy, tech, military and diplomacy vocabulary.
    pub policy_terms: Vec<String>,
    /// Country-pair regexes, matched against lower-cased text.
    pub relation_patterns: Vec<String>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            entity_terms: strings(&[
                "china", "chinese", "beijing", "shanghai", "shenzhen", "guangzhou", "wuhan",
                "hong kong", "hongkong", "hksar", "macau", "macao", "taiwan", "taipei",
                "xinjiang", "tibet", "greater bay area", "prc", "xi jinping", "li qiang",
                "wang yi", "john lee", "ccp", "cpc", "communist party", "politburo", "pla",
                "pboc", "people's bank of china", "huawei", "alibaba", "tencent", "byd",
                "bytedance", "tiktok", "smic", "xiaomi", "hang seng", "legco", "sino",
            ]),
            policy_terms: strings(&[
                "policy", "policies", "regulation", "regulations", "regulatory", "law",
                "legislation", "government", "ministry", "state council", "ndrc", "congress",
                "party congress", "central committee", "national security", "election",
                "trade", "tariff", "tariffs", "sanction", "sanctions", "export", "exports",
                "export controls", "import", "imports", "commerce", "wto", "economy",
                "economic", "gdp", "yuan", "stimulus", "fiscal", "monetary", "inflation",
                "property", "debt", "technology", "tech", "semiconductor", "semiconductors",
                "chip", "chips", "ai", "artificial intelligence", "cybersecurity",
                "data security", "antitrust", "military", "army", "navy", "missile",
                "defense", "defence", "drills", "warship", "diplomacy", "diplomatic",
                "summit", "talks", "ambassador", "foreign minister", "bilateral", "relations",
                "belt and road", "made in china 2025", "dual circulation", "carbon neutral",
                "climate policy",
            ]),
            relation_patterns: strings(&[
                r"\b(us|u\.s\.|america|eu|europe|japan|india|russia|uk|australia|canada)[\s-](china|beijing)\b",
                r"\b(china|beijing)[\s-](us|u\.s\.|eu|japan|india|russia|uk|taiwan|australia)\b",
                r"\bcross[\s-]strait\b",
                r"\bsino[\s-][a-z]+\b",
            ]),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScorerConfig {
    pub remote: Option<RemoteModelConfig>,
    pub local: Option<LocalModelConfig>,
    pub rules: RuleScorerConfig,
}

#[derive(Debug, Clone)]
pub struct RemoteModelConfig {
    pub api_url: String,
    pub api_key: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_seconds: u64,
    pub max_attempts: u32,
    pub retry_delay: Duration,
    pub max_input_chars: usize,
}

impl RemoteModelConfig {
    pub fn new(api_key: String) -> Self {
        Self {
            api_url: "https://api.openai.com/v1/chat/completions".to_string(),
            api_key,
            model: "gpt-4o-mini".to_string(),
            temperature: 0.2,
            max_tokens: 400,
            timeout_seconds: 15,
            max_attempts: 3,
            retry_delay: Duration::from_secs(2),
            max_input_chars: 1000,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LocalModelConfig {
    pub url: String,
    pub model: String,
    pub timeout_seconds: u64,
    pub max_input_chars: usize,
}

impl Default for LocalModelConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:11434/api/generate".to_string(),
            model: "llama3.2".to_string(),
            timeout_seconds: 10,
            max_input_chars: 800,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RuleScorerConfig {
    /// 6 for the China/HK monitor, 5 for the broad variant.
    pub base_score: i64,
    pub keyword_bonus_cap: i64,
    /// Keyword groups in category precedence order.
    pub category_keywords: Vec<(Category, Vec<String>)>,
    /// Terms counted towards relevance.
    pub entity_terms: Vec<String>,
}

impl Default for RuleScorerConfig {
    fn default() -> Self {
        Self {
            base_score: 6,
            keyword_bonus_cap: 4,
            category_keywords: default_category_keywords(),
            entity_terms: ClassifierConfig::default().entity_terms,
        }
    }
}

fn default_category_keywords() -> Vec<(Category, Vec<String>)> {
    vec![
        (
            Category::HongKong,
            strings(&[
                "hong kong", "hongkong", "hksar", "legco", "john lee", "article 23",
                "hang seng", "kowloon",
            ]),
        ),
        (
            Category::Trade,
            strings(&[
                "trade", "tariff", "tariffs", "export", "exports", "import", "imports",
                "sanction", "sanctions", "commerce", "wto", "trade war", "export controls",
            ]),
        ),
        (
            Category::Technology,
            strings(&[
                "technology", "tech", "semiconductor", "semiconductors", "chip", "chips", "ai",
                "artificial intelligence", "huawei", "smic", "5g", "quantum", "cybersecurity",
                "data security",
            ]),
        ),
        (
            Category::Military,
            strings(&[
                "military", "pla", "army", "navy", "missile", "defense", "defence", "drills",
                "warship", "aircraft carrier",
            ]),
        ),
        (
            Category::Economy,
            strings(&[
                "economy", "economic", "gdp", "yuan", "pboc", "stimulus", "property",
                "inflation", "growth", "fiscal", "monetary", "debt",
            ]),
        ),
        (
            Category::Diplomacy,
            strings(&[
                "diplomacy", "diplomatic", "summit", "talks", "ambassador", "foreign minister",
                "wang yi", "bilateral", "relations",
            ]),
        ),
        (
            Category::Politics,
            strings(&[
                "politburo", "communist party", "ccp", "cpc", "xi jinping", "state council",
                "policy", "government", "regulation", "congress", "election", "ministry",
            ]),
        ),
    ]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DedupKey {
    Link,
    /// SHA-256 of title followed by link.
    TitleLinkHash,
}

impl FromStr for DedupKey {
    type Err = MonitorError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "link" | "url" => Ok(DedupKey::Link),
            "hash" | "title+link" => Ok(DedupKey::TitleLinkHash),
            other => Err(MonitorError::Config(format!("unknown dedup key mode '{}'", other))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DedupConfig {
    pub state_file: PathBuf,
    pub key: DedupKey,
    /// `None` keeps entries forever.
    pub retention_days: Option<i64>,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            state_file: PathBuf::from("processed_articles.json"),
            key: DedupKey::Link,
            retention_days: Some(7),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MailConfig {
    pub smtp_server: String,
    pub smtp_port: u16,
    pub credentials: Option<MailCredentials>,
}

#[derive(Debug, Clone)]
pub struct MailCredentials {
    pub username: String,
    pub password: String,
    pub recipient: String,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            smtp_server: "smtp.gmail.com".to_string(),
            smtp_port: 587,
            credentials: None,
        }
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            feeds: default_feeds(),
            fetch: FetchConfig::default(),
            classifier: ClassifierConfig::default(),
            scorer: ScorerConfig {
                remote: None,
                local: None,
                rules: RuleScorerConfig::default(),
            },
            dedup: DedupConfig::default(),
            mail: MailConfig::default(),
            max_age_hours: 48,
            send_empty_digest: true,
        }
    }
}

pub fn default_feeds() -> Vec<FeedSpec> {
    vec![
        FeedSpec::new("China Daily", "http://www.chinadaily.com.cn/rss/china_rss.xml", FeedKind::Official),
        FeedSpec::new("Xinhua News", "http://www.xinhuanet.com/english/rss.xml", FeedKind::Official),
        FeedSpec::new("South China Morning Post", "https://www.scmp.com/rss/91/china", FeedKind::News),
        FeedSpec::new("SCMP Hong Kong", "https://www.scmp.com/rss/2/feed", FeedKind::News),
        FeedSpec::new(
            "RTHK Local News",
            "https://rthk.hk/rthk/news/rss/e_expressnews_elocal.xml",
            FeedKind::News,
        ),
        FeedSpec::new(
            "Google News - China Policy",
            "https://news.google.com/rss/search?q=china+government+policy&hl=en-US&gl=US&ceid=US:en",
            FeedKind::Aggregated,
        ),
        FeedSpec::new(
            "Google News - China Economy",
            "https://news.google.com/rss/search?q=china+economic+policy&hl=en-US&gl=US&ceid=US:en",
            FeedKind::Aggregated,
        ),
        FeedSpec::new(
            "Google News - Hong Kong Policy",
            "https://news.google.com/rss/search?q=hong+kong+government+policy&hl=en-US&gl=US&ceid=US:en",
            FeedKind::Aggregated,
        ),
    ]
}

impl MonitorConfig {
    /// Build configuration from the process environment, after loading `.env` if present.
    pub fn from_env() -> Result<Self> {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                warn!("Ignoring unreadable .env file: {}", e);
            }
        }

        let mut config = Self::default();

        config.mail.smtp_server = env_or("SMTP_SERVER", config.mail.smtp_server);
        config.mail.smtp_port = env_parse("SMTP_PORT")?.unwrap_or(config.mail.smtp_port);
        config.mail.credentials = match (
            non_empty_env("EMAIL_USER"),
            non_empty_env("EMAIL_PASSWORD"),
            non_empty_env("RECIPIENT_EMAIL"),
        ) {
            (Some(username), Some(password), Some(recipient)) => Some(MailCredentials {
                username,
                password,
                recipient,
            }),
            _ => None,
        };

        if let Some(api_key) = non_empty_env("AI_API_KEY") {
            let mut remote = RemoteModelConfig::new(api_key);
            remote.api_url = env_or("AI_API_URL", remote.api_url);
            remote.model = env_or("AI_MODEL", remote.model);
            config.scorer.remote = Some(remote);
        }

        if env_parse::<bool>("LOCAL_MODEL_ENABLED")?.unwrap_or(false) {
            let mut local = LocalModelConfig::default();
            local.url = env_or("LOCAL_MODEL_URL", local.url);
            local.model = env_or("LOCAL_MODEL_NAME", local.model);
            config.scorer.local = Some(local);
        }

        if let Some(path) = non_empty_env("STATE_FILE") {
            config.dedup.state_file = PathBuf::from(path);
        }
        if let Some(mode) = non_empty_env("DEDUP_KEY") {
            config.dedup.key = mode.parse()?;
        }
        if let Some(days) = env_parse::<i64>("DEDUP_RETENTION_DAYS")? {
            config.dedup.retention_days = (days > 0).then_some(days);
        }

        config.max_age_hours = env_parse("MAX_AGE_HOURS")?.unwrap_or(config.max_age_hours);
        config.scorer.rules.base_score =
            env_parse("RULE_BASE_SCORE")?.unwrap_or(config.scorer.rules.base_score);
        config.send_empty_digest =
            env_parse("SEND_EMPTY_DIGEST")?.unwrap_or(config.send_empty_digest);

        Ok(config)
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

fn non_empty_env(key: &str) -> Option<String> {
    env::var(key).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn env_or(key: &str, default: String) -> String {
    non_empty_env(key).unwrap_or(default)
}

fn env_parse<T: FromStr>(key: &str) -> Result<Option<T>> {
    match non_empty_env(key) {
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| MonitorError::Config(format!("{} has an invalid value: '{}'", key, raw))),
        None => Ok(None),
    }
}
