pub mod types;
pub mod config;
pub mod traits;
pub mod keywords;
pub mod cleaner;
pub mod classifier;
pub mod scorer;
pub mod dedup;
pub mod fetcher;
pub mod parser;
pub mod ranking;
pub mod digest;
pub mod mailer;
pub mod pipeline;

pub use types::*;
pub use config::MonitorConfig;
pub use traits::{DigestSender, FeedSource};
pub use classifier::RelevanceClassifier;
pub use scorer::{Scorer, ScorerChain, RuleBasedScorer, RemoteLlmScorer, LocalModelScorer};
pub use dedup::Deduplicator;
pub use fetcher::Fetcher;
pub use parser::FeedParser;
pub use mailer::SmtpMailer;
pub use pipeline::NewsMonitor;
