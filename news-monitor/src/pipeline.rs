use crate::classifier::RelevanceClassifier;
use crate::config::MonitorConfig;
use crate::dedup::Deduplicator;
use crate::digest::compose_digest;
use crate::fetcher::Fetcher;
use crate::mailer::SmtpMailer;
use crate::parser::FeedParser;
use crate::ranking::rank;
use crate::scorer::ScorerChain;
use crate::traits::{DigestSender, FeedSource};
use crate::types::{FeedSpec, Result, RunReport, ScoredArticle};
use chrono::{DateTime, Utc};
use tracing::{error, info, warn};

/// One pass over every configured feed, start to finish, strictly in order.
pub struct NewsMonitor {
    config: MonitorConfig,
    source: Box<dyn FeedSource>,
    sender: Option<Box<dyn DigestSender>>,
    parser: FeedParser,
    classifier: RelevanceClassifier,
    scorers: ScorerChain,
}

impl NewsMonitor {
    pub fn new(
        config: MonitorConfig,
        source: Box<dyn FeedSource>,
        sender: Option<Box<dyn DigestSender>>,
    ) -> Result<Self> {
        let parser = FeedParser::new(config.max_age_hours);
        let classifier = RelevanceClassifier::new(&config.classifier)?;
        let scorers = ScorerChain::from_config(&config.scorer)?;

        Ok(Self {
            config,
            source,
            sender,
            parser,
            classifier,
            scorers,
        })
    }

    /// HTTP fetcher plus SMTP mailer (when credentials are present).
    pub fn from_config(config: MonitorConfig) -> Result<Self> {
        let fetcher = Fetcher::new(config.fetch.clone())?;
        let sender = SmtpMailer::from_config(&config.mail)
            .map(|mailer| Box::new(mailer) as Box<dyn DigestSender>);
        Self::new(config, Box::new(fetcher), sender)
    }

    pub fn with_scorers(mut self, scorers: ScorerChain) -> Self {
        self.scorers = scorers;
        self
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub fn scorer_names(&self) -> Vec<String> {
        self.scorers.scorer_names()
    }

    /// Collect, rank and send. Dedup state is read at the start and written
    /// before sending; a dry run neither writes state nor sends.
    pub async fn run(&self, dry_run: bool) -> RunReport {
        let now = Utc::now();
        let mut dedup = Deduplicator::load(&self.config.dedup);

        let mut report = RunReport::default();
        let collected = self.collect(&mut dedup, &mut report, now).await;
        if !dry_run {
            dedup.save();
        }

        report.articles = rank(collected);
        info!(
            "Found {} new policy-related articles ({} feeds polled, {} failed)",
            report.articles.len(),
            report.feeds_polled,
            report.feeds_failed
        );

        if dry_run {
            info!("Dry run: not sending the digest");
            return report;
        }

        if report.articles.is_empty() && !self.config.send_empty_digest {
            info!("Nothing new and empty digests are disabled; not sending");
            return report;
        }

        let Some(sender) = &self.sender else {
            warn!("Email credentials not configured; set EMAIL_USER, EMAIL_PASSWORD and RECIPIENT_EMAIL to send the digest");
            return report;
        };

        let digest = compose_digest(&report.articles, now);
        report.email_sent = sender.send(&digest.subject, &digest.html, &digest.text).await;
        report
    }

    /// Walk all feeds and return the new, relevant, scored articles in feed order.
    pub async fn collect(
        &self,
        dedup: &mut Deduplicator,
        report: &mut RunReport,
        now: DateTime<Utc>,
    ) -> Vec<ScoredArticle> {
        let mut collected = Vec::new();
        let feed_count = self.config.feeds.len();

        for (index, feed) in self.config.feeds.iter().enumerate() {
            report.feeds_polled += 1;

            match self.process_feed(feed, dedup, report, now).await {
                Ok(mut articles) => collected.append(&mut articles),
                Err(e) => {
                    report.feeds_failed += 1;
                    error!("Error fetching {}: {}", feed.name, e);
                }
            }

            let delay = self.config.fetch.feed_delay;
            if index + 1 < feed_count && !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }

        collected
    }

    async fn process_feed(
        &self,
        feed: &FeedSpec,
        dedup: &mut Deduplicator,
        report: &mut RunReport,
        now: DateTime<Utc>,
    ) -> Result<Vec<ScoredArticle>> {
        info!("Fetching from {} ({})...", feed.name, feed.kind);

        let content = self.source.fetch(&feed.url).await?;
        let entries = self.parser.parse_feed(&content, now)?;
        let articles = self.parser.to_articles(entries, &feed.name, now);

        let mut kept = Vec::new();
        for article in articles {
            report.entries_seen += 1;

            if !dedup.is_new(&article) {
                report.already_processed += 1;
                continue;
            }

            let classification = self
                .classifier
                .classify(&article.title, &article.cleaned_summary);
            if !classification.is_relevant {
                report.irrelevant += 1;
                continue;
            }

            let score = self.scorers.score(&article).await;
            dedup.mark_processed_at(&article, now);
            kept.push(ScoredArticle {
                article,
                classification,
                score,
            });
        }

        info!("{}: {} new relevant articles", feed.name, kept.len());
        Ok(kept)
    }
}
