use crate::cleaner::clean_summary;
use crate::types::{Article, MonitorError, ParsedEntry, Result};
use chrono::{DateTime, Duration, Utc};
use feed_rs::parser;
use std::collections::HashSet;
use tracing::{debug, info};

pub struct FeedParser {
    max_age: Duration,
}

impl FeedParser {
    pub fn new(max_age_hours: i64) -> Self {
        Self {
            max_age: Duration::hours(max_age_hours.max(0)),
        }
    }

    /// Parse a syndication document. Entries without a link are dropped, and
    /// repeated GUIDs or links within the document are kept once.
    pub fn parse_feed(&self, content: &[u8], now: DateTime<Utc>) -> Result<Vec<ParsedEntry>> {
        debug!("Parsing feed content ({} bytes)", content.len());

        let feed = parser::parse(content)
            .map_err(|e| MonitorError::Parse(format!("Failed to parse feed: {}", e)))?;

        let mut seen_guids = HashSet::new();
        let mut seen_links = HashSet::new();
        let mut entries = Vec::new();

        for entry in feed.entries {
            let Some(link) = entry.links.first().map(|l| l.href.trim().to_string()) else {
                debug!("Skipping entry without a link: {}", entry.id);
                continue;
            };
            if link.is_empty() || !seen_links.insert(link.clone()) {
                continue;
            }

            let guid = (!entry.id.is_empty()).then(|| entry.id.clone());
            if let Some(ref guid) = guid {
                if !seen_guids.insert(guid.clone()) {
                    debug!("Skipping duplicate entry with GUID: {}", guid);
                    continue;
                }
            }

            let title = entry
                .title
                .map(|t| t.content.trim().to_string())
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| "No title".to_string());

            let summary = entry
                .summary
                .map(|s| s.content)
                .or_else(|| entry.content.and_then(|c| c.body))
                .unwrap_or_default();

            // Entries with missing or unparseable dates are treated as fresh.
            let published_at = entry
                .published
                .or(entry.updated)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or(now);

            entries.push(ParsedEntry {
                guid,
                link,
                title,
                summary,
                published_at,
            });
        }

        info!("Parsed feed with {} entries", entries.len());
        Ok(entries)
    }

    pub fn is_recent(&self, entry: &ParsedEntry, now: DateTime<Utc>) -> bool {
        entry.published_at > now - self.max_age
    }

    /// Turn recent entries into cleaned articles, preserving feed order.
    pub fn to_articles(&self, entries: Vec<ParsedEntry>, source: &str, now: DateTime<Utc>) -> Vec<Article> {
        let total = entries.len();
        let articles: Vec<Article> = entries
            .into_iter()
            .filter(|entry| self.is_recent(entry, now))
            .map(|entry| Article {
                cleaned_summary: clean_summary(&entry.summary),
                hours_ago: now.signed_duration_since(entry.published_at).num_hours().max(0),
                title: entry.title,
                link: entry.link,
                raw_summary: entry.summary,
                published_at: entry.published_at,
                source: source.to_string(),
            })
            .collect();

        info!(
            "Found {} recent articles from {} ({} older than {}h skipped)",
            articles.len(),
            source,
            total - articles.len(),
            self.max_age.num_hours()
        );
        articles
    }
}
