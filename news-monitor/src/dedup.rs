//! Cross-run memory of which articles have already been sent.
//!
//! State lives in a small JSON file that is read once at the start of a run
//! and written once at the end. Both operations are best effort: a missing or
//! unreadable file means "nothing seen yet", and a failed write is logged.

use crate::config::{DedupConfig, DedupKey};
use crate::types::{Article, Result};
use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// On-disk shape. Older runs wrote a bare array of keys.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StoredState {
    Current {
        processed: Vec<String>,
        #[serde(default)]
        last_updated: Option<String>,
        #[serde(default)]
        first_seen: HashMap<String, DateTime<Utc>>,
    },
    Legacy(Vec<String>),
}

#[derive(Debug, Serialize)]
struct StateFile<'a> {
    processed: Vec<&'a str>,
    last_updated: DateTime<Utc>,
    first_seen: BTreeMap<&'a str, DateTime<Utc>>,
}

pub struct Deduplicator {
    path: PathBuf,
    key: DedupKey,
    retention: Option<Duration>,
    seen: HashMap<String, DateTime<Utc>>,
    last_updated: Option<DateTime<Utc>>,
}

impl Deduplicator {
    /// Load state from `config.state_file`; never fails.
    pub fn load(config: &DedupConfig) -> Self {
        Self::load_at(config, Utc::now())
    }

    pub fn load_at(config: &DedupConfig, now: DateTime<Utc>) -> Self {
        let mut dedup = Self {
            path: config.state_file.clone(),
            key: config.key,
            retention: config.retention_days.map(Duration::days),
            seen: HashMap::new(),
            last_updated: None,
        };

        match read_state(&dedup.path) {
            Ok(Some(StoredState::Current {
                processed,
                last_updated,
                first_seen,
            })) => {
                for key in processed {
                    let stamp = first_seen.get(&key).copied().unwrap_or(now);
                    dedup.seen.insert(key, stamp);
                }
                dedup.last_updated = last_updated.as_deref().and_then(parse_timestamp);
            }
            Ok(Some(StoredState::Legacy(processed))) => {
                debug!("Upgrading legacy dedup state in {}", dedup.path.display());
                dedup.seen.extend(processed.into_iter().map(|key| (key, now)));
            }
            Ok(None) => {
                debug!("No dedup state at {}, starting fresh", dedup.path.display());
            }
            Err(e) => {
                warn!(
                    "Could not read dedup state {}: {}; starting fresh",
                    dedup.path.display(),
                    e
                );
            }
        }

        info!("Loaded {} processed article keys", dedup.seen.len());
        dedup
    }

    pub fn key_for(&self, article: &Article) -> String {
        article_key(self.key, &article.title, &article.link)
    }

    pub fn is_new(&self, article: &Article) -> bool {
        !self.seen.contains_key(&self.key_for(article))
    }

    pub fn mark_processed(&mut self, article: &Article) {
        self.mark_processed_at(article, Utc::now());
    }

    pub fn mark_processed_at(&mut self, article: &Article, now: DateTime<Utc>) {
        let key = self.key_for(article);
        self.seen.entry(key).or_insert(now);
    }

    /// Drop keys first seen longer ago than the retention window. Returns how many went.
    pub fn prune(&mut self, now: DateTime<Utc>) -> usize {
        let Some(retention) = self.retention else {
            return 0;
        };

        let cutoff = now - retention;
        let before = self.seen.len();
        self.seen.retain(|_, first_seen| *first_seen >= cutoff);
        let removed = before - self.seen.len();
        if removed > 0 {
            info!("Pruned {} dedup entries older than {} days", removed, retention.num_days());
        }
        removed
    }

    /// Prune and persist. Failures are logged, never returned.
    pub fn save(&mut self) {
        self.save_at(Utc::now());
    }

    pub fn save_at(&mut self, now: DateTime<Utc>) {
        self.prune(now);
        match self.write_state(now) {
            Ok(()) => {
                self.last_updated = Some(now);
                debug!("Saved {} dedup keys to {}", self.seen.len(), self.path.display());
            }
            Err(e) => warn!("Failed to save dedup state to {}: {}", self.path.display(), e),
        }
    }

    fn write_state(&self, now: DateTime<Utc>) -> Result<()> {
        let mut processed: Vec<&str> = self.seen.keys().map(String::as_str).collect();
        processed.sort_unstable();

        let state = StateFile {
            processed,
            last_updated: now,
            first_seen: self.seen.iter().map(|(k, v)| (k.as_str(), *v)).collect(),
        };
        let json = serde_json::to_string_pretty(&state)?;

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)?;

        let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
        tmp.write_all(json.as_bytes())?;
        tmp.flush()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.last_updated
    }
}

pub fn article_key(mode: DedupKey, title: &str, link: &str) -> String {
    match mode {
        DedupKey::Link => link.trim().to_string(),
        DedupKey::TitleLinkHash => {
            let mut hasher = Sha256::new();
            hasher.update(title.as_bytes());
            hasher.update(link.as_bytes());
            format!("{:x}", hasher.finalize())
        }
    }
}

/// RFC 3339, or the naive ISO form older runs wrote (taken as UTC).
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|naive| naive.and_utc())
        })
}

fn read_state(path: &Path) -> Result<Option<StoredState>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    if content.trim().is_empty() {
        return Ok(None);
    }
    Ok(Some(serde_json::from_str(&content)?))
}
