#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use news_monitor::config::MonitorConfig;
use news_monitor::types::{Article, FeedKind, FeedSpec, MonitorError, Result};
use news_monitor::{DigestSender, FeedSource};
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

static INIT: Once = Once::new();

pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

pub struct FixtureItem {
    pub title: String,
    pub link: String,
    pub description: String,
    pub published: Option<DateTime<Utc>>,
}

impl FixtureItem {
    pub fn new(title: &str, link: &str, description: &str, published: Option<DateTime<Utc>>) -> Self {
        Self {
            title: title.to_string(),
            link: link.to_string(),
            description: description.to_string(),
            published,
        }
    }
}

fn xml_escape(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

pub fn rss_document(items: &[FixtureItem]) -> String {
    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<rss version=\"2.0\"><channel>\
         <title>Fixture Feed</title><link>https://news.example.com</link>\
         <description>Test feed</description>\n",
    );
    for item in items {
        xml.push_str("<item>");
        xml.push_str(&format!("<title>{}</title>", xml_escape(&item.title)));
        xml.push_str(&format!("<link>{}</link>", xml_escape(&item.link)));
        xml.push_str(&format!("<guid>{}</guid>", xml_escape(&item.link)));
        xml.push_str(&format!("<description>{}</description>", xml_escape(&item.description)));
        if let Some(published) = item.published {
            xml.push_str(&format!("<pubDate>{}</pubDate>", published.to_rfc2822()));
        }
        xml.push_str("</item>\n");
    }
    xml.push_str("</channel></rss>\n");
    xml
}

/// Serves canned documents by URL; unknown URLs fail like a dead host.
#[derive(Clone, Default)]
pub struct StaticFeedSource {
    documents: Arc<Mutex<HashMap<String, String>>>,
    requests: Arc<Mutex<Vec<String>>>,
}

impl StaticFeedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn serve(&self, url: &str, document: String) {
        self.documents.lock().unwrap().insert(url.to_string(), document);
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl FeedSource for StaticFeedSource {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        self.requests.lock().unwrap().push(url.to_string());
        self.documents
            .lock()
            .unwrap()
            .get(url)
            .map(|doc| doc.clone().into_bytes())
            .ok_or_else(|| MonitorError::General(format!("connection refused: {}", url)))
    }
}

#[derive(Debug, Clone)]
pub struct SentDigest {
    pub subject: String,
    pub html: String,
    pub text: String,
}

#[derive(Clone)]
pub struct RecordingSender {
    sent: Arc<Mutex<Vec<SentDigest>>>,
    succeed: bool,
}

impl RecordingSender {
    pub fn new() -> Self {
        Self {
            sent: Arc::new(Mutex::new(Vec::new())),
            succeed: true,
        }
    }

    pub fn failing() -> Self {
        Self {
            sent: Arc::new(Mutex::new(Vec::new())),
            succeed: false,
        }
    }

    pub fn sent(&self) -> Vec<SentDigest> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl DigestSender for RecordingSender {
    async fn send(&self, subject: &str, html: &str, text: &str) -> bool {
        self.sent.lock().unwrap().push(SentDigest {
            subject: subject.to_string(),
            html: html.to_string(),
            text: text.to_string(),
        });
        self.succeed
    }
}

/// Default config with no network-backed scorers, no delays and the given state file.
pub fn test_config(state_file: &Path, feeds: Vec<FeedSpec>) -> MonitorConfig {
    let mut config = MonitorConfig::default();
    config.feeds = feeds;
    config.fetch.feed_delay = Duration::ZERO;
    config.dedup.state_file = state_file.to_path_buf();
    config.scorer.remote = None;
    config.scorer.local = None;
    config
}

pub fn feed(name: &str, url: &str) -> FeedSpec {
    FeedSpec::new(name, url, FeedKind::News)
}

pub fn article(title: &str, link: &str, summary: &str) -> Article {
    Article {
        title: title.to_string(),
        link: link.to_string(),
        raw_summary: summary.to_string(),
        cleaned_summary: summary.to_string(),
        published_at: Utc::now(),
        source: "Fixture".to_string(),
        hours_ago: 0,
    }
}

/// Minimal HTTP endpoint standing in for a model server. Every request gets
/// the same status and JSON body; requests are counted.
pub struct MockModelServer {
    pub url: String,
    hits: Arc<AtomicUsize>,
}

impl MockModelServer {
    pub async fn start(status: u16, body: String) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/", listener.local_addr().unwrap());
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();

        tokio::spawn(async move {
            while let Ok((mut stream, _)) = listener.accept().await {
                let counter = counter.clone();
                let body = body.clone();
                tokio::spawn(async move {
                    read_request(&mut stream).await;
                    counter.fetch_add(1, Ordering::SeqCst);
                    let response = format!(
                        "HTTP/1.1 {} Mock\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                        status,
                        body.len(),
                        body
                    );
                    let _ = stream.write_all(response.as_bytes()).await;
                    let _ = stream.shutdown().await;
                });
            }
        });

        Self { url, hits }
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

/// Read headers and a `Content-Length` body so the client sees a clean exchange.
async fn read_request(stream: &mut TcpStream) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
        match stream.read(&mut chunk).await {
            Ok(0) | Err(_) => return,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    };

    let headers = String::from_utf8_lossy(&buf[..header_end]).to_lowercase();
    let content_length = headers
        .lines()
        .find_map(|line| line.strip_prefix("content-length:"))
        .and_then(|value| value.trim().parse::<usize>().ok())
        .unwrap_or(0);

    while buf.len() < header_end + content_length {
        match stream.read(&mut chunk).await {
            Ok(0) | Err(_) => return,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }
}
