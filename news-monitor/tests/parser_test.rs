mod common;

use chrono::{Duration, Utc};
use common::{rss_document, FixtureItem};
use news_monitor::types::Result;
use news_monitor::FeedParser;

#[test]
fn test_parse_rss_entries() -> Result<()> {
    common::init_tracing();
    let now = Utc::now();
    let doc = rss_document(&[
        FixtureItem::new(
            "China raises tariffs on EU goods",
            "https://news.example.com/tariffs",
            "<p>Beijing announced higher duties on European imports on Monday.</p>",
            Some(now - Duration::hours(3)),
        ),
        FixtureItem::new(
            "Hong Kong budget unveiled",
            "https://news.example.com/hk-budget",
            "The financial secretary presented the budget.",
            Some(now - Duration::hours(5)),
        ),
    ]);

    let entries = FeedParser::new(48).parse_feed(doc.as_bytes(), now)?;

    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].title, "China raises tariffs on EU goods");
    assert_eq!(entries[0].link, "https://news.example.com/tariffs");
    assert!(entries[0].summary.contains("higher duties"));
    assert_eq!(entries[1].link, "https://news.example.com/hk-budget");
    Ok(())
}

#[test]
fn test_missing_date_is_treated_as_fresh() -> Result<()> {
    let now = Utc::now();
    let doc = rss_document(&[FixtureItem::new(
        "Undated Xinhua item",
        "https://news.example.com/undated",
        "No date on this one.",
        None,
    )]);

    let parser = FeedParser::new(48);
    let entries = parser.parse_feed(doc.as_bytes(), now)?;
    assert_eq!(entries[0].published_at, now);

    let articles = parser.to_articles(entries, "Xinhua News", now);
    assert_eq!(articles.len(), 1);
    assert_eq!(articles[0].hours_ago, 0);
    assert_eq!(articles[0].source, "Xinhua News");
    Ok(())
}

#[test]
fn test_unparseable_date_is_treated_as_fresh() -> Result<()> {
    let now = Utc::now();
    let dated = (now - Duration::hours(6)).to_rfc2822();
    let doc = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0"><channel><title>Fixture Feed</title><link>https://news.example.com</link>
<description>Test feed</description>
<item><title>Garbled date</title><link>https://news.example.com/garbled</link>
<description>Date field is junk.</description><pubDate>not a date at all</pubDate></item>
<item><title>Good date</title><link>https://news.example.com/good</link>
<description>Date field is fine.</description><pubDate>{}</pubDate></item>
</channel></rss>"#,
        dated
    );

    let parser = FeedParser::new(48);
    let entries = parser.parse_feed(doc.as_bytes(), now)?;

    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].link, "https://news.example.com/garbled");
    assert_eq!(entries[0].published_at, now);
    assert!(entries[1].published_at < now);

    let articles = parser.to_articles(entries, "Fixture", now);
    assert_eq!(articles.len(), 2);
    assert_eq!(articles[0].hours_ago, 0);
    assert_eq!(articles[1].hours_ago, 6);
    Ok(())
}

#[test]
fn test_old_entries_are_filtered() -> Result<()> {
    let now = Utc::now();
    let doc = rss_document(&[
        FixtureItem::new("Recent", "https://news.example.com/recent", "", Some(now - Duration::hours(47))),
        FixtureItem::new("Stale", "https://news.example.com/stale", "", Some(now - Duration::hours(72))),
    ]);

    let parser = FeedParser::new(48);
    let articles = parser.to_articles(parser.parse_feed(doc.as_bytes(), now)?, "Fixture", now);

    assert_eq!(articles.len(), 1);
    assert_eq!(articles[0].title, "Recent");
    assert_eq!(articles[0].hours_ago, 47);

    let wide = FeedParser::new(24 * 7);
    let articles = wide.to_articles(wide.parse_feed(doc.as_bytes(), now)?, "Fixture", now);
    assert_eq!(articles.len(), 2);
    Ok(())
}

#[test]
fn test_duplicate_links_are_kept_once() -> Result<()> {
    let now = Utc::now();
    let doc = rss_document(&[
        FixtureItem::new("First", "https://news.example.com/same", "", Some(now)),
        FixtureItem::new("Second", "https://news.example.com/same", "", Some(now)),
        FixtureItem::new("Third", "https://news.example.com/other", "", Some(now)),
    ]);

    let entries = FeedParser::new(48).parse_feed(doc.as_bytes(), now)?;

    let titles: Vec<&str> = entries.iter().map(|e| e.title.as_str()).collect();
    assert_eq!(titles, vec!["First", "Third"]);
    Ok(())
}

#[test]
fn test_summaries_are_cleaned() -> Result<()> {
    let now = Utc::now();
    let doc = rss_document(&[FixtureItem::new(
        "Beijing unveils stimulus",
        "https://news.example.com/stimulus",
        "<p>The State Council approved a new fiscal stimulus package worth billions.</p><script>var x = 1;</script>",
        Some(now),
    )]);

    let parser = FeedParser::new(48);
    let articles = parser.to_articles(parser.parse_feed(doc.as_bytes(), now)?, "Fixture", now);

    assert_eq!(
        articles[0].cleaned_summary,
        "The State Council approved a new fiscal stimulus package worth billions."
    );
    Ok(())
}

#[test]
fn test_invalid_document_is_an_error() {
    let result = FeedParser::new(48).parse_feed(b"<html><body>Service unavailable</body></html>", Utc::now());
    assert!(result.is_err());
}
