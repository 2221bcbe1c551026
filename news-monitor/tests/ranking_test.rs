mod common;

use chrono::{TimeZone, Utc};
use news_monitor::digest::{compose_digest, escape_html, subject_line};
use news_monitor::ranking::{group_by_category, rank};
use news_monitor::types::*;

fn scored(title: &str, importance: i64, relevance: i64, category: Category) -> ScoredArticle {
    let link = format!("https://news.example.com/{}", title.to_lowercase().replace(' ', "-"));
    ScoredArticle {
        article: common::article(title, &link, "A summary long enough to read."),
        classification: Classification {
            is_relevant: true,
            matched_keywords: vec!["china".into(), "trade".into(), "tariffs".into(), "talks".into()],
        },
        score: Score::new(importance, relevance, category, ScoringMethod::RuleBased),
    }
}

fn titles(articles: &[ScoredArticle]) -> Vec<&str> {
    articles.iter().map(|s| s.article.title.as_str()).collect()
}

#[test]
fn test_rank_orders_by_weighted_score() {
    let ranked = rank(vec![
        scored("Low", 5, 5, Category::Other),
        // 0.6 * 9 + 0.4 * 4 = 7.0
        scored("Important", 9, 4, Category::Trade),
        // 0.6 * 6 + 0.4 * 10 = 7.6
        scored("Relevant", 6, 10, Category::Economy),
    ]);

    assert_eq!(titles(&ranked), vec!["Relevant", "Important", "Low"]);
}

#[test]
fn test_rank_keeps_feed_order_on_ties() {
    let ranked = rank(vec![
        scored("First", 7, 7, Category::Trade),
        scored("Top", 10, 10, Category::Trade),
        scored("Second", 7, 7, Category::Politics),
        scored("Third", 7, 7, Category::Economy),
    ]);

    assert_eq!(titles(&ranked), vec!["Top", "First", "Second", "Third"]);
}

#[test]
fn test_groups_ordered_by_max_importance() {
    let ranked = rank(vec![
        scored("Trade A", 7, 10, Category::Trade),
        scored("HK A", 9, 4, Category::HongKong),
        scored("Trade B", 8, 6, Category::Trade),
        scored("Other A", 6, 6, Category::Other),
    ]);

    let groups = group_by_category(&ranked);
    let order: Vec<Category> = groups.iter().map(|g| g.category).collect();
    assert_eq!(order, vec![Category::HongKong, Category::Trade, Category::Other]);

    assert_eq!(groups[1].max_importance, 8);
    assert_eq!(titles(&groups[1].articles), vec!["Trade A", "Trade B"]);
}

#[test]
fn test_subject_line_format() {
    let now = Utc.with_ymd_and_hms(2025, 4, 9, 7, 30, 0).unwrap();
    assert_eq!(subject_line(3, now), "China Policy News Digest - 3 articles - 2025-04-09");
}

#[test]
fn test_digest_sections_and_text() {
    let now = Utc.with_ymd_and_hms(2025, 4, 9, 7, 30, 0).unwrap();
    let ranked = rank(vec![
        scored("Tariffs rise", 8, 7, Category::Trade),
        scored("LegCo vote", 9, 8, Category::HongKong),
    ]);

    let digest = compose_digest(&ranked, now);

    assert_eq!(digest.subject, "China Policy News Digest - 2 articles - 2025-04-09");
    assert!(digest.html.contains("Hong Kong (1)"));
    assert!(digest.html.contains("China-Trade (1)"));
    assert!(digest.html.find("Hong Kong (1)") < digest.html.find("China-Trade (1)"));
    assert!(digest.html.contains("Keywords: china, trade, tariffs, talks"));

    assert!(digest.text.starts_with("China Policy News Daily Digest - 2025-04-09"));
    assert!(digest.text.contains("== Hong Kong =="));
    assert!(digest.text.contains("Title: LegCo vote"));
    assert!(digest.text.contains("Link: https://news.example.com/legco-vote"));
    assert!(digest.text.contains("Importance: 9/10"));
    // Plain text lists only the first three keywords.
    assert!(digest.text.contains("Keywords: china, trade, tariffs\n"));
}

#[test]
fn test_digest_escapes_markup() {
    let now = Utc::now();
    let mut article = scored("Placeholder", 7, 7, Category::Politics);
    article.article.title = "Beijing <b>bold</b> & \"quoted\"".to_string();

    let digest = compose_digest(&[article], now);

    assert!(digest.html.contains("Beijing &lt;b&gt;bold&lt;/b&gt; &amp; &quot;quoted&quot;"));
    assert!(!digest.html.contains("<b>bold</b>"));
    assert_eq!(escape_html("a<b>&'c'"), "a&lt;b&gt;&amp;&#39;c&#39;");
}

#[test]
fn test_empty_digest() {
    let now = Utc.with_ymd_and_hms(2025, 4, 9, 7, 30, 0).unwrap();
    let digest = compose_digest(&[], now);

    assert_eq!(digest.subject, "China Policy News Digest - 0 articles - 2025-04-09");
    assert_eq!(digest.text, "No new China policy articles found today.");
    assert!(digest.html.contains("No new policy-related articles found today."));
}

#[test]
fn test_plain_text_block_layout() {
    let now = Utc.with_ymd_and_hms(2025, 4, 9, 7, 30, 0).unwrap();
    let digest = compose_digest(&[scored("Tariffs rise", 8, 7, Category::Trade)], now);

    assert_eq!(
        digest.text,
        "China Policy News Daily Digest - 2025-04-09\n\n\
         == China-Trade ==\n\n\
         Title: Tariffs rise\n\
         Source: Fixture\n\
         Link: https://news.example.com/tariffs-rise\n\
         Importance: 8/10  Relevance: 7/10  (rule scored)\n\
         Keywords: china, trade, tariffs\n\n"
    );
}
