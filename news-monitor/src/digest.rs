use crate::ranking::{group_by_category, CategoryGroup};
use crate::types::{ScoredArticle, ScoringMethod};
use chrono::{DateTime, Utc};
use tracing::debug;

const MAX_KEYWORDS_HTML: usize = 5;
const MAX_KEYWORDS_TEXT: usize = 3;

#[derive(Debug, Clone)]
pub struct Digest {
    pub subject: String,
    pub html: String,
    pub text: String,
}

pub fn subject_line(count: usize, now: DateTime<Utc>) -> String {
    format!(
        "China Policy News Digest - {} articles - {}",
        count,
        now.format("%Y-%m-%d")
    )
}

/// Render ranked articles into an email digest.
pub fn compose_digest(ranked: &[ScoredArticle], now: DateTime<Utc>) -> Digest {
    let groups = group_by_category(ranked);
    debug!("Composing digest: {} articles in {} groups", ranked.len(), groups.len());

    Digest {
        subject: subject_line(ranked.len(), now),
        html: render_html(&groups, ranked.len(), now),
        text: render_text(&groups, now),
    }
}

fn render_html(groups: &[CategoryGroup], count: usize, now: DateTime<Utc>) -> String {
    let generated = now.format("%Y-%m-%d %H:%M:%S UTC");
    let mut html = String::new();

    html.push_str(
        r#"<html>
<head>
<style>
  body { font-family: Arial, sans-serif; max-width: 800px; margin: 0 auto; }
  .header { background-color: #c41e3a; color: white; padding: 20px; text-align: center; }
  h2.category { border-bottom: 2px solid #c41e3a; color: #c41e3a; padding-top: 10px; }
  .article { border-bottom: 1px solid #eee; padding: 16px 0; }
  .title { font-size: 18px; font-weight: bold; margin-bottom: 8px; }
  .meta { color: #666; font-size: 12px; margin-bottom: 8px; }
  .description { margin-bottom: 8px; line-height: 1.5; }
  .keywords { background-color: #f0f0f0; padding: 5px; border-radius: 3px; font-size: 11px; }
  a { color: #c41e3a; text-decoration: none; }
</style>
</head>
<body>
"#,
    );

    html.push_str(&format!(
        "<div class=\"header\"><h1>China Policy News Digest</h1><p>Generated on: {}</p><p>Found {} policy-related articles</p></div>\n",
        generated, count
    ));

    if groups.is_empty() {
        html.push_str("<p><em>No new policy-related articles found today.</em></p>\n");
    }

    for group in groups {
        html.push_str(&format!(
            "<h2 class=\"category\">{} ({})</h2>\n",
            escape_html(group.category.label()),
            group.articles.len()
        ));

        for scored in &group.articles {
            let article = &scored.article;
            let score = &scored.score;
            let keywords = scored
                .classification
                .matched_keywords
                .iter()
                .take(MAX_KEYWORDS_HTML)
                .cloned()
                .collect::<Vec<_>>()
                .join(", ");

            html.push_str(&format!(
                "<div class=\"article\">\n<div class=\"title\"><a href=\"{}\" target=\"_blank\">{}</a></div>\n",
                escape_html(&article.link),
                escape_html(&article.title)
            ));
            html.push_str(&format!(
                "<div class=\"meta\"><b>{}</b> | {} ({}h ago) | Importance {}/10 | Relevance {}/10 | {}</div>\n",
                escape_html(&article.source),
                article.published_at.format("%Y-%m-%d %H:%M"),
                article.hours_ago,
                score.importance,
                score.relevance,
                method_label(score.method)
            ));

            let description = score
                .insight
                .as_ref()
                .and_then(|i| i.summary.as_deref())
                .unwrap_or(&article.cleaned_summary);
            if !description.is_empty() {
                html.push_str(&format!("<div class=\"description\">{}</div>\n", escape_html(description)));
            }

            if let Some(insight) = &score.insight {
                if !insight.key_points.is_empty() {
                    html.push_str("<ul>\n");
                    for point in &insight.key_points {
                        html.push_str(&format!("<li>{}</li>\n", escape_html(point)));
                    }
                    html.push_str("</ul>\n");
                }
            }

            if !keywords.is_empty() {
                html.push_str(&format!("<div class=\"keywords\">Keywords: {}</div>\n", escape_html(&keywords)));
            }
            html.push_str("</div>\n");
        }
    }

    html.push_str(
        "<div style=\"text-align: center; padding: 20px; color: #666; font-size: 12px;\">\
         <p>This digest was automatically generated by China Policy News Monitor</p></div>\n\
         </body>\n</html>\n",
    );
    html
}

fn render_text(groups: &[CategoryGroup], now: DateTime<Utc>) -> String {
    if groups.is_empty() {
        return "No new China policy articles found today.".to_string();
    }

    let mut text = format!("China Policy News Daily Digest - {}\n\n", now.format("%Y-%m-%d"));

    for group in groups {
        text.push_str(&format!("== {} ==\n\n", group.category.label()));
        for scored in &group.articles {
            let article = &scored.article;
            text.push_str(&format!("Title: {}\n", article.title));
            text.push_str(&format!("Source: {}\n", article.source));
            text.push_str(&format!("Link: {}\n", article.link));
            text.push_str(&format!(
                "Importance: {}/10  Relevance: {}/10  ({})\n",
                scored.score.importance,
                scored.score.relevance,
                method_label(scored.score.method)
            ));
            let keywords: Vec<&str> = scored
                .classification
                .matched_keywords
                .iter()
                .take(MAX_KEYWORDS_TEXT)
                .map(String::as_str)
                .collect();
            if !keywords.is_empty() {
                text.push_str(&format!("Keywords: {}\n", keywords.join(", ")));
            }
            text.push('\n');
        }
    }

    text
}

fn method_label(method: ScoringMethod) -> &'static str {
    match method {
        ScoringMethod::Ai => "AI scored",
        ScoringMethod::RuleBased => "rule scored",
    }
}

pub fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
