//! Turns feed summaries (often HTML with embedded tracking snippets) into a
//! short plain-text excerpt.

use once_cell::sync::Lazy;
use regex::Regex;

pub const MAX_CLEANED_CHARS: usize = 800;
pub const FALLBACK_CHARS: usize = 300;
const MAX_SENTENCES: usize = 3;
const MIN_SENTENCE_CHARS: usize = 30;
const BOILERPLATE_TERMS: [&str; 4] = ["cookie", "subscribe", "newsletter", "advertisement"];

static BLOCK_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?is)<script\b.*?</script\s*>",
        r"(?is)<style\b.*?</style\s*>",
        r"(?s)<!--.*?-->",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<[^>]*>").unwrap());

static NOISE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"\b(?:var|let|const)\s+[A-Za-z_$][\w$]*\s*=\s*[^;]*;",
        r"\bwindow\.[A-Za-z_$][\w$.]*\s*=\s*[^;]*;",
        r"\b_gaq\.push\([^)]*\)\s*;?",
        r"\bdataLayer\.push\([^)]*\)\s*;?",
        r"@import\s+[^;]+;",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Clean a raw summary. The result never exceeds [`MAX_CLEANED_CHARS`]
/// characters and never contains `<` or `>`.
pub fn clean_summary(raw: &str) -> String {
    let text = strip_markup(raw);

    let kept: Vec<&str> = split_sentences(&text)
        .into_iter()
        .filter(|sentence| sentence.chars().count() > MIN_SENTENCE_CHARS)
        .filter(|sentence| !is_boilerplate(sentence))
        .take(MAX_SENTENCES)
        .collect();

    if kept.is_empty() {
        return truncate_chars(&text, FALLBACK_CHARS);
    }

    truncate_chars(&kept.join(" "), MAX_CLEANED_CHARS)
}

/// Remove scripts, tags and tracking noise, decode entities and collapse whitespace.
///
/// Markup is removed again after decoding, so escaped snippets such as
/// `&lt;script&gt;...&lt;/script&gt;` go the same way as literal ones.
pub fn strip_markup(raw: &str) -> String {
    let decoded = decode_entities(&remove_markup(raw));
    let text = remove_markup(&decoded);
    let without_delimiters: String = text.chars().filter(|c| *c != '<' && *c != '>').collect();

    WHITESPACE.replace_all(&without_delimiters, " ").trim().to_string()
}

fn remove_markup(raw: &str) -> String {
    let mut text = raw.to_string();

    for pattern in BLOCK_PATTERNS.iter() {
        text = pattern.replace_all(&text, " ").into_owned();
    }
    text = TAG.replace_all(&text, " ").into_owned();
    for pattern in NOISE_PATTERNS.iter() {
        text = pattern.replace_all(&text, " ").into_owned();
    }
    text
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&#160;", " ")
        .replace("&quot;", "\"")
        .replace("&#34;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&rsquo;", "'")
        .replace("&lsquo;", "'")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&mdash;", "-")
        .replace("&ndash;", "-")
        .replace("&hellip;", "...")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

/// Split on `.`, `!` or `?` when followed by whitespace or the end of text.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((idx, c)) = chars.next() {
        if !matches!(c, '.' | '!' | '?') {
            continue;
        }
        let at_boundary = match chars.peek() {
            None => true,
            Some((_, next)) => next.is_whitespace(),
        };
        if at_boundary {
            let end = idx + c.len_utf8();
            let sentence = text[start..end].trim();
            if !sentence.is_empty() {
                sentences.push(sentence);
            }
            start = end;
        }
    }

    let tail = text[start..].trim();
    if !tail.is_empty() {
        sentences.push(tail);
    }

    sentences
}

fn is_boilerplate(sentence: &str) -> bool {
    let lowered = sentence.to_lowercase();
    BOILERPLATE_TERMS.iter().any(|term| lowered.contains(term))
}

/// Truncate on a character boundary.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => text[..byte_idx].to_string(),
        None => text.to_string(),
    }
}
