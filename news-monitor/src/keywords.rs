use crate::types::{MonitorError, Result};
use regex::Regex;

/// An ordered list of terms, each matched on word boundaries.
///
/// Terms are expected in lower case and are matched against lower-cased text,
/// so "ai" never fires inside "shanghai" and "pla" never fires inside "plan".
#[derive(Debug, Clone)]
pub struct KeywordSet {
    terms: Vec<(String, Regex)>,
}

impl KeywordSet {
    pub fn new(terms: &[String]) -> Result<Self> {
        let mut compiled = Vec::with_capacity(terms.len());

        for term in terms {
            let term = term.trim().to_lowercase();
            if term.is_empty() || compiled.iter().any(|(existing, _)| *existing == term) {
                continue;
            }
            let pattern = format!(r"\b{}\b", regex::escape(&term));
            let regex = Regex::new(&pattern)
                .map_err(|e| MonitorError::Config(format!("bad keyword '{}': {}", term, e)))?;
            compiled.push((term, regex));
        }

        Ok(Self { terms: compiled })
    }

    /// Terms present in `text`, in configured order.
    pub fn matches<'a>(&'a self, text: &str) -> Vec<&'a str> {
        self.terms
            .iter()
            .filter(|(_, regex)| regex.is_match(text))
            .map(|(term, _)| term.as_str())
            .collect()
    }

    pub fn any_match(&self, text: &str) -> bool {
        self.terms.iter().any(|(_, regex)| regex.is_match(text))
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

/// Lower-cased "title summary" text that classifier and scorer both match against.
pub fn match_text(title: &str, summary: &str) -> String {
    format!("{} {}", title, summary).to_lowercase()
}
