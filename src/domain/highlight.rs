//! Regex live-tester: split a test string into matched and unmatched runs
//! without involving the model.

use regex::Regex;
use serde::Serialize;

use super::errors::{DomainError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    pub text: String,
    pub is_match: bool,
}

impl Segment {
    fn plain(text: &str) -> Self {
        Self {
            text: text.to_string(),
            is_match: false,
        }
    }

    fn matched(text: &str) -> Self {
        Self {
            text: text.to_string(),
            is_match: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Highlight {
    pub segments: Vec<Segment>,
    /// Set when the pattern failed to compile; `segments` is then the whole
    /// text as one unmatched run.
    pub pattern_error: Option<String>,
}

impl Highlight {
    pub fn match_count(&self) -> usize {
        self.segments.iter().filter(|s| s.is_match).count()
    }

    pub fn check(&self) -> Result<()> {
        match &self.pattern_error {
            Some(msg) => Err(DomainError::Pattern(msg.clone())),
            None => Ok(()),
        }
    }

    pub fn reconstruct(&self) -> String {
        self.segments.iter().map(|s| s.text.as_str()).collect()
    }
}

/// Every non-overlapping, non-empty match of `pattern` in `text`, in order,
/// interleaved with the text between them. Case-sensitive, unanchored.
/// Zero-width matches produce no segment.
pub fn highlight(pattern: &str, text: &str) -> Highlight {
    let re = match Regex::new(pattern) {
        Ok(re) => re,
        Err(e) => {
            return Highlight {
                segments: vec![Segment::plain(text)],
                pattern_error: Some(e.to_string()),
            }
        }
    };

    let mut segments = Vec::new();
    let mut cursor = 0;
    for m in re.find_iter(text) {
        if m.start() == m.end() {
            continue;
        }
        if m.start() > cursor {
            segments.push(Segment::plain(&text[cursor..m.start()]));
        }
        segments.push(Segment::matched(m.as_str()));
        cursor = m.end();
    }
    if cursor < text.len() {
        segments.push(Segment::plain(&text[cursor..]));
    }

    Highlight {
        segments,
        pattern_error: None,
    }
}
