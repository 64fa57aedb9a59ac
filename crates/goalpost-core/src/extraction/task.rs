//! Rule-based task extraction.
//!
//! Strips request phrasing and time expressions from a sentence and keeps
//! what is left as the task: "remind me to call John in 2 hours" becomes
//! "call John".

use std::sync::LazyLock;

use regex::Regex;

use super::traits::TaskExtractor;
use crate::error::ExtractionError;
use crate::parser::TimeExpressionResolver;

/// Upper bound on the extracted task, in characters.
pub const MAX_TASK_CHARS: usize = 64;

static REQUEST_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^\s*(?:please\s+)?(?:(?:can|could|would) you\s+)?(?:remind me\s+(?:to|about|that)\s+|remind me\b\s*|don'?t forget\b\s*(?:to\s+)?|i (?:need|have) to\s+)?(?:please\s+)?",
    )
    .expect("invalid request prefix pattern")
});

/// Extracts the task by deleting everything that is not the task.
#[derive(Debug, Clone)]
pub struct RuleTaskExtractor {
    max_chars: usize,
}

impl Default for RuleTaskExtractor {
    fn default() -> Self {
        Self {
            max_chars: MAX_TASK_CHARS,
        }
    }
}

impl RuleTaskExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_chars(max_chars: usize) -> Self {
        Self { max_chars }
    }
}

impl TaskExtractor for RuleTaskExtractor {
    fn extract_task(&self, text: &str) -> Result<String, ExtractionError> {
        let without_time = TimeExpressionResolver::strip_time_phrases(text);
        let collapsed = without_time.split_whitespace().collect::<Vec<_>>().join(" ");
        let body = REQUEST_PREFIX.replace(&collapsed, "");
        let task = body
            .trim()
            .trim_end_matches(|c: char| c.is_ascii_punctuation() || c.is_whitespace())
            .trim();

        let task = truncate_on_word(task, self.max_chars);
        if task.is_empty() {
            return Err(ExtractionError::EmptyTask);
        }
        Ok(task)
    }
}

/// Cuts `text` to at most `max_chars` characters, backing off to the last
/// whole word when the cut lands mid-word.
fn truncate_on_word(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars).collect();
    let next_is_break = text
        .chars()
        .nth(max_chars)
        .is_some_and(char::is_whitespace);
    let kept = match cut.rfind(char::is_whitespace) {
        Some(idx) if !next_is_break => &cut[..idx],
        _ => cut.as_str(),
    };
    kept.trim_end().to_string()
}
