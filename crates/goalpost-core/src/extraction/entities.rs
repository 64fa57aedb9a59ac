//! Pattern-based entity tagging.
//!
//! A lightweight stand-in for a learned NER model: contact details are found
//! with regexes, time phrases with the resolver's own table, and names with
//! a capitalization heuristic.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use super::traits::{EntityExtractor, EntityMap};
use crate::error::ExtractionError;
use crate::parser::TimeExpressionResolver;

pub const PERSON: &str = "PER";
pub const ORGANIZATION: &str = "ORG";
pub const LOCATION: &str = "LOC";
pub const EMAIL: &str = "EMAIL";
pub const URL: &str = "URL";
pub const PHONE: &str = "PHONE";
pub const TIME: &str = "TIME";

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").expect("Invalid email regex")
});

static URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:https?://|www\.)[^\s<>\[\]()]+").expect("Invalid URL regex")
});

static PHONE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:\+\d{1,3}[-.\s]?)?(?:\(\d{3}\)|\d{3})[-.\s]?\d{3}[-.\s]?\d{4}\b")
        .expect("Invalid phone regex")
});

static NAME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[A-Z][a-zA-Z'-]+(?:\s+[A-Z][a-zA-Z'-]+){0,3}\.?").expect("Invalid name regex")
});

const ORG_SUFFIXES: &[&str] = &[
    "Inc", "Inc.", "LLC", "Ltd", "Ltd.", "Corp", "Corp.", "Co", "Co.", "Company", "Group",
    "Bank", "University", "Team",
];

const LOCATION_SUFFIXES: &[&str] = &[
    "Street", "St.", "Avenue", "Ave.", "Road", "Rd.", "Park", "Airport", "Station", "Hospital",
    "Mall", "City",
];

/// Capitalized words that start sentences or name dates, not people.
const NOT_NAMES: &[&str] = &[
    "I", "The", "This", "That", "Remind", "Reminder", "Please", "Call", "Email", "Text",
    "Meet", "Buy", "Pick", "Book", "Pay", "Send", "Check", "Take", "Don't", "Dont", "Tomorrow",
    "Today", "Next", "At", "In", "On", "Monday", "Tuesday", "Wednesday", "Thursday", "Friday",
    "Saturday", "Sunday", "Can", "Could", "Would", "Hi", "Hello",
];

/// Tags contact details, time phrases and capitalized names.
#[derive(Debug, Clone)]
pub struct PatternEntityExtractor {
    not_names: HashSet<&'static str>,
}

impl Default for PatternEntityExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl PatternEntityExtractor {
    pub fn new() -> Self {
        Self {
            not_names: NOT_NAMES.iter().copied().collect(),
        }
    }

    fn classify(&self, run: &str) -> Option<(&'static str, String)> {
        let words: Vec<&str> = run.split_whitespace().collect();
        let last = *words.last()?;

        if ORG_SUFFIXES.contains(&last) && words.len() > 1 {
            return Some((ORGANIZATION, run.to_string()));
        }
        if LOCATION_SUFFIXES.contains(&last) && words.len() > 1 {
            return Some((LOCATION, run.to_string()));
        }

        // Leading verbs and pronouns are not part of a name: "Call John" -> "John".
        let name: Vec<&str> = words
            .iter()
            .map(|w| w.trim_end_matches('.'))
            .skip_while(|w| self.not_names.contains(w))
            .collect();
        if name.is_empty() || name.iter().any(|w| self.not_names.contains(w)) {
            return None;
        }
        Some((PERSON, name.join(" ")))
    }
}

fn push(map: &mut EntityMap, label: &str, value: String) {
    map.entry(label.to_string()).or_default().push(value);
}

impl EntityExtractor for PatternEntityExtractor {
    fn extract_entities(&self, text: &str) -> Result<EntityMap, ExtractionError> {
        let mut entities = EntityMap::new();
        let mut claimed: Vec<(usize, usize)> = Vec::new();

        for m in EMAIL_PATTERN.find_iter(text) {
            claimed.push((m.start(), m.end()));
            push(&mut entities, EMAIL, m.as_str().to_string());
        }
        for m in URL_PATTERN.find_iter(text) {
            let url = m.as_str().trim_end_matches(&['.', ',', '!', '?'][..]);
            claimed.push((m.start(), m.start() + url.len()));
            push(&mut entities, URL, url.to_string());
        }
        for m in PHONE_PATTERN.find_iter(text) {
            if claimed.iter().any(|&(s, e)| m.start() < e && s < m.end()) {
                continue;
            }
            claimed.push((m.start(), m.end()));
            push(&mut entities, PHONE, m.as_str().to_string());
        }
        for phrase in TimeExpressionResolver::find_time_phrases(text) {
            push(&mut entities, TIME, phrase);
        }

        for m in NAME_PATTERN.find_iter(text) {
            if claimed.iter().any(|&(s, e)| m.start() < e && s < m.end()) {
                continue;
            }
            if let Some((label, value)) = self.classify(m.as_str()) {
                push(&mut entities, label, value);
            }
        }

        Ok(entities)
    }
}
