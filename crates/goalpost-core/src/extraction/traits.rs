use std::collections::BTreeMap;

use crate::error::ExtractionError;

/// Entity category label (e.g. "PER", "TIME") to surface strings, in order
/// of appearance.
pub type EntityMap = BTreeMap<String, Vec<String>>;

/// Reduces a sentence to a short task phrase.
///
/// Any implementation that returns a reasonable short description will do:
/// truncation, keyword rules, or a learned summarizer behind a client.
pub trait TaskExtractor: Send + Sync {
    fn extract_task(&self, text: &str) -> Result<String, ExtractionError>;
}

/// Tags spans of a sentence with entity categories.
///
/// Callers treat this as best-effort enrichment; an error never blocks
/// reminder composition.
pub trait EntityExtractor: Send + Sync {
    fn extract_entities(&self, text: &str) -> Result<EntityMap, ExtractionError>;
}

impl<T: TaskExtractor + ?Sized> TaskExtractor for std::sync::Arc<T> {
    fn extract_task(&self, text: &str) -> Result<String, ExtractionError> {
        (**self).extract_task(text)
    }
}

impl<T: EntityExtractor + ?Sized> EntityExtractor for std::sync::Arc<T> {
    fn extract_entities(&self, text: &str) -> Result<EntityMap, ExtractionError> {
        (**self).extract_entities(text)
    }
}
