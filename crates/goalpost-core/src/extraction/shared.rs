//! Process-wide extractor instances and the serializing adapter.
//!
//! Extractors can be expensive to build (model weights, compiled pattern
//! tables), so the defaults are created on first use and then shared by
//! every composer in the process. They are never reset.

use std::sync::{Arc, LazyLock, Mutex};

use super::entities::PatternEntityExtractor;
use super::task::RuleTaskExtractor;
use super::traits::{EntityExtractor, EntityMap, TaskExtractor};
use crate::error::ExtractionError;

static TASK_EXTRACTOR: LazyLock<Arc<dyn TaskExtractor>> = LazyLock::new(|| {
    tracing::debug!("initializing shared task extractor");
    Arc::new(RuleTaskExtractor::new())
});

static ENTITY_EXTRACTOR: LazyLock<Arc<dyn EntityExtractor>> = LazyLock::new(|| {
    tracing::debug!("initializing shared entity extractor");
    Arc::new(PatternEntityExtractor::new())
});

/// The process-wide task extractor.
pub fn shared_task_extractor() -> Arc<dyn TaskExtractor> {
    Arc::clone(&TASK_EXTRACTOR)
}

/// The process-wide entity extractor.
pub fn shared_entity_extractor() -> Arc<dyn EntityExtractor> {
    Arc::clone(&ENTITY_EXTRACTOR)
}

/// Wraps an extractor that must not be called concurrently, so it can be
/// shared like any other. Calls are serialized through a mutex.
#[derive(Debug, Default)]
pub struct Serialized<E> {
    inner: Mutex<E>,
}

impl<E> Serialized<E> {
    pub fn new(inner: E) -> Self {
        Self {
            inner: Mutex::new(inner),
        }
    }
}

/// Capabilities whose calls need exclusive access (`&mut self`).
pub trait ExclusiveTaskExtractor: Send {
    fn extract_task(&mut self, text: &str) -> Result<String, ExtractionError>;
}

/// Entity counterpart of [`ExclusiveTaskExtractor`].
pub trait ExclusiveEntityExtractor: Send {
    fn extract_entities(&mut self, text: &str) -> Result<EntityMap, ExtractionError>;
}

impl<E: ExclusiveTaskExtractor> TaskExtractor for Serialized<E> {
    fn extract_task(&self, text: &str) -> Result<String, ExtractionError> {
        let mut guard = self.inner.lock().map_err(|_| ExtractionError::Poisoned)?;
        guard.extract_task(text)
    }
}

impl<E: ExclusiveEntityExtractor> EntityExtractor for Serialized<E> {
    fn extract_entities(&self, text: &str) -> Result<EntityMap, ExtractionError> {
        let mut guard = self.inner.lock().map_err(|_| ExtractionError::Poisoned)?;
        guard.extract_entities(text)
    }
}
