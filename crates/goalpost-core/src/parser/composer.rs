use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use tracing::{debug, warn};

use super::reminder::{event_duration, ParsedReminder, DEFAULT_REMINDER_LEAD_MINUTES, DEFAULT_TIME_ZONE};
use super::time_expr::TimeExpressionResolver;
use crate::error::ParseError;
use crate::extraction::{
    shared_entity_extractor, shared_task_extractor, EntityExtractor, EntityMap, TaskExtractor,
};

/// Deployment-level labels attached to every composed reminder. These are
/// never read from the input text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderDefaults {
    pub time_zone: String,
    pub reminder_lead_minutes: u32,
}

impl Default for ReminderDefaults {
    fn default() -> Self {
        Self {
            time_zone: DEFAULT_TIME_ZONE.to_string(),
            reminder_lead_minutes: DEFAULT_REMINDER_LEAD_MINUTES,
        }
    }
}

/// Builds [`ParsedReminder`]s from free text.
///
/// Extraction capabilities are injected; [`ReminderComposer::shared`] wires
/// the process-wide defaults.
#[derive(Clone)]
pub struct ReminderComposer {
    task_extractor: Arc<dyn TaskExtractor>,
    entity_extractor: Option<Arc<dyn EntityExtractor>>,
    resolver: TimeExpressionResolver,
    defaults: ReminderDefaults,
}

impl std::fmt::Debug for ReminderComposer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReminderComposer")
            .field("entity_extractor", &self.entity_extractor.is_some())
            .field("defaults", &self.defaults)
            .finish_non_exhaustive()
    }
}

impl ReminderComposer {
    pub fn new(task_extractor: Arc<dyn TaskExtractor>) -> Self {
        Self {
            task_extractor,
            entity_extractor: None,
            resolver: TimeExpressionResolver::new(),
            defaults: ReminderDefaults::default(),
        }
    }

    /// Composer backed by the process-wide default extractors.
    pub fn shared() -> Self {
        Self::new(shared_task_extractor()).with_entity_extractor(shared_entity_extractor())
    }

    pub fn with_entity_extractor(mut self, extractor: Arc<dyn EntityExtractor>) -> Self {
        self.entity_extractor = Some(extractor);
        self
    }

    pub fn with_defaults(mut self, defaults: ReminderDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn defaults(&self) -> &ReminderDefaults {
        &self.defaults
    }

    /// Compose a reminder from `text` relative to `now`.
    ///
    /// `now` is read once; clock phrases such as "at 9 am" are interpreted on
    /// the wall clock of `now`'s zone. The result is always in UTC.
    ///
    /// # Errors
    ///
    /// [`ParseError::TaskExtractionFailed`] when the task extractor fails or
    /// returns a blank task. Time phrases never cause an error.
    pub fn compose<Tz: TimeZone>(
        &self,
        text: &str,
        now: &DateTime<Tz>,
    ) -> Result<ParsedReminder, ParseError> {
        let task = self
            .task_extractor
            .extract_task(text)
            .map_err(ParseError::TaskExtractionFailed)?;
        let task = task.trim();
        if task.is_empty() {
            return Err(ParseError::TaskExtractionFailed(
                crate::error::ExtractionError::EmptyTask,
            ));
        }

        let offset = self.resolver.resolve(text, now);
        let start = now
            .clone()
            .checked_add_signed(offset)
            .ok_or(ParseError::TimeOutOfRange)?
            .with_timezone(&Utc);
        let end = start
            .checked_add_signed(event_duration())
            .ok_or(ParseError::TimeOutOfRange)?;

        debug!(task, start = %start, "composed reminder");
        Ok(ParsedReminder::new(
            task,
            text,
            start,
            end,
            &self.defaults.time_zone,
            self.defaults.reminder_lead_minutes,
        ))
    }

    /// Best-effort entity tagging. Extractor failures are logged and yield
    /// an empty map; composition is never affected.
    pub fn entities(&self, text: &str) -> EntityMap {
        let Some(extractor) = &self.entity_extractor else {
            return EntityMap::new();
        };
        match extractor.extract_entities(text) {
            Ok(entities) => entities,
            Err(err) => {
                warn!(error = %err, "entity extraction failed, continuing without entities");
                EntityMap::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExtractionError;
    use chrono::Duration;

    struct Fixed(&'static str);

    impl TaskExtractor for Fixed {
        fn extract_task(&self, _text: &str) -> Result<String, ExtractionError> {
            Ok(self.0.to_string())
        }
    }

    struct Failing;

    impl TaskExtractor for Failing {
        fn extract_task(&self, _text: &str) -> Result<String, ExtractionError> {
            Err(ExtractionError::Failed("model unavailable".into()))
        }
    }

    impl EntityExtractor for Failing {
        fn extract_entities(&self, _text: &str) -> Result<EntityMap, ExtractionError> {
            Err(ExtractionError::Failed("model unavailable".into()))
        }
    }

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn composes_relative_reminder() {
        let composer = ReminderComposer::new(Arc::new(Fixed("call John")));
        let now = at("2024-01-01T10:00:00Z");
        let reminder = composer.compose("remind me to call John in 2 hours", &now).unwrap();

        assert_eq!(reminder.title(), "Reminder: call John");
        assert_eq!(reminder.description(), "remind me to call John in 2 hours");
        assert_eq!(reminder.start_time(), at("2024-01-01T12:00:00Z"));
        assert_eq!(reminder.end_time(), at("2024-01-01T12:30:00Z"));
        assert_eq!(reminder.time_zone(), "America/Denver");
        assert_eq!(reminder.reminder_lead_minutes(), 5);
    }

    #[test]
    fn blank_task_is_rejected() {
        let composer = ReminderComposer::new(Arc::new(Fixed("   ")));
        let err = composer.compose("in 2 hours", &Utc::now()).unwrap_err();
        assert_eq!(err, ParseError::TaskExtractionFailed(ExtractionError::EmptyTask));
    }

    #[test]
    fn task_failure_propagates_unmodified() {
        let composer = ReminderComposer::new(Arc::new(Failing));
        let err = composer.compose("call mom tomorrow", &Utc::now()).unwrap_err();
        assert_eq!(
            err,
            ParseError::TaskExtractionFailed(ExtractionError::Failed("model unavailable".into()))
        );
    }

    #[test]
    fn entity_failure_is_swallowed() {
        let composer =
            ReminderComposer::new(Arc::new(Fixed("call mom"))).with_entity_extractor(Arc::new(Failing));
        assert!(composer.entities("call mom tomorrow").is_empty());
        assert!(composer.compose("call mom tomorrow", &Utc::now()).is_ok());
    }

    #[test]
    fn custom_defaults_are_applied() {
        let composer = ReminderComposer::new(Arc::new(Fixed("stretch"))).with_defaults(
            ReminderDefaults {
                time_zone: "Europe/Berlin".into(),
                reminder_lead_minutes: 15,
            },
        );
        let reminder = composer.compose("stretch", &Utc::now()).unwrap();
        assert_eq!(reminder.time_zone(), "Europe/Berlin");
        assert_eq!(reminder.reminder_lead_minutes(), 15);
    }

    #[test]
    fn start_near_end_of_time_is_out_of_range() {
        let composer = ReminderComposer::new(Arc::new(Fixed("wait")));
        let now = DateTime::<Utc>::MAX_UTC - Duration::minutes(10);
        assert_eq!(
            composer.compose("wait", &now).unwrap_err(),
            ParseError::TimeOutOfRange
        );
    }
}
