use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

/// Length of every composed reminder event.
pub const EVENT_DURATION_MINUTES: i64 = 30;

/// Lead time before the event at which the reminder fires.
pub const DEFAULT_REMINDER_LEAD_MINUTES: u32 = 5;

/// Zone label attached to composed reminders for display.
pub const DEFAULT_TIME_ZONE: &str = "America/Denver";

/// Prefix put in front of the extracted task.
pub const TITLE_PREFIX: &str = "Reminder";

pub fn event_duration() -> Duration {
    Duration::minutes(EVENT_DURATION_MINUTES)
}

/// A reminder derived from one sentence of free text.
///
/// Built once per `compose` call and never mutated afterwards; fields are
/// only readable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedReminder {
    title: String,
    description: String,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    time_zone: String,
    #[serde(rename = "reminder")]
    reminder_lead_minutes: u32,
}

impl ParsedReminder {
    pub(crate) fn new(
        task: &str,
        description: &str,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        time_zone: &str,
        reminder_lead_minutes: u32,
    ) -> Self {
        debug_assert!(end_time > start_time);
        Self {
            title: format!("{TITLE_PREFIX}: {task}"),
            description: description.to_string(),
            start_time,
            end_time,
            time_zone: time_zone.to_string(),
            reminder_lead_minutes,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// The original input text, verbatim.
    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    pub fn end_time(&self) -> DateTime<Utc> {
        self.end_time
    }

    pub fn time_zone(&self) -> &str {
        &self.time_zone
    }

    pub fn reminder_lead_minutes(&self) -> u32 {
        self.reminder_lead_minutes
    }
}
