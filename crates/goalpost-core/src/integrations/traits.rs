use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::goal::Goal;

/// A calendar entry mirrored from a goal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarEvent {
    pub summary: String,
    pub description: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// IANA zone label passed through to the calendar.
    pub time_zone: String,
}

impl From<&Goal> for CalendarEvent {
    fn from(goal: &Goal) -> Self {
        Self {
            summary: goal.title.clone(),
            description: goal.description.clone(),
            start: goal.start_time,
            end: goal.end_time,
            time_zone: goal.time_zone.clone(),
        }
    }
}

/// Somewhere new goals are mirrored as calendar events.
#[async_trait]
pub trait CalendarSink: Send + Sync {
    /// Unique identifier (e.g. "google").
    fn name(&self) -> &str;

    /// Create the event and return the id the calendar assigned to it.
    async fn insert_event(&self, event: &CalendarEvent) -> Result<String>;
}

/// Outbound text channel for chat replies.
#[async_trait]
pub trait MessageSender: Send + Sync {
    fn name(&self) -> &str;

    /// Deliver `body` to the recipient `to` (channel-specific address).
    async fn send_text(&self, to: &str, body: &str) -> Result<()>;
}
