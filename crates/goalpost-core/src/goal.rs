//! Goal records: a persisted reminder plus bookkeeping.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::parser::ParsedReminder;

/// A stored goal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    pub goal_id: String,
    pub title: String,
    pub description: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub time_zone: String,
    /// Minutes before `start_time` at which the reminder fires.
    pub reminder: u32,
    /// Creation day as `YYYYMMDD` (UTC).
    pub created_date: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calendar_event_id: Option<String>,
}

/// Input for creating a goal, either typed by a client or composed from text.
///
/// Missing `timeZone` and `reminder` are filled from the deployment defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalDraft {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[serde(default)]
    pub time_zone: Option<String>,
    #[serde(default)]
    pub reminder: Option<u32>,
}

impl GoalDraft {
    /// # Errors
    ///
    /// Returns a validation error for a blank title or an empty time window.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::InvalidValue {
                field: "title".into(),
                message: "must not be empty".into(),
            });
        }
        check_range(self.start_time, self.end_time)
    }
}

impl From<&ParsedReminder> for GoalDraft {
    fn from(reminder: &ParsedReminder) -> Self {
        Self {
            title: reminder.title().to_string(),
            description: reminder.description().to_string(),
            start_time: reminder.start_time(),
            end_time: reminder.end_time(),
            time_zone: Some(reminder.time_zone().to_string()),
            reminder: Some(reminder.reminder_lead_minutes()),
        }
    }
}

fn check_range(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<(), ValidationError> {
    if end <= start {
        return Err(ValidationError::InvalidTimeRange { start, end });
    }
    Ok(())
}

/// `YYYYMMDD` for the UTC day of `now`.
pub fn created_date(now: DateTime<Utc>) -> i64 {
    i64::from(now.year()) * 10_000 + i64::from(now.month()) * 100 + i64::from(now.day())
}

/// Fields a client may change after creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoalField {
    Title,
    Description,
    StartTime,
    EndTime,
    TimeZone,
    Reminder,
}

impl GoalField {
    pub const ALL: [GoalField; 6] = [
        GoalField::Title,
        GoalField::Description,
        GoalField::StartTime,
        GoalField::EndTime,
        GoalField::TimeZone,
        GoalField::Reminder,
    ];

    /// Wire name (camelCase, as serialized).
    pub fn as_str(self) -> &'static str {
        match self {
            GoalField::Title => "title",
            GoalField::Description => "description",
            GoalField::StartTime => "startTime",
            GoalField::EndTime => "endTime",
            GoalField::TimeZone => "timeZone",
            GoalField::Reminder => "reminder",
        }
    }
}

impl fmt::Display for GoalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GoalField {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.replace('_', "").to_ascii_lowercase();
        GoalField::ALL
            .into_iter()
            .find(|field| field.as_str().to_ascii_lowercase() == normalized)
            .ok_or_else(|| ValidationError::UnknownField(s.to_string()))
    }
}

fn invalid(field: GoalField, message: impl Into<String>) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.to_string(),
        message: message.into(),
    }
}

fn text_value(field: GoalField, value: &serde_json::Value) -> Result<String, ValidationError> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| invalid(field, "expected a string"))
}

fn time_value(field: GoalField, value: &serde_json::Value) -> Result<DateTime<Utc>, ValidationError> {
    let raw = text_value(field, value)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| invalid(field, format!("expected an RFC 3339 timestamp: {e}")))
}

impl Goal {
    /// Set one field from a JSON value. String inputs are accepted for
    /// `reminder` so command-line values work unchanged.
    ///
    /// # Errors
    ///
    /// Returns a validation error when the value has the wrong shape, or when
    /// a time change would leave `endTime <= startTime`. The goal is left
    /// untouched on error.
    pub fn apply(&mut self, field: GoalField, value: &serde_json::Value) -> Result<(), ValidationError> {
        match field {
            GoalField::Title => {
                let title = text_value(field, value)?;
                if title.trim().is_empty() {
                    return Err(invalid(field, "must not be empty"));
                }
                self.title = title;
            }
            GoalField::Description => self.description = text_value(field, value)?,
            GoalField::TimeZone => self.time_zone = text_value(field, value)?,
            GoalField::StartTime => {
                let start = time_value(field, value)?;
                check_range(start, self.end_time)?;
                self.start_time = start;
            }
            GoalField::EndTime => {
                let end = time_value(field, value)?;
                check_range(self.start_time, end)?;
                self.end_time = end;
            }
            GoalField::Reminder => {
                let minutes = match value {
                    serde_json::Value::Number(n) => n.as_u64(),
                    serde_json::Value::String(s) => s.trim().parse().ok(),
                    _ => None,
                };
                self.reminder = minutes
                    .and_then(|m| u32::try_from(m).ok())
                    .ok_or_else(|| invalid(field, "expected a non-negative number of minutes"))?;
            }
        }
        Ok(())
    }
}
