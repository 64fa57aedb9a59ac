//! Goal lifecycle: compose, mirror to the calendar, persist.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{CoreError, Result};
use crate::goal::{created_date, Goal, GoalDraft, GoalField};
use crate::integrations::{CalendarEvent, CalendarSink, GoogleCalendar};
use crate::parser::ReminderComposer;
use crate::storage::{Config, GoalDb};

pub struct GoalService {
    db: GoalDb,
    composer: ReminderComposer,
    calendar: Option<Arc<dyn CalendarSink>>,
}

impl GoalService {
    pub fn new(db: GoalDb, composer: ReminderComposer) -> Self {
        Self {
            db,
            composer,
            calendar: None,
        }
    }

    /// Service wired from config: database location, reminder defaults and
    /// the calendar sink if enabled.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or the calendar is
    /// enabled without a token.
    pub fn from_config(config: &Config) -> Result<Self> {
        let db = GoalDb::open_at(&config.database_path()?)?;
        let composer = ReminderComposer::shared().with_defaults(config.reminder_defaults());
        let mut service = Self::new(db, composer);
        if let Some(calendar) = GoogleCalendar::from_config(&config.calendar)? {
            service = service.with_calendar(Arc::new(calendar));
        }
        Ok(service)
    }

    pub fn with_calendar(mut self, calendar: Arc<dyn CalendarSink>) -> Self {
        self.calendar = Some(calendar);
        self
    }

    pub fn composer(&self) -> &ReminderComposer {
        &self.composer
    }

    /// Compose a reminder from `text` and store it as a goal.
    ///
    /// # Errors
    /// Propagates composition, calendar and storage failures.
    pub async fn create_from_text<Tz: TimeZone>(
        &self,
        text: &str,
        now: &DateTime<Tz>,
    ) -> Result<Goal> {
        let reminder = self.composer.compose(text, now)?;
        self.create(GoalDraft::from(&reminder), now.with_timezone(&Utc))
            .await
    }

    /// Store a goal from a draft. When a calendar is configured the event is
    /// created first; if that fails nothing is stored.
    ///
    /// # Errors
    /// Returns a validation error for an empty time window, or the calendar
    /// or storage failure.
    pub async fn create(&self, draft: GoalDraft, now: DateTime<Utc>) -> Result<Goal> {
        draft.validate()?;

        let defaults = self.composer.defaults();
        let mut goal = Goal {
            goal_id: Uuid::new_v4().to_string(),
            title: draft.title,
            description: draft.description,
            start_time: draft.start_time,
            end_time: draft.end_time,
            time_zone: draft.time_zone.unwrap_or_else(|| defaults.time_zone.clone()),
            reminder: draft.reminder.unwrap_or(defaults.reminder_lead_minutes),
            created_date: created_date(now),
            calendar_event_id: None,
        };

        if let Some(calendar) = &self.calendar {
            let event_id = calendar
                .insert_event(&CalendarEvent::from(&goal))
                .await
                .inspect_err(|e| warn!(error = %e, sink = calendar.name(), "calendar insert failed"))?;
            goal.calendar_event_id = Some(event_id);
        }

        self.db.insert(&goal)?;
        info!(goal_id = %goal.goal_id, start = %goal.start_time, "goal saved");
        Ok(goal)
    }

    /// # Errors
    /// [`CoreError::NotFound`] if no goal has that id.
    pub fn get(&self, goal_id: &str) -> Result<Goal> {
        self.db
            .get(goal_id)?
            .ok_or_else(|| CoreError::NotFound(goal_id.to_string()))
    }

    pub fn list(&self) -> Result<Vec<Goal>> {
        self.db.list()
    }

    /// Change one field, returning the updated goal.
    ///
    /// # Errors
    /// Unknown keys and badly shaped values are validation errors; a missing
    /// goal is [`CoreError::NotFound`].
    pub fn update(&self, goal_id: &str, key: &str, value: &serde_json::Value) -> Result<Goal> {
        let field: GoalField = key.parse()?;
        let goal = self
            .db
            .update_field(goal_id, field, value)?
            .ok_or_else(|| CoreError::NotFound(goal_id.to_string()))?;
        info!(goal_id, field = %field, "goal updated");
        Ok(goal)
    }

    /// Remove a goal, returning it as it was stored.
    ///
    /// # Errors
    /// [`CoreError::NotFound`] if no goal has that id.
    pub fn delete(&self, goal_id: &str) -> Result<Goal> {
        let goal = self
            .db
            .delete(goal_id)?
            .ok_or_else(|| CoreError::NotFound(goal_id.to_string()))?;
        info!(goal_id, "goal deleted");
        Ok(goal)
    }
}
