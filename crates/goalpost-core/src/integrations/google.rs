//! Google Calendar sink.
//!
//! Inserts one event per goal through the Calendar v3 REST API using a
//! bearer token from the config file or `GOALPOST_GOOGLE_TOKEN`.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tracing::info;

use super::traits::{CalendarEvent, CalendarSink};
use crate::error::{ConfigError, CoreError, Result};
use crate::storage::CalendarConfig;

pub struct GoogleCalendar {
    client: Client,
    api_base: String,
    calendar_id: String,
    token: String,
}

impl GoogleCalendar {
    pub fn new(
        api_base: impl Into<String>,
        calendar_id: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
            calendar_id: calendar_id.into(),
            token: token.into(),
        }
    }

    /// Build from config. Returns `Ok(None)` when the sink is disabled.
    ///
    /// # Errors
    /// Returns an error if the sink is enabled but no token is available.
    pub fn from_config(config: &CalendarConfig) -> Result<Option<Self>> {
        if !config.enabled {
            return Ok(None);
        }
        let token = config
            .token()
            .ok_or_else(|| ConfigError::MissingKey("calendar.access_token".into()))?;
        Ok(Some(Self::new(&config.api_base, &config.calendar_id, token)))
    }

    fn events_url(&self) -> String {
        format!("{}/calendars/{}/events", self.api_base, self.calendar_id)
    }
}

fn event_body(event: &CalendarEvent) -> serde_json::Value {
    json!({
        "summary": event.summary,
        "description": event.description,
        "start": {
            "dateTime": event.start.to_rfc3339(),
            "timeZone": event.time_zone,
        },
        "end": {
            "dateTime": event.end.to_rfc3339(),
            "timeZone": event.time_zone,
        },
    })
}

#[async_trait]
impl CalendarSink for GoogleCalendar {
    fn name(&self) -> &str {
        "google"
    }

    async fn insert_event(&self, event: &CalendarEvent) -> Result<String> {
        let resp: serde_json::Value = self
            .client
            .post(self.events_url())
            .bearer_auth(&self.token)
            .json(&event_body(event))
            .send()
            .await?
            .json()
            .await?;

        if let Some(err) = resp.get("error") {
            return Err(CoreError::integration(
                self.name(),
                format!("Google Calendar API error: {err}"),
            ));
        }

        let event_id = resp["id"]
            .as_str()
            .ok_or_else(|| CoreError::integration(self.name(), "missing event id in response"))?
            .to_string();

        info!(event_id = %event_id, calendar = %self.calendar_id, "calendar event created");
        Ok(event_id)
    }
}
