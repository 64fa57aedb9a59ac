//! Chat webhook glue.
//!
//! An inbound chat message is composed into a reminder and the parsed
//! fields are sent back for the user to confirm.

use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::api::ApiResponse;
use crate::error::{CoreError, WebhookError};
use crate::integrations::MessageSender;
use crate::parser::{ParsedReminder, ReminderComposer};

/// Sent when a message cannot be turned into a reminder.
pub const REPHRASE_HINT: &str = "Sorry, I couldn't process that reminder. \
     Please try rephrasing it like: 'remind me to call John in 2 hours'";

#[derive(Debug, Deserialize)]
struct WebhookPayload {
    #[serde(default)]
    entry: Vec<WebhookEntry>,
}

#[derive(Debug, Deserialize)]
struct WebhookEntry {
    #[serde(default)]
    changes: Vec<WebhookChange>,
}

#[derive(Debug, Deserialize)]
struct WebhookChange {
    value: ChangeValue,
}

#[derive(Debug, Deserialize)]
struct ChangeValue {
    #[serde(default)]
    messages: Vec<WebhookMessage>,
}

#[derive(Debug, Deserialize)]
struct WebhookMessage {
    from: String,
    text: Option<TextBody>,
}

#[derive(Debug, Deserialize)]
struct TextBody {
    body: String,
}

/// The first text message of a webhook delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingMessage {
    pub from: String,
    pub text: String,
}

/// Pull the sender and text out of a WhatsApp Cloud webhook body.
///
/// # Errors
/// Returns an error for invalid JSON or when any level of
/// `entry[0].changes[0].value.messages[0].text.body` is missing.
pub fn parse_webhook(body: &str) -> Result<IncomingMessage, WebhookError> {
    let payload: WebhookPayload = serde_json::from_str(body)?;
    let message = payload
        .entry
        .into_iter()
        .next()
        .ok_or(WebhookError::MissingField("entry"))?
        .changes
        .into_iter()
        .next()
        .ok_or(WebhookError::MissingField("changes"))?
        .value
        .messages
        .into_iter()
        .next()
        .ok_or(WebhookError::MissingField("messages"))?;
    let text = message.text.ok_or(WebhookError::MissingField("text"))?;
    Ok(IncomingMessage {
        from: message.from,
        text: text.body,
    })
}

/// Confirmation text listing the parsed fields.
pub fn format_confirmation(reminder: &ParsedReminder) -> String {
    format!(
        "I've parsed your reminder:\n\
         Title: {}\n\
         Start Time: {}\n\
         Time Zone: {}\n\
         Reminder set for: {} minutes before\n\n\
         Is this correct? Reply with 'yes' to confirm or 'no' to try again.",
        reminder.title(),
        reminder.start_time().to_rfc3339_opts(SecondsFormat::Secs, true),
        reminder.time_zone(),
        reminder.reminder_lead_minutes(),
    )
}

fn failure(err: &dyn std::fmt::Display) -> ApiResponse {
    ApiResponse::new(
        500,
        &json!({ "status": "Error processing message", "error": err.to_string() }),
    )
}

pub struct ChatHandler {
    composer: ReminderComposer,
    sender: Arc<dyn MessageSender>,
}

impl ChatHandler {
    pub fn new(composer: ReminderComposer, sender: Arc<dyn MessageSender>) -> Self {
        Self { composer, sender }
    }

    /// Compose `text` and reply to `from` with either a confirmation or a
    /// rephrase hint.
    ///
    /// # Errors
    /// Returns the composition error (after the hint was sent) or the
    /// delivery failure.
    pub async fn process_message<Tz: TimeZone>(
        &self,
        from: &str,
        text: &str,
        now: &DateTime<Tz>,
    ) -> Result<ParsedReminder, CoreError> {
        let entities = self.composer.entities(text);
        debug!(?entities, "tagged chat message");

        match self.composer.compose(text, now) {
            Ok(reminder) => {
                self.sender
                    .send_text(from, &format_confirmation(&reminder))
                    .await?;
                info!(from, title = reminder.title(), "confirmation sent");
                Ok(reminder)
            }
            Err(err) => {
                if let Err(send_err) = self.sender.send_text(from, REPHRASE_HINT).await {
                    warn!(error = %send_err, "could not deliver rephrase hint");
                }
                Err(err.into())
            }
        }
    }

    /// Handle one webhook delivery at the current instant.
    pub async fn handle_webhook(&self, body: &str) -> ApiResponse {
        self.handle_webhook_at(body, &Utc::now()).await
    }

    pub async fn handle_webhook_at<Tz: TimeZone>(&self, body: &str, now: &DateTime<Tz>) -> ApiResponse {
        let message = match parse_webhook(body) {
            Ok(message) => message,
            Err(err) => {
                warn!(error = %err, "rejected webhook payload");
                return failure(&err);
            }
        };

        match self.process_message(&message.from, &message.text, now).await {
            Ok(_) => ApiResponse::new(200, &json!({ "status": "Message processed" })),
            Err(err) => failure(&err),
        }
    }
}
