use std::sync::Arc;

use goalpost_core::integrations::WhatsAppClient;
use goalpost_core::{ChatHandler, Config, ReminderComposer};

use super::{read_stdin, runtime, CommandResult};

/// Reads a WhatsApp webhook body from stdin, replies through the Cloud API
/// and prints the response envelope.
pub fn run() -> CommandResult {
    let config = Config::load()?;
    let sender = WhatsAppClient::from_config(&config.whatsapp)?;
    let composer = ReminderComposer::shared().with_defaults(config.reminder_defaults());
    let handler = ChatHandler::new(composer, Arc::new(sender));

    let body = read_stdin()?;
    let response = runtime()?.block_on(handler.handle_webhook(&body));
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
