use clap::Args;
use goalpost_core::{Config, ReminderComposer};
use serde_json::json;

use super::{join_text, reference_time, CommandResult};

#[derive(Args)]
pub struct ParseArgs {
    /// Reminder text, e.g. "remind me to call John in 2 hours"
    #[arg(required = true)]
    text: Vec<String>,
    /// Reference time (RFC 3339) instead of the current instant
    #[arg(long)]
    now: Option<String>,
    /// Also print tagged entities
    #[arg(long)]
    entities: bool,
}

pub fn run(args: ParseArgs) -> CommandResult {
    let config = Config::load_or_default();
    let composer = ReminderComposer::shared().with_defaults(config.reminder_defaults());
    let text = join_text(&args.text);
    let now = reference_time(args.now.as_deref())?;

    let reminder = composer.compose(&text, &now)?;
    let output = if args.entities {
        json!({ "reminder": reminder, "entities": composer.entities(&text) })
    } else {
        serde_json::to_value(&reminder)?
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
