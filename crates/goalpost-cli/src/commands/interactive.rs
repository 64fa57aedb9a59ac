use std::io::{BufRead, Write};

use chrono::Utc;
use clap::Args;
use goalpost_core::{Config, GoalDraft, GoalService, ParsedReminder, ReminderComposer, REPHRASE_HINT};

use super::{runtime, CommandResult};

#[derive(Args)]
pub struct InteractiveArgs {
    /// Store confirmed reminders as goals
    #[arg(long)]
    save: bool,
}

const BANNER: &str = "Natural Language Reminder Parser\n\
                      ==================================================\n\
                      Enter your reminder text (or 'quit' to exit)\n\
                      Example: 'remind me to call John in 2 hours'\n\
                      ==================================================";

fn print_reminder(
    out: &mut impl Write,
    reminder: &ParsedReminder,
    composer: &ReminderComposer,
    text: &str,
) -> std::io::Result<()> {
    writeln!(out, "\nParsed Reminder:")?;
    writeln!(out, "Title: {}", reminder.title())?;
    writeln!(out, "Start Time: {}", reminder.start_time().to_rfc3339())?;
    writeln!(out, "End Time: {}", reminder.end_time().to_rfc3339())?;
    writeln!(out, "Time Zone: {}", reminder.time_zone())?;
    writeln!(out, "Reminder: {} minutes before", reminder.reminder_lead_minutes())?;

    let entities = composer.entities(text);
    if !entities.is_empty() {
        writeln!(out, "\nDetected Entities:")?;
        for (label, values) in &entities {
            writeln!(out, "{label}: {}", values.join(", "))?;
        }
    }
    Ok(())
}

fn prompt(out: &mut impl Write, input: &mut impl BufRead, question: &str) -> std::io::Result<Option<String>> {
    write!(out, "{question}")?;
    out.flush()?;
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

/// Prompt loop over arbitrary input/output. Confirmed reminders are handed
/// to `on_confirm`.
pub fn session(
    composer: &ReminderComposer,
    input: &mut impl BufRead,
    out: &mut impl Write,
    mut on_confirm: impl FnMut(&ParsedReminder) -> Result<String, Box<dyn std::error::Error>>,
) -> CommandResult {
    writeln!(out, "{BANNER}")?;

    loop {
        let Some(text) = prompt(out, input, "\nEnter reminder text: ")? else {
            break;
        };
        if matches!(text.to_lowercase().as_str(), "quit" | "exit" | "q") {
            writeln!(out, "\nGoodbye!")?;
            break;
        }
        if text.is_empty() {
            writeln!(out, "Please enter a reminder text.")?;
            continue;
        }

        let reminder = match composer.compose(&text, &Utc::now()) {
            Ok(reminder) => reminder,
            Err(err) => {
                writeln!(out, "Error processing reminder: {err}")?;
                writeln!(out, "{REPHRASE_HINT}")?;
                continue;
            }
        };
        print_reminder(out, &reminder, composer, &text)?;

        let answer = prompt(out, input, "\nIs this correct? (y/n): ")?.unwrap_or_default();
        if answer.eq_ignore_ascii_case("y") || answer.eq_ignore_ascii_case("yes") {
            match on_confirm(&reminder) {
                Ok(message) => writeln!(out, "{message}")?,
                Err(err) => writeln!(out, "error: {err}")?,
            }
        } else {
            writeln!(out, "Please try rephrasing your reminder.")?;
        }
    }
    Ok(())
}

pub fn run(args: InteractiveArgs) -> CommandResult {
    let config = Config::load()?;
    let stdin = std::io::stdin();
    let mut input = stdin.lock();
    let mut out = std::io::stdout();

    if args.save {
        let service = GoalService::from_config(&config)?;
        let rt = runtime()?;
        let composer = service.composer().clone();
        session(&composer, &mut input, &mut out, |reminder| {
            let goal = rt.block_on(service.create(GoalDraft::from(reminder), Utc::now()))?;
            Ok(format!("Goal saved: {}", goal.goal_id))
        })
    } else {
        let composer = ReminderComposer::shared().with_defaults(config.reminder_defaults());
        session(&composer, &mut input, &mut out, |_| {
            Ok("Reminder parsed successfully!".to_string())
        })
    }
}
