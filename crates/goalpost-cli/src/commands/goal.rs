use clap::Subcommand;
use goalpost_core::{Config, GoalService};
use serde_json::Value;

use super::{join_text, reference_time, runtime, CommandResult};

#[derive(Subcommand)]
pub enum GoalAction {
    /// Create a goal from reminder text
    Create {
        /// Reminder text
        #[arg(required = true)]
        text: Vec<String>,
        /// Reference time (RFC 3339) instead of the current instant
        #[arg(long)]
        now: Option<String>,
    },
    /// Show one goal
    Get {
        /// Goal ID
        id: String,
    },
    /// List goals by start time
    List,
    /// Change one field of a goal
    Update {
        /// Goal ID
        id: String,
        /// Field: title, description, startTime, endTime, timeZone, reminder
        key: String,
        /// New value (JSON or plain text)
        value: String,
    },
    /// Delete a goal
    Delete {
        /// Goal ID
        id: String,
    },
}

/// Plain words are taken as strings; anything that parses as JSON is used as is.
fn update_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

fn print_json(value: &impl serde::Serialize) -> CommandResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn run(action: GoalAction) -> CommandResult {
    let config = Config::load()?;
    let service = GoalService::from_config(&config)?;

    match action {
        GoalAction::Create { text, now } => {
            let now = reference_time(now.as_deref())?;
            let text = join_text(&text);
            let goal = runtime()?.block_on(service.create_from_text(&text, &now))?;
            print_json(&goal)?;
        }
        GoalAction::Get { id } => print_json(&service.get(&id)?)?,
        GoalAction::List => print_json(&service.list()?)?,
        GoalAction::Update { id, key, value } => {
            let goal = service.update(&id, &key, &update_value(&value))?;
            print_json(&goal)?;
        }
        GoalAction::Delete { id } => {
            let goal = service.delete(&id)?;
            println!("Goal deleted: {}", goal.goal_id);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn update_values_accept_json_or_text() {
        assert_eq!(update_value("15"), json!(15));
        assert_eq!(update_value("\"15\""), json!("15"));
        assert_eq!(update_value("Reminder: call dad"), json!("Reminder: call dad"));
        assert_eq!(update_value("2024-01-02T10:00:00Z"), json!("2024-01-02T10:00:00Z"));
    }
}
