use goalpost_core::{handle_request, ApiRequest, ApiResponse, Config, GoalService};
use tracing::warn;

use super::{read_stdin, runtime, CommandResult};

/// Reads a proxy envelope from stdin and prints the response envelope.
pub fn run() -> CommandResult {
    let raw = read_stdin()?;
    let response = match serde_json::from_str::<ApiRequest>(&raw) {
        Ok(request) => {
            let config = Config::load()?;
            let service = GoalService::from_config(&config)?;
            runtime()?.block_on(handle_request(&service, &request))
        }
        Err(err) => {
            warn!(error = %err, "unreadable request envelope");
            ApiResponse::internal_error()
        }
    };
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
