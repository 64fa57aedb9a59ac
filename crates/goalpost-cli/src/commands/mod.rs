pub mod api;
pub mod config;
pub mod goal;
pub mod interactive;
pub mod parse;
pub mod webhook;

use std::io::Read;

use chrono::{DateTime, Utc};

pub type CommandResult = Result<(), Box<dyn std::error::Error>>;

/// Multi-word positional text joined back into one sentence.
pub fn join_text(words: &[String]) -> String {
    words.join(" ")
}

/// `--now` override, or the current instant.
pub fn reference_time(now: Option<&str>) -> Result<DateTime<Utc>, Box<dyn std::error::Error>> {
    match now {
        Some(raw) => Ok(DateTime::parse_from_rfc3339(raw)
            .map_err(|e| format!("invalid --now '{raw}': {e}"))?
            .with_timezone(&Utc)),
        None => Ok(Utc::now()),
    }
}

pub fn read_stdin() -> Result<String, Box<dyn std::error::Error>> {
    let mut input = String::new();
    std::io::stdin().read_to_string(&mut input)?;
    Ok(input)
}

pub fn runtime() -> Result<tokio::runtime::Runtime, Box<dyn std::error::Error>> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("Failed to create runtime: {e}").into())
}
