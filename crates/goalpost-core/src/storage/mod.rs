mod config;
pub mod goal_db;

pub use config::{CalendarConfig, Config, ReminderConfig, StorageConfig, WhatsAppConfig};
pub use goal_db::GoalDb;

use std::path::PathBuf;

/// Returns `$GOALPOST_DATA_DIR`, or `~/.config/goalpost[-dev]/` based on
/// GOALPOST_ENV.
///
/// Set GOALPOST_ENV=dev to use development data directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> std::io::Result<PathBuf> {
    let dir = match std::env::var_os("GOALPOST_DATA_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("GOALPOST_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("goalpost-dev")
            } else {
                base_dir.join("goalpost")
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
