//! TOML-based application configuration.
//!
//! Stores deployment settings:
//! - Reminder defaults (time zone label, lead minutes)
//! - Google Calendar sink
//! - WhatsApp sender
//! - Database location
//!
//! Configuration is stored at `<data_dir>/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::error::ConfigError;
use crate::parser::{ReminderDefaults, DEFAULT_REMINDER_LEAD_MINUTES, DEFAULT_TIME_ZONE};

/// Overrides `calendar.access_token` when set.
pub const GOOGLE_TOKEN_ENV: &str = "GOALPOST_GOOGLE_TOKEN";
/// Overrides `whatsapp.access_token` when set.
pub const WHATSAPP_TOKEN_ENV: &str = "GOALPOST_WHATSAPP_TOKEN";

/// Labels attached to every composed reminder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderConfig {
    #[serde(default = "default_time_zone")]
    pub time_zone: String,
    #[serde(default = "default_lead_minutes")]
    pub reminder_lead_minutes: u32,
}

/// Google Calendar sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_calendar_id")]
    pub calendar_id: String,
    #[serde(default = "default_calendar_api_base")]
    pub api_base: String,
    #[serde(default)]
    pub access_token: Option<String>,
}

/// WhatsApp Cloud API sender.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhatsAppConfig {
    #[serde(default = "default_whatsapp_api_base")]
    pub api_base: String,
    #[serde(default)]
    pub phone_number_id: Option<String>,
    #[serde(default)]
    pub access_token: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Database file; `<data_dir>/goalpost.db` when unset.
    #[serde(default)]
    pub database_path: Option<PathBuf>,
}

/// Application configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub reminder: ReminderConfig,
    #[serde(default)]
    pub calendar: CalendarConfig,
    #[serde(default)]
    pub whatsapp: WhatsAppConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

fn default_time_zone() -> String {
    DEFAULT_TIME_ZONE.into()
}
fn default_lead_minutes() -> u32 {
    DEFAULT_REMINDER_LEAD_MINUTES
}
fn default_calendar_id() -> String {
    "primary".into()
}
fn default_calendar_api_base() -> String {
    "https://www.googleapis.com/calendar/v3".into()
}
fn default_whatsapp_api_base() -> String {
    "https://graph.facebook.com/v16.0".into()
}

impl Default for ReminderConfig {
    fn default() -> Self {
        Self {
            time_zone: default_time_zone(),
            reminder_lead_minutes: default_lead_minutes(),
        }
    }
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            calendar_id: default_calendar_id(),
            api_base: default_calendar_api_base(),
            access_token: None,
        }
    }
}

impl Default for WhatsAppConfig {
    fn default() -> Self {
        Self {
            api_base: default_whatsapp_api_base(),
            phone_number_id: None,
            access_token: None,
        }
    }
}

fn token_from_env(var: &str, configured: &Option<String>) -> Option<String> {
    std::env::var(var)
        .ok()
        .filter(|t| !t.is_empty())
        .or_else(|| configured.clone().filter(|t| !t.is_empty()))
}

impl CalendarConfig {
    /// Access token, preferring the environment over the file.
    pub fn token(&self) -> Option<String> {
        token_from_env(GOOGLE_TOKEN_ENV, &self.access_token)
    }
}

impl WhatsAppConfig {
    /// Access token, preferring the environment over the file.
    pub fn token(&self) -> Option<String> {
        token_from_env(WHATSAPP_TOKEN_ENV, &self.access_token)
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let (parent_path, leaf) = match key.rsplit_once('.') {
            Some((parent, leaf)) => (Some(parent), leaf),
            None => (None, key),
        };
        if leaf.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        if let Some(parent_path) = parent_path {
            for part in parent_path.split('.') {
                current = current.get_mut(part).ok_or_else(unknown)?;
            }
        }
        let obj = current.as_object_mut().ok_or_else(unknown)?;
        let existing = obj.get(leaf).ok_or_else(unknown)?;

        let new_value = match existing {
            // An empty value clears an optional setting; required strings
            // then fail to deserialize and are rejected by `set`.
            serde_json::Value::String(_) | serde_json::Value::Null if value.is_empty() => {
                serde_json::Value::Null
            }
            serde_json::Value::Bool(_) => serde_json::Value::Bool(
                value
                    .parse::<bool>()
                    .map_err(|_| invalid(format!("cannot parse '{value}' as bool")))?,
            ),
            serde_json::Value::Number(_) => value
                .parse::<u64>()
                .map(|n| serde_json::Value::Number(n.into()))
                .map_err(|_| invalid(format!("cannot parse '{value}' as number")))?,
            serde_json::Value::Object(_) => return Err(invalid("not a leaf key".into())),
            _ => serde_json::Value::String(value.into()),
        };

        obj.insert(leaf.to_string(), new_value);
        Ok(())
    }

    fn path() -> Result<PathBuf, ConfigError> {
        let dir = data_dir().map_err(|e| ConfigError::LoadFailed {
            path: PathBuf::from("config.toml"),
            message: e.to_string(),
        })?;
        Ok(dir.join("config.toml"))
    }

    /// Load from the data directory, writing the default if missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    /// Load from an explicit path, writing the default if missing.
    ///
    /// # Errors
    ///
    /// See [`Config::load`].
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }

    /// Persist to the data directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    /// Persist to an explicit path.
    ///
    /// # Errors
    ///
    /// See [`Config::save`].
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
    }

    /// Get a config value as string by dot-separated key.
    ///
    /// Unset optional values read as `None`.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        match Self::get_json_value_by_path(&json, key)? {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Null => None,
            other => Some(other.to_string()),
        }
    }

    /// Whether `key` names a setting (set or not).
    pub fn has_key(&self, key: &str) -> bool {
        serde_json::to_value(self)
            .ok()
            .is_some_and(|json| Self::get_json_value_by_path(&json, key).is_some())
    }

    /// Set a config value in memory by dot-separated key.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value cannot be parsed.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };
        let mut json = serde_json::to_value(&*self).map_err(|e| invalid(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        *self = serde_json::from_value(json).map_err(|e| invalid(e.to_string()))?;
        Ok(())
    }

    /// Every leaf key with its current value, sorted by key.
    pub fn entries(&self) -> Vec<(String, Option<String>)> {
        fn walk(prefix: &str, value: &serde_json::Value, out: &mut Vec<(String, Option<String>)>) {
            match value {
                serde_json::Value::Object(map) => {
                    for (k, v) in map {
                        let key = if prefix.is_empty() {
                            k.clone()
                        } else {
                            format!("{prefix}.{k}")
                        };
                        walk(&key, v, out);
                    }
                }
                serde_json::Value::Null => out.push((prefix.to_string(), None)),
                serde_json::Value::String(s) => out.push((prefix.to_string(), Some(s.clone()))),
                other => out.push((prefix.to_string(), Some(other.to_string()))),
            }
        }

        let mut out = Vec::new();
        if let Ok(json) = serde_json::to_value(self) {
            walk("", &json, &mut out);
        }
        out
    }

    /// Labels the composer attaches to new reminders.
    pub fn reminder_defaults(&self) -> ReminderDefaults {
        ReminderDefaults {
            time_zone: self.reminder.time_zone.clone(),
            reminder_lead_minutes: self.reminder.reminder_lead_minutes,
        }
    }

    /// Database location, falling back to the data directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the data directory cannot be created.
    pub fn database_path(&self) -> std::io::Result<PathBuf> {
        match &self.storage.database_path {
            Some(path) => Ok(path.clone()),
            None => Ok(data_dir()?.join("goalpost.db")),
        }
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, cfg);
    }

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let cfg: Config = toml::from_str("[reminder]\ntime_zone = \"Europe/Berlin\"\n").unwrap();
        assert_eq!(cfg.reminder.time_zone, "Europe/Berlin");
        assert_eq!(cfg.reminder.reminder_lead_minutes, 5);
        assert_eq!(cfg.calendar.calendar_id, "primary");
        assert!(!cfg.calendar.enabled);
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("reminder.time_zone").as_deref(), Some("America/Denver"));
        assert_eq!(cfg.get("reminder.reminder_lead_minutes").as_deref(), Some("5"));
        assert_eq!(cfg.get("calendar.enabled").as_deref(), Some("false"));
        assert!(cfg.get("calendar.access_token").is_none());
        assert!(cfg.has_key("calendar.access_token"));
        assert!(!cfg.has_key("calendar.missing_key"));
    }

    #[test]
    fn set_updates_typed_values() {
        let mut cfg = Config::default();
        cfg.set("calendar.enabled", "true").unwrap();
        cfg.set("reminder.reminder_lead_minutes", "15").unwrap();
        cfg.set("whatsapp.phone_number_id", "1234").unwrap();
        assert!(cfg.calendar.enabled);
        assert_eq!(cfg.reminder.reminder_lead_minutes, 15);
        assert_eq!(cfg.whatsapp.phone_number_id.as_deref(), Some("1234"));

        cfg.set("calendar.access_token", "").unwrap();
        assert!(cfg.calendar.access_token.is_none());
    }

    #[test]
    fn empty_value_clears_a_set_option() {
        let mut cfg = Config::default();
        cfg.set("calendar.access_token", "tok").unwrap();
        cfg.set("whatsapp.phone_number_id", "1234").unwrap();
        cfg.set("storage.database_path", "/tmp/goals.db").unwrap();
        assert_eq!(cfg.calendar.access_token.as_deref(), Some("tok"));

        cfg.set("calendar.access_token", "").unwrap();
        cfg.set("whatsapp.phone_number_id", "").unwrap();
        cfg.set("storage.database_path", "").unwrap();
        assert!(cfg.calendar.access_token.is_none());
        assert!(cfg.whatsapp.phone_number_id.is_none());
        assert!(cfg.storage.database_path.is_none());
        assert!(cfg.get("calendar.access_token").is_none());
    }

    #[test]
    fn empty_required_value_is_rejected() {
        let mut cfg = Config::default();
        assert!(matches!(
            cfg.set("reminder.time_zone", ""),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert_eq!(cfg.reminder.time_zone, "America/Denver");
    }

    #[test]
    fn empty_configured_token_reads_as_unset() {
        assert_eq!(token_from_env("GOALPOST_TEST_UNSET_TOKEN", &Some(String::new())), None);
        assert_eq!(
            token_from_env("GOALPOST_TEST_UNSET_TOKEN", &Some("tok".into())).as_deref(),
            Some("tok")
        );
    }

    #[test]
    fn set_rejects_unknown_keys_and_bad_values() {
        let mut cfg = Config::default();
        assert!(matches!(
            cfg.set("reminder.nonexistent", "x"),
            Err(ConfigError::UnknownKey(_))
        ));
        assert!(matches!(cfg.set("", "x"), Err(ConfigError::UnknownKey(_))));
        assert!(matches!(
            cfg.set("calendar.enabled", "maybe"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            cfg.set("reminder", "x"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn load_from_writes_default_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg, Config::default());
        assert!(path.exists());

        let mut changed = cfg.clone();
        changed.set("reminder.time_zone", "Asia/Tokyo").unwrap();
        changed.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap().reminder.time_zone, "Asia/Tokyo");
    }

    #[test]
    fn load_from_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "reminder = 3").unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::LoadFailed { .. })
        ));
    }

    #[test]
    fn entries_lists_every_leaf() {
        let keys: Vec<String> = Config::default().entries().into_iter().map(|(k, _)| k).collect();
        assert!(keys.contains(&"reminder.time_zone".to_string()));
        assert!(keys.contains(&"whatsapp.access_token".to_string()));
        assert!(keys.contains(&"storage.database_path".to_string()));
    }

    #[test]
    fn reminder_defaults_follow_config() {
        let mut cfg = Config::default();
        cfg.set("reminder.time_zone", "UTC").unwrap();
        let defaults = cfg.reminder_defaults();
        assert_eq!(defaults.time_zone, "UTC");
        assert_eq!(defaults.reminder_lead_minutes, 5);
    }
}
