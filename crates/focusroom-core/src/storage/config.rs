//! TOML-based application configuration.
//!
//! Stores:
//! - Broadcast server address, tick period and CORS origin
//! - The seed roster for the focus simulator
//! - Timetable form defaults
//! - Notification switch
//!
//! Configuration is stored at `~/.config/focusroom/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::error::ConfigError;

/// Broadcast server configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Seconds between two roster ticks.
    #[serde(default = "default_tick_interval_secs")]
    pub tick_interval_secs: u64,
    /// Buffered events per subscriber before it starts lagging.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
    #[serde(default = "default_allowed_origin")]
    pub allowed_origin: String,
}

/// Seed roster for the focus simulator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosterConfig {
    #[serde(default = "default_users")]
    pub users: Vec<String>,
    /// Focus level of each user before the first tick.
    #[serde(default = "default_initial_focus")]
    pub initial_focus: Vec<u8>,
    /// Fixed RNG seed for reproducible readings.
    #[serde(default)]
    pub seed: Option<u64>,
}

/// Timetable form defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimetableConfig {
    #[serde(default = "default_interval_hours")]
    pub interval_hours: f64,
    #[serde(default = "default_break_minutes")]
    pub break_minutes: f64,
    #[serde(default = "default_true")]
    pub show_breaks: bool,
}

/// Notification configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/focusroom/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub roster: RosterConfig,
    #[serde(default)]
    pub timetable: TimetableConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
}

fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_port() -> u16 {
    3000
}
fn default_tick_interval_secs() -> u64 {
    60
}
fn default_channel_capacity() -> usize {
    100
}
fn default_allowed_origin() -> String {
    "http://localhost:5173".into()
}
fn default_users() -> Vec<String> {
    vec!["Alice".into(), "Bob".into(), "Charlie".into()]
}
fn default_initial_focus() -> Vec<u8> {
    vec![75, 85, 65]
}
fn default_interval_hours() -> f64 {
    1.0
}
fn default_break_minutes() -> f64 {
    15.0
}
fn default_true() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            tick_interval_secs: default_tick_interval_secs(),
            channel_capacity: default_channel_capacity(),
            allowed_origin: default_allowed_origin(),
        }
    }
}

impl Default for RosterConfig {
    fn default() -> Self {
        Self {
            users: default_users(),
            initial_focus: default_initial_focus(),
            seed: None,
        }
    }
}

impl Default for TimetableConfig {
    fn default() -> Self {
        Self {
            interval_hours: default_interval_hours(),
            break_minutes: default_break_minutes(),
            show_breaks: true,
        }
    }
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl ServerConfig {
    /// `host:port` for binding.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
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
        key.split('.').try_fold(root, |current, part| current.get(part))
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

        let (parent, leaf) = match key.rsplit_once('.') {
            Some((parent, leaf)) => (Some(parent), leaf),
            None => (None, key),
        };
        if leaf.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        if let Some(parent) = parent {
            for part in parent.split('.') {
                current = current.get_mut(part).ok_or_else(unknown)?;
            }
        }
        let obj = current.as_object_mut().ok_or_else(unknown)?;
        let existing = obj.get(leaf).ok_or_else(unknown)?;

        let new_value = match existing {
            serde_json::Value::Bool(_) => serde_json::Value::Bool(
                value
                    .parse::<bool>()
                    .map_err(|_| invalid(format!("cannot parse '{value}' as bool")))?,
            ),
            serde_json::Value::Number(_) => {
                if let Ok(n) = value.parse::<u64>() {
                    serde_json::Value::Number(n.into())
                } else {
                    value
                        .parse::<f64>()
                        .ok()
                        .and_then(serde_json::Number::from_f64)
                        .map(serde_json::Value::Number)
                        .ok_or_else(|| invalid(format!("cannot parse '{value}' as number")))?
                }
            }
            serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
            }
            // Unset optionals take whatever JSON the text parses as.
            serde_json::Value::Null => serde_json::from_str(value)
                .unwrap_or_else(|_| serde_json::Value::String(value.into())),
            serde_json::Value::String(_) => serde_json::Value::String(value.into()),
        };

        obj.insert(leaf.to_string(), new_value);
        Ok(())
    }

    fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the data directory, writing defaults if the file is missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    /// Load from an explicit path, writing defaults if the file is missing.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
            Err(_) => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
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

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key without saving.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value does not fit the
    /// field's type.
    pub fn apply(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        *self = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Ok(())
    }

    /// Set a config value by key and save.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        self.apply(key, value)?;
        self.save()
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }
}
