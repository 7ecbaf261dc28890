mod config;
pub mod prefs;

pub use config::{Config, NotificationsConfig, RosterConfig, ServerConfig, TimetableConfig};
pub use prefs::{PrefsStore, TimetablePrefs};

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns the data directory, creating it if needed.
///
/// `FOCUSROOM_DATA_DIR` wins when set. Otherwise `~/.config/focusroom[-dev]/`
/// based on `FOCUSROOM_ENV` (set `FOCUSROOM_ENV=dev` for the dev directory).
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("FOCUSROOM_DATA_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("FOCUSROOM_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("focusroom-dev")
            } else {
                base_dir.join("focusroom")
            }
        }
    };

    std::fs::create_dir_all(&dir).map_err(|e| ConfigError::DataDir {
        path: dir.clone(),
        message: e.to_string(),
    })?;
    Ok(dir)
}
