//! SQLite-backed key-value store for timetable preferences.
//!
//! Holds what the timetable form remembers between sessions:
//! - Last subject text, interval, break length and break switch
//! - Labels of marked slots
//! - The last generated timetable
//!
//! Values are plain strings or JSON and are read back verbatim.

use std::path::Path;

use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::error::{DatabaseError, Result};
use crate::timetable::{restore_marks, Timetable};

const KEY_SUBJECTS: &str = "subjects";
const KEY_INTERVAL: &str = "interval";
const KEY_BREAK_TIME: &str = "breakTime";
const KEY_SHOW_BREAKS: &str = "showBreaks";
const KEY_MARKED_ITEMS: &str = "markedItems";
const KEY_TIMETABLE: &str = "timetable";

/// Last-used timetable inputs.
///
/// Numeric fields stay as the text the user typed; they are parsed when a
/// timetable is generated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimetablePrefs {
    pub subjects: Option<String>,
    pub interval: Option<String>,
    pub break_time: Option<String>,
    pub show_breaks: Option<bool>,
    #[serde(default)]
    pub marked_items: Vec<String>,
}

pub struct PrefsStore {
    conn: Connection,
}

impl PrefsStore {
    /// Open the store at `<data dir>/focusroom.db`.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        let path = data_dir()?.join("focusroom.db");
        Self::open_at(&path)
    }

    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let store = Self { conn };
        store.migrate()?;
        Ok(store)
    }

    /// Open an in-memory store (for tests).
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.migrate()?;
        Ok(store)
    }

    fn migrate(&self) -> Result<(), rusqlite::Error> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );",
        )?;
        Ok(())
    }

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>> {
        let mut stmt = self.conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let result = stmt.query_row(params![key], |row| row.get::<_, String>(0));
        match result {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn kv_delete(&self, key: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }

    pub fn load_prefs(&self) -> Result<TimetablePrefs> {
        let marked_items = match self.kv_get(KEY_MARKED_ITEMS)? {
            Some(json) => serde_json::from_str(&json)?,
            None => Vec::new(),
        };
        Ok(TimetablePrefs {
            subjects: self.kv_get(KEY_SUBJECTS)?,
            interval: self.kv_get(KEY_INTERVAL)?,
            break_time: self.kv_get(KEY_BREAK_TIME)?,
            show_breaks: self.kv_get(KEY_SHOW_BREAKS)?.map(|v| v == "true"),
            marked_items,
        })
    }

    /// Store the form inputs. Unset fields leave the stored value alone.
    pub fn save_prefs(&self, prefs: &TimetablePrefs) -> Result<()> {
        if let Some(subjects) = &prefs.subjects {
            self.kv_set(KEY_SUBJECTS, subjects)?;
        }
        if let Some(interval) = &prefs.interval {
            self.kv_set(KEY_INTERVAL, interval)?;
        }
        if let Some(break_time) = &prefs.break_time {
            self.kv_set(KEY_BREAK_TIME, break_time)?;
        }
        if let Some(show_breaks) = prefs.show_breaks {
            self.kv_set(KEY_SHOW_BREAKS, if show_breaks { "true" } else { "false" })?;
        }
        self.save_marked_items(&prefs.marked_items)
    }

    pub fn save_marked_items(&self, labels: &[String]) -> Result<()> {
        self.kv_set(KEY_MARKED_ITEMS, &serde_json::to_string(labels)?)
    }

    /// Load the last timetable with its per-slot marks.
    ///
    /// A stored timetable whose slots carry no `marked` field gets its marks
    /// from the `markedItems` label list instead.
    pub fn load_timetable(&self) -> Result<Option<Timetable>> {
        let Some(json) = self.kv_get(KEY_TIMETABLE)? else {
            return Ok(None);
        };
        let raw: serde_json::Value = serde_json::from_str(&json)?;
        let has_slot_marks = raw["slots"]
            .as_array()
            .is_some_and(|slots| slots.iter().any(|s| s.get("marked").is_some()));

        let mut timetable: Timetable = serde_json::from_value(raw)?;
        if !has_slot_marks {
            let labels = self.load_prefs()?.marked_items;
            timetable.slots = restore_marks(&timetable.slots, &labels);
        }
        Ok(Some(timetable))
    }

    pub fn save_timetable(&self, timetable: &Timetable) -> Result<()> {
        self.kv_set(KEY_TIMETABLE, &serde_json::to_string(timetable)?)
    }

    /// Forget the stored timetable and its marks. Form inputs are kept.
    pub fn clear_timetable(&self) -> Result<()> {
        self.kv_delete(KEY_TIMETABLE)?;
        self.kv_delete(KEY_MARKED_ITEMS)
    }
}
