use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::roster::UserFocusSample;
use crate::timetable::TimetableSlot;

/// Messages pushed to clients.
///
/// Wire form is `{"event": "<name>", "data": <payload>}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum Event {
    /// Full roster, sent on connect and after every tick.
    FocusData(Vec<UserFocusSample>),
    TimetableGenerated {
        #[serde(rename = "generatedAt")]
        generated_at: DateTime<Utc>,
        slots: Vec<TimetableSlot>,
    },
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::FocusData(_) => "focusData",
            Event::TimetableGenerated { .. } => "timetableGenerated",
        }
    }
}
