//! Study timetable generation.
//!
//! Turns an ordered list of subjects into alternating study/break slots with
//! absolute start times. The generator is a pure function of its inputs and
//! the anchor time; scheduling notifications for the result is the job of
//! [`crate::notify`].

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::slot::{TimetableSlot, BREAK_LABEL};
use crate::error::ValidationError;

/// Smallest study interval the input form accepts, in hours.
pub const MIN_INTERVAL_HOURS: f64 = 1.0;
/// Smallest break the input form accepts, in minutes.
pub const MIN_BREAK_MINUTES: f64 = 5.0;

/// Durations and break switch for one generation run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimetableParams {
    pub session_minutes: f64,
    pub break_minutes: f64,
    pub include_breaks: bool,
}

impl TimetableParams {
    /// Both durations must be finite, positive and at least one millisecond.
    pub fn validate(&self) -> Result<(), ValidationError> {
        ensure_positive("session_minutes", self.session_minutes)?;
        ensure_positive("break_minutes", self.break_minutes)?;
        Ok(())
    }

    pub fn session(&self) -> Duration {
        minutes_to_duration(self.session_minutes)
    }

    pub fn break_duration(&self) -> Duration {
        minutes_to_duration(self.break_minutes)
    }

    /// Length of a slot generated with these params.
    pub fn slot_length(&self, slot: &TimetableSlot) -> Duration {
        if slot.is_break {
            self.break_duration()
        } else {
            self.session()
        }
    }
}

fn ensure_positive(field: &str, value: f64) -> Result<(), ValidationError> {
    if !(value.is_finite() && value > 0.0) {
        return Err(ValidationError::NotPositive {
            field: field.to_string(),
            value,
        });
    }
    // Slots are timed to the millisecond; anything shorter would stack them.
    if minutes_to_millis(value) < 1 {
        return Err(ValidationError::InvalidValue {
            field: field.to_string(),
            message: format!("{value} minutes is shorter than one millisecond"),
        });
    }
    Ok(())
}

fn minutes_to_millis(minutes: f64) -> i64 {
    (minutes * 60_000.0).round() as i64
}

fn minutes_to_duration(minutes: f64) -> Duration {
    Duration::milliseconds(minutes_to_millis(minutes))
}

fn advance(cursor: DateTime<Utc>, by: Duration) -> Result<DateTime<Utc>, ValidationError> {
    cursor
        .checked_add_signed(by)
        .ok_or_else(|| ValidationError::InvalidValue {
            field: "session_minutes".to_string(),
            message: "timetable runs past the representable date range".to_string(),
        })
}

/// Generate the slot sequence for `subjects`, anchored at `start`.
///
/// Subject names are trimmed; blank names are kept as empty labels. A break
/// follows every study slot except the last when `include_breaks` is set.
///
/// # Errors
/// Returns a `ValidationError` if either duration is not a positive number
/// or is shorter than one millisecond.
pub fn generate<S: AsRef<str>>(
    subjects: &[S],
    params: &TimetableParams,
    start: DateTime<Utc>,
) -> Result<Vec<TimetableSlot>, ValidationError> {
    params.validate()?;

    let session = params.session();
    let break_len = params.break_duration();
    let last = subjects.len().saturating_sub(1);

    let mut slots = Vec::with_capacity(subjects.len() * 2);
    let mut cursor = start;

    for (i, subject) in subjects.iter().enumerate() {
        let index = i as u32;
        slots.push(TimetableSlot {
            id: index * 2,
            label: subject.as_ref().trim().to_string(),
            start_time: cursor,
            is_break: false,
            marked: false,
        });
        cursor = advance(cursor, session)?;

        if params.include_breaks && i < last {
            slots.push(TimetableSlot {
                id: index * 2 + 1,
                label: BREAK_LABEL.to_string(),
                start_time: cursor,
                is_break: true,
                marked: false,
            });
            cursor = advance(cursor, break_len)?;
        }
    }

    Ok(slots)
}

/// Split comma-separated subject text and trim every entry.
///
/// Blank entries between commas are kept. Text that is blank as a whole
/// yields no subjects at all.
pub fn parse_subjects(text: &str) -> Vec<String> {
    if text.trim().is_empty() {
        return Vec::new();
    }
    text.split(',').map(|s| s.trim().to_string()).collect()
}

/// A generated timetable together with the inputs that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timetable {
    pub generated_at: DateTime<Utc>,
    pub params: TimetableParams,
    pub slots: Vec<TimetableSlot>,
}

/// Raw form input: subject text, interval in hours, break in minutes.
#[derive(Debug, Clone, PartialEq)]
pub struct TimetableRequest {
    pub subjects: Vec<String>,
    pub params: TimetableParams,
}

impl TimetableRequest {
    /// Parse the form fields.
    ///
    /// The interval is given in hours (at least 1) and converted to session
    /// minutes; the break is in minutes (at least 5).
    ///
    /// # Errors
    /// Returns a `ValidationError` for non-numeric text or values below the
    /// form minimums.
    pub fn parse(
        subjects_text: &str,
        interval_hours: &str,
        break_minutes: &str,
        show_breaks: bool,
    ) -> Result<Self, ValidationError> {
        let interval_hours = parse_number("interval", interval_hours)?;
        let break_minutes = parse_number("break_minutes", break_minutes)?;
        Self::new(subjects_text, interval_hours, break_minutes, show_breaks)
    }

    /// Same as [`TimetableRequest::parse`] for already-numeric input.
    pub fn new(
        subjects_text: &str,
        interval_hours: f64,
        break_minutes: f64,
        show_breaks: bool,
    ) -> Result<Self, ValidationError> {
        ensure_minimum("interval", MIN_INTERVAL_HOURS, interval_hours)?;
        ensure_minimum("break_minutes", MIN_BREAK_MINUTES, break_minutes)?;

        let params = TimetableParams {
            session_minutes: interval_hours * 60.0,
            break_minutes,
            include_breaks: show_breaks,
        };
        params.validate()?;

        Ok(Self {
            subjects: parse_subjects(subjects_text),
            params,
        })
    }

    /// Generate the timetable anchored at `now`.
    pub fn generate(&self, now: DateTime<Utc>) -> Result<Timetable, ValidationError> {
        let slots = generate(&self.subjects, &self.params, now)?;
        Ok(Timetable {
            generated_at: now,
            params: self.params,
            slots,
        })
    }
}

fn parse_number(field: &str, text: &str) -> Result<f64, ValidationError> {
    text.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ValidationError::NotANumber {
            field: field.to_string(),
            value: text.to_string(),
        })
}

fn ensure_minimum(field: &str, min: f64, value: f64) -> Result<(), ValidationError> {
    if value.is_nan() || value < min {
        return Err(ValidationError::BelowMinimum {
            field: field.to_string(),
            min,
            value,
        });
    }
    Ok(())
}
