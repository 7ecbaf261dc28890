use std::collections::HashSet;

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

/// Label used for every break slot.
pub const BREAK_LABEL: &str = "Break Time";

/// One timetable entry, either a study session or a break.
///
/// Ids are even for study slots and odd for breaks: subject `i` gets `2i`,
/// the break after it `2i + 1`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimetableSlot {
    pub id: u32,
    pub label: String,
    pub start_time: DateTime<Utc>,
    pub is_break: bool,
    #[serde(default)]
    pub marked: bool,
}

impl TimetableSlot {
    /// Start time in local `HH:MM`, as shown next to the label.
    pub fn display_time(&self) -> String {
        self.start_time.with_timezone(&Local).format("%H:%M").to_string()
    }
}

/// Copy of `slots` with `marked` flipped on the slot whose id matches.
///
/// An unknown id returns an unchanged copy.
pub fn toggle_mark(slots: &[TimetableSlot], id: u32) -> Vec<TimetableSlot> {
    slots
        .iter()
        .map(|slot| {
            if slot.id == id {
                TimetableSlot {
                    marked: !slot.marked,
                    ..slot.clone()
                }
            } else {
                slot.clone()
            }
        })
        .collect()
}

/// Labels of marked slots, in slot order.
pub fn marked_labels(slots: &[TimetableSlot]) -> Vec<String> {
    slots
        .iter()
        .filter(|s| s.marked)
        .map(|s| s.label.clone())
        .collect()
}

/// Re-apply persisted marks to a freshly generated timetable.
///
/// Every slot carrying a stored label is marked, repeated labels included,
/// so this is only for timetables saved without per-slot marks.
pub fn restore_marks<S: AsRef<str>>(slots: &[TimetableSlot], labels: &[S]) -> Vec<TimetableSlot> {
    let wanted: HashSet<&str> = labels.iter().map(|l| l.as_ref()).collect();
    slots
        .iter()
        .map(|slot| TimetableSlot {
            marked: wanted.contains(slot.label.as_str()),
            ..slot.clone()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn slots() -> Vec<TimetableSlot> {
        let t = Utc::now();
        vec![
            TimetableSlot {
                id: 0,
                label: "Math".into(),
                start_time: t,
                is_break: false,
                marked: false,
            },
            TimetableSlot {
                id: 1,
                label: BREAK_LABEL.into(),
                start_time: t + chrono::Duration::hours(1),
                is_break: true,
                marked: false,
            },
            TimetableSlot {
                id: 2,
                label: "Physics".into(),
                start_time: t + chrono::Duration::minutes(75),
                is_break: false,
                marked: true,
            },
        ]
    }

    #[test]
    fn toggle_mark_flips_only_matching_slot() {
        let toggled = toggle_mark(&slots(), 0);
        assert!(toggled[0].marked);
        assert!(!toggled[1].marked);
        assert!(toggled[2].marked);
    }

    #[test]
    fn toggle_mark_unknown_id_is_noop() {
        let original = slots();
        assert_eq!(toggle_mark(&original, 99), original);
    }

    #[test]
    fn marked_labels_in_slot_order() {
        let toggled = toggle_mark(&slots(), 0);
        assert_eq!(marked_labels(&toggled), vec!["Math", "Physics"]);
    }

    #[test]
    fn restore_marks_applies_by_label() {
        let restored = restore_marks(&slots(), &["Math"]);
        assert!(restored[0].marked);
        assert!(!restored[2].marked);
    }

    #[test]
    fn slot_serializes_camel_case() {
        let json = serde_json::to_value(&slots()[1]).unwrap();
        assert_eq!(json["isBreak"], true);
        assert!(json.get("startTime").is_some());
    }

    #[test]
    fn display_time_is_hours_and_minutes() {
        let shown = slots()[0].display_time();
        assert_eq!(shown.len(), 5);
        assert_eq!(&shown[2..3], ":");
    }

    proptest! {
        #[test]
        fn toggle_mark_twice_is_identity(id in 0u32..6) {
            let original = slots();
            let twice = toggle_mark(&toggle_mark(&original, id), id);
            prop_assert_eq!(twice, original);
        }
    }
}
