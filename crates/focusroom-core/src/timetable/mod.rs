mod generator;
mod slot;

pub use generator::{
    generate, parse_subjects, Timetable, TimetableParams, TimetableRequest, MIN_BREAK_MINUTES,
    MIN_INTERVAL_HOURS,
};
pub use slot::{marked_labels, restore_marks, toggle_mark, TimetableSlot, BREAK_LABEL};
