//! # Focusroom Core Library
//!
//! Core logic for the Focusroom study tracker. The broadcast server and the
//! CLI are thin layers over this crate.
//!
//! ## Architecture
//!
//! - **Roster**: fixed set of users whose focus readings are replaced with
//!   random values on every tick. The caller owns the timer.
//! - **Timetable**: pure generator for alternating study/break slots
//! - **Notify**: per-slot notification plans and a cancellable scheduler
//! - **Storage**: TOML configuration and a SQLite key-value store for
//!   timetable preferences
//!
//! ## Key Components
//!
//! - [`BroadcastSimulator`]: roster plus random source
//! - [`generate`]: timetable generation
//! - [`NotificationScheduler`]: pending notification timers
//! - [`Config`]: application configuration management

pub mod error;
pub mod events;
pub mod notify;
pub mod roster;
pub mod storage;
pub mod timetable;

pub use error::{ConfigError, CoreError, DatabaseError, ValidationError};
pub use events::Event;
pub use notify::{
    plan_notifications, DisabledNotifier, LogNotifier, NotificationKind, NotificationScheduler,
    Notifier, PlannedNotification,
};
pub use roster::{BroadcastSimulator, Roster, UserFocusSample};
pub use storage::{Config, PrefsStore, TimetablePrefs};
pub use timetable::{
    generate, marked_labels, parse_subjects, restore_marks, toggle_mark, Timetable,
    TimetableParams, TimetableRequest, TimetableSlot,
};
