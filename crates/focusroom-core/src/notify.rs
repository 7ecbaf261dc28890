//! Slot notifications.
//!
//! A generated timetable is turned into a plan of one-shot notifications:
//! one when each study slot starts, and two per break (start and end). The
//! [`NotificationScheduler`] keeps the timer handles so the next timetable
//! can cancel whatever the previous one still had pending.
//!
//! Delivery is fire-and-forget. A failed delivery is logged at debug level
//! and dropped; nothing is retried and nothing reaches the caller.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;

use crate::error::{CoreError, Result};
use crate::timetable::{TimetableParams, TimetableSlot};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    StudyStart,
    BreakStart,
    BreakEnd,
}

/// A notification to fire at `fire_at`, `offset_ms` after generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedNotification {
    pub slot_id: u32,
    pub kind: NotificationKind,
    pub title: String,
    pub body: String,
    pub fire_at: DateTime<Utc>,
    pub offset_ms: i64,
}

impl PlannedNotification {
    pub fn offset(&self) -> Duration {
        Duration::milliseconds(self.offset_ms)
    }
}

/// Build the notification plan for a timetable generated at `generated_at`.
///
/// Ordered by slot; a break's start comes before its end.
pub fn plan_notifications(
    slots: &[TimetableSlot],
    params: &TimetableParams,
    generated_at: DateTime<Utc>,
) -> Vec<PlannedNotification> {
    let planned = |slot: &TimetableSlot, kind, title: String, body: String, fire_at: DateTime<Utc>| {
        PlannedNotification {
            slot_id: slot.id,
            kind,
            title,
            body,
            fire_at,
            offset_ms: (fire_at - generated_at).num_milliseconds(),
        }
    };

    let mut plan = Vec::with_capacity(slots.len() * 2);
    for slot in slots {
        if slot.is_break {
            plan.push(planned(
                slot,
                NotificationKind::BreakStart,
                "Break Time!".to_string(),
                format!("Take a break for {} minutes!", params.break_minutes),
                slot.start_time,
            ));
            plan.push(planned(
                slot,
                NotificationKind::BreakEnd,
                "Break Over".to_string(),
                "Get back to your study session!".to_string(),
                slot.start_time + params.slot_length(slot),
            ));
        } else {
            plan.push(planned(
                slot,
                NotificationKind::StudyStart,
                format!("Time to Study: {}", slot.label),
                format!("Start studying {} now!", slot.label),
                slot.start_time,
            ));
        }
    }
    plan
}

/// Platform notification channel.
pub trait Notifier: Send + Sync {
    /// Ask the platform for permission to show notifications.
    fn request_permission(&self) -> Result<()> {
        Ok(())
    }

    /// Show one notification.
    fn deliver(&self, notification: &PlannedNotification) -> Result<()>;
}

/// Writes notifications to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn deliver(&self, notification: &PlannedNotification) -> Result<()> {
        tracing::info!(
            slot_id = notification.slot_id,
            kind = ?notification.kind,
            body = %notification.body,
            "{}",
            notification.title
        );
        Ok(())
    }
}

/// Notifier for when notifications are switched off in config.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledNotifier;

impl Notifier for DisabledNotifier {
    fn request_permission(&self) -> Result<()> {
        Err(CoreError::NotificationUnavailable(
            "notifications are disabled".to_string(),
        ))
    }

    fn deliver(&self, _notification: &PlannedNotification) -> Result<()> {
        self.request_permission()
    }
}

/// Request permission once at startup. Denial is logged and otherwise ignored.
pub fn request_permission(notifier: &dyn Notifier) -> bool {
    match notifier.request_permission() {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "notification permission not granted");
            false
        }
    }
}

/// Owns the pending notification timers of the current timetable.
///
/// Must be used from inside a tokio runtime.
pub struct NotificationScheduler {
    notifier: Arc<dyn Notifier>,
    pending: Vec<JoinHandle<()>>,
}

impl NotificationScheduler {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self {
            notifier,
            pending: Vec::new(),
        }
    }

    /// Replace the pending timers with one timer per planned notification.
    ///
    /// Timers left over from the previous plan are cancelled first, so stale
    /// notifications from an earlier timetable never fire.
    pub fn schedule(&mut self, plan: Vec<PlannedNotification>) -> usize {
        let cancelled = self.cancel_all();
        if cancelled > 0 {
            tracing::debug!(cancelled, "cancelled notifications from previous timetable");
        }

        for notification in plan {
            let notifier = Arc::clone(&self.notifier);
            let delay = notification.offset().to_std().unwrap_or_default();
            let handle = tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                if let Err(e) = notifier.deliver(&notification) {
                    tracing::debug!(
                        slot_id = notification.slot_id,
                        error = %e,
                        "notification dropped"
                    );
                }
            });
            self.pending.push(handle);
        }
        self.pending.len()
    }

    /// Abort every pending timer. Returns how many had not fired yet.
    pub fn cancel_all(&mut self) -> usize {
        let mut cancelled = 0;
        for handle in self.pending.drain(..) {
            if !handle.is_finished() {
                cancelled += 1;
            }
            handle.abort();
        }
        cancelled
    }

    /// Number of timers that have not fired yet.
    pub fn pending(&self) -> usize {
        self.pending.iter().filter(|h| !h.is_finished()).count()
    }

    /// Wait until every pending notification has fired.
    ///
    /// Dropping the returned future early leaves the remaining timers pending.
    pub async fn wait_all(&mut self) {
        for handle in self.pending.iter_mut() {
            let _ = handle.await;
        }
        self.pending.clear();
    }
}

impl Drop for NotificationScheduler {
    fn drop(&mut self) {
        for handle in &self.pending {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timetable::generate;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        delivered: Mutex<Vec<String>>,
    }

    impl Notifier for Recorder {
        fn deliver(&self, notification: &PlannedNotification) -> Result<()> {
            self.delivered
                .lock()
                .unwrap()
                .push(notification.title.clone());
            Ok(())
        }
    }

    fn params() -> TimetableParams {
        TimetableParams {
            session_minutes: 60.0,
            break_minutes: 15.0,
            include_breaks: true,
        }
    }

    #[test]
    fn plan_has_start_and_end_for_breaks() {
        let t = Utc::now();
        let slots = generate(&["Math", "Physics"], &params(), t).unwrap();
        let plan = plan_notifications(&slots, &params(), t);

        let kinds: Vec<_> = plan.iter().map(|n| n.kind).collect();
        assert_eq!(
            kinds,
            vec![
                NotificationKind::StudyStart,
                NotificationKind::BreakStart,
                NotificationKind::BreakEnd,
                NotificationKind::StudyStart,
            ]
        );
        assert_eq!(plan[0].title, "Time to Study: Math");
        assert_eq!(plan[0].offset_ms, 0);
        assert_eq!(plan[1].body, "Take a break for 15 minutes!");
        assert_eq!(plan[1].offset(), Duration::hours(1));
        assert_eq!(plan[2].fire_at, t + Duration::minutes(75));
        assert_eq!(plan[3].body, "Start studying Physics now!");
    }

    #[test]
    fn disabled_notifier_reports_unavailable() {
        assert!(!request_permission(&DisabledNotifier));
        assert!(matches!(
            DisabledNotifier.request_permission(),
            Err(CoreError::NotificationUnavailable(_))
        ));
        assert!(request_permission(&LogNotifier));
    }

    #[tokio::test(start_paused = true)]
    async fn scheduler_fires_at_offsets() {
        let recorder = Arc::new(Recorder::default());
        let mut scheduler = NotificationScheduler::new(recorder.clone());
        let t = Utc::now();
        let slots = generate(&["Math", "Physics"], &params(), t).unwrap();
        assert_eq!(scheduler.schedule(plan_notifications(&slots, &params(), t)), 4);

        tokio::time::sleep(std::time::Duration::from_secs(30 * 60)).await;
        assert_eq!(*recorder.delivered.lock().unwrap(), vec!["Time to Study: Math"]);

        scheduler.wait_all().await;
        assert_eq!(recorder.delivered.lock().unwrap().len(), 4);
        assert_eq!(scheduler.pending(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn rescheduling_cancels_stale_notifications() {
        let recorder = Arc::new(Recorder::default());
        let mut scheduler = NotificationScheduler::new(recorder.clone());
        let t = Utc::now();

        let first = generate(&["Old"], &params(), t + Duration::minutes(10)).unwrap();
        scheduler.schedule(plan_notifications(&first, &params(), t));

        let second = generate(&["New"], &params(), t + Duration::minutes(20)).unwrap();
        scheduler.schedule(plan_notifications(&second, &params(), t));

        tokio::time::sleep(std::time::Duration::from_secs(30 * 60)).await;
        assert_eq!(*recorder.delivered.lock().unwrap(), vec!["Time to Study: New"]);
    }

    #[tokio::test(start_paused = true)]
    async fn delivery_failures_are_swallowed() {
        let mut scheduler = NotificationScheduler::new(Arc::new(DisabledNotifier));
        let t = Utc::now();
        let slots = generate(&["Math"], &params(), t).unwrap();
        scheduler.schedule(plan_notifications(&slots, &params(), t));
        scheduler.wait_all().await;
        assert_eq!(scheduler.pending(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_all_counts_unfired() {
        let mut scheduler = NotificationScheduler::new(Arc::new(LogNotifier));
        let t = Utc::now();
        let slots = generate(&["A", "B"], &params(), t + Duration::minutes(5)).unwrap();
        scheduler.schedule(plan_notifications(&slots, &params(), t));
        assert_eq!(scheduler.cancel_all(), 4);
        assert_eq!(scheduler.pending(), 0);
    }
}
