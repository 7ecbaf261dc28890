use std::sync::Arc;

use chrono::Utc;
use clap::Subcommand;
use focusroom_core::notify::{self, NotificationScheduler, Notifier};
use focusroom_core::{
    marked_labels, plan_notifications, toggle_mark, Config, DisabledNotifier,
    Event, LogNotifier, PrefsStore, TimetablePrefs, TimetableRequest, TimetableSlot,
};

#[derive(Subcommand)]
pub enum TimetableAction {
    /// Generate a timetable starting now
    Generate {
        /// Comma-separated subjects (defaults to the last used)
        #[arg(long)]
        subjects: Option<String>,
        /// Study interval in hours, at least 1
        #[arg(long)]
        interval: Option<String>,
        /// Break length in minutes, at least 5
        #[arg(long = "break")]
        break_time: Option<String>,
        /// Insert breaks between subjects
        #[arg(long, overrides_with = "no_breaks")]
        breaks: bool,
        /// Do not insert breaks
        #[arg(long)]
        no_breaks: bool,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
        /// Stay running and deliver slot notifications
        #[arg(long)]
        wait: bool,
    },
    /// Show the last generated timetable
    Show {
        #[arg(long)]
        json: bool,
    },
    /// Toggle the done mark of a slot
    Mark {
        /// Slot id
        id: u32,
    },
    /// Print the saved form inputs
    Prefs,
    /// Forget the saved timetable and marks
    Clear,
}

pub fn run(action: TimetableAction) -> Result<(), Box<dyn std::error::Error>> {
    let store = PrefsStore::open()?;

    match action {
        TimetableAction::Generate {
            subjects,
            interval,
            break_time,
            breaks,
            no_breaks,
            json,
            wait,
        } => {
            let config = Config::load_or_default();
            let saved = store.load_prefs()?;

            let subjects = subjects.or(saved.subjects).unwrap_or_default();
            let interval = interval
                .or(saved.interval)
                .unwrap_or_else(|| config.timetable.interval_hours.to_string());
            let break_time = break_time
                .or(saved.break_time)
                .unwrap_or_else(|| config.timetable.break_minutes.to_string());
            let show_breaks = if breaks {
                true
            } else if no_breaks {
                false
            } else {
                saved.show_breaks.unwrap_or(config.timetable.show_breaks)
            };

            let request = TimetableRequest::parse(&subjects, &interval, &break_time, show_breaks)?;
            let timetable = request.generate(Utc::now())?;

            store.save_prefs(&TimetablePrefs {
                subjects: Some(subjects),
                interval: Some(interval),
                break_time: Some(break_time),
                show_breaks: Some(show_breaks),
                marked_items: Vec::new(),
            })?;
            store.save_timetable(&timetable)?;
            tracing::debug!(slots = timetable.slots.len(), "timetable saved");

            if json {
                let event = Event::TimetableGenerated {
                    generated_at: timetable.generated_at,
                    slots: timetable.slots.clone(),
                };
                println!("{}", serde_json::to_string_pretty(&event)?);
            } else {
                print!("{}", render_slots(&timetable.slots));
            }

            if wait {
                let plan =
                    plan_notifications(&timetable.slots, &timetable.params, timetable.generated_at);
                deliver_notifications(&config, plan)?;
            }
        }
        TimetableAction::Show { json } => {
            let Some(timetable) = store.load_timetable()? else {
                println!("no timetable generated yet");
                return Ok(());
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&timetable.slots)?);
            } else {
                print!("{}", render_slots(&timetable.slots));
            }
        }
        TimetableAction::Mark { id } => {
            let mut timetable = store
                .load_timetable()?
                .ok_or("no timetable generated yet")?;

            if !timetable.slots.iter().any(|s| s.id == id) {
                eprintln!("no slot with id {id}");
            }
            // Marks live on the saved slots; the label list is only a record.
            timetable.slots = toggle_mark(&timetable.slots, id);
            store.save_timetable(&timetable)?;
            store.save_marked_items(&marked_labels(&timetable.slots))?;
            print!("{}", render_slots(&timetable.slots));
        }
        TimetableAction::Prefs => {
            let prefs = store.load_prefs()?;
            println!("{}", serde_json::to_string_pretty(&prefs)?);
        }
        TimetableAction::Clear => {
            store.clear_timetable()?;
            println!("timetable cleared");
        }
    }
    Ok(())
}

/// Block until every planned notification has fired.
fn deliver_notifications(
    config: &Config,
    plan: Vec<notify::PlannedNotification>,
) -> Result<(), Box<dyn std::error::Error>> {
    let notifier: Arc<dyn Notifier> = if config.notifications.enabled {
        Arc::new(LogNotifier)
    } else {
        Arc::new(DisabledNotifier)
    };
    notify::request_permission(notifier.as_ref());

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(async move {
        let mut scheduler = NotificationScheduler::new(notifier);
        let count = scheduler.schedule(plan);
        eprintln!("waiting for {count} notifications (ctrl-c to stop)");
        let interrupted = tokio::select! {
            _ = scheduler.wait_all() => false,
            _ = tokio::signal::ctrl_c() => true,
        };
        if interrupted {
            let cancelled = scheduler.cancel_all();
            eprintln!("stopped, {cancelled} notifications cancelled");
        }
    });
    Ok(())
}

fn render_slots(slots: &[TimetableSlot]) -> String {
    if slots.is_empty() {
        return "(empty timetable)\n".to_string();
    }
    slots
        .iter()
        .map(|slot| {
            let kind = if slot.is_break { "break" } else { "study" };
            let mark = if slot.marked { " ✔" } else { "" };
            format!(
                "[{:>2}] {}  {:<5}  {}{}\n",
                slot.id,
                slot.display_time(),
                kind,
                slot.label,
                mark
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use focusroom_core::{generate, TimetableParams};

    #[test]
    fn render_marks_and_kinds() {
        let params = TimetableParams {
            session_minutes: 60.0,
            break_minutes: 15.0,
            include_breaks: true,
        };
        let slots = generate(&["Math", "Physics"], &params, Utc::now()).unwrap();
        let slots = toggle_mark(&slots, 2);
        let text = render_slots(&slots);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("study") && lines[0].ends_with("Math"));
        assert!(lines[1].contains("break") && lines[1].ends_with("Break Time"));
        assert!(lines[2].ends_with("Physics ✔"));
    }

    #[test]
    fn render_empty() {
        assert_eq!(render_slots(&[]), "(empty timetable)\n");
    }
}
