//! Periodic roster tick.

use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::state::AppState;

/// Spawn the ticker. The first tick fires one full `period` after start;
/// until then clients see the seed roster.
pub fn spawn_ticker(state: AppState, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(period_secs = period.as_secs(), "Focus ticker started");
        loop {
            interval.tick().await;
            let receivers = state.tick(Utc::now());
            tracing::debug!(receivers, "Broadcast focus data");
        }
    })
}
