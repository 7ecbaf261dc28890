use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use tokio::sync::broadcast;

use focusroom_core::storage::ServerConfig;
use focusroom_core::{BroadcastSimulator, Event, UserFocusSample};

/// Application state shared across all handlers and the ticker.
///
/// The simulator lock is never held across an `.await`. A tick replaces the
/// roster wholesale under the write lock, so readers only ever see complete
/// snapshots.
#[derive(Clone)]
pub struct AppState {
    simulator: Arc<RwLock<BroadcastSimulator>>,
    focus_tx: broadcast::Sender<Event>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(simulator: BroadcastSimulator, config: ServerConfig) -> Self {
        let (focus_tx, _) = broadcast::channel(config.channel_capacity.max(1));
        Self {
            simulator: Arc::new(RwLock::new(simulator)),
            focus_tx,
            config: Arc::new(config),
        }
    }

    /// Current roster in roster order.
    pub fn snapshot(&self) -> Vec<UserFocusSample> {
        self.simulator
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .snapshot()
    }

    /// Roster sorted by focus level, highest first.
    pub fn leaderboard(&self) -> Vec<UserFocusSample> {
        self.simulator
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .leaderboard()
    }

    /// Tick the simulator and publish the new roster.
    ///
    /// Returns the number of subscribers the event reached.
    pub fn tick(&self, now: DateTime<Utc>) -> usize {
        let snapshot = self
            .simulator
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .tick(now);
        self.broadcast_event(Event::FocusData(snapshot))
    }

    /// Broadcast an event to all connected clients.
    pub fn broadcast_event(&self, event: Event) -> usize {
        // No receivers is fine
        self.focus_tx.send(event).unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.focus_tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.focus_tx.receiver_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use focusroom_core::storage::RosterConfig;

    fn state() -> AppState {
        let config = RosterConfig {
            seed: Some(9),
            ..RosterConfig::default()
        };
        AppState::new(
            BroadcastSimulator::from_config(&config, Utc::now()),
            ServerConfig::default(),
        )
    }

    #[test]
    fn tick_without_subscribers_is_fine() {
        let state = state();
        assert_eq!(state.tick(Utc::now()), 0);
        assert_eq!(state.snapshot().len(), 3);
    }

    #[tokio::test]
    async fn tick_publishes_full_roster() {
        let state = state();
        let mut rx = state.subscribe();
        assert_eq!(state.tick(Utc::now()), 1);

        match rx.recv().await.unwrap() {
            Event::FocusData(users) => assert_eq!(users, state.snapshot()),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn clones_share_the_roster() {
        let state = state();
        let other = state.clone();
        other.tick(Utc::now());
        assert_eq!(state.snapshot(), other.snapshot());
    }
}
