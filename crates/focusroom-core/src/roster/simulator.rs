//! Focus reading simulator.
//!
//! Owns the roster and its random source. The simulator has no timer of its
//! own; the caller decides when to `tick()` and what to do with the result
//! (the server publishes it to every subscriber).

use chrono::{DateTime, Utc};
use rand::SeedableRng;
use rand_pcg::Mcg128Xsl64;

use super::sample::{Roster, UserFocusSample};
use crate::storage::RosterConfig;

pub struct BroadcastSimulator {
    roster: Roster,
    rng: Mcg128Xsl64,
}

impl BroadcastSimulator {
    /// Create a simulator. `seed` makes the sequence of readings reproducible.
    pub fn new(roster: Roster, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => Mcg128Xsl64::seed_from_u64(seed),
            None => Mcg128Xsl64::from_entropy(),
        };
        Self { roster, rng }
    }

    /// Build the seed roster described by the `[roster]` config section.
    pub fn from_config(config: &RosterConfig, now: DateTime<Utc>) -> Self {
        let roster = Roster::seeded(&config.users, &config.initial_focus, now);
        Self::new(roster, config.seed)
    }

    /// Run one tick and return the resulting snapshot.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Vec<UserFocusSample> {
        self.roster.tick(&mut self.rng, now);
        self.roster.snapshot()
    }

    pub fn snapshot(&self) -> Vec<UserFocusSample> {
        self.roster.snapshot()
    }

    pub fn leaderboard(&self) -> Vec<UserFocusSample> {
        self.roster.leaderboard()
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn default_config_seeds_three_users() {
        let now = Utc::now();
        let sim = BroadcastSimulator::from_config(&RosterConfig::default(), now);
        let names: Vec<_> = sim.snapshot().into_iter().map(|u| u.name).collect();
        assert_eq!(names, vec!["Alice", "Bob", "Charlie"]);
        assert_eq!(sim.leaderboard()[0].name, "Bob");
    }

    #[test]
    fn same_seed_gives_same_readings() {
        let now = Utc::now();
        let config = RosterConfig {
            seed: Some(42),
            ..RosterConfig::default()
        };
        let mut a = BroadcastSimulator::from_config(&config, now);
        let mut b = BroadcastSimulator::from_config(&config, now);
        let later = now + Duration::seconds(60);
        assert_eq!(a.tick(later), b.tick(later));
    }

    #[test]
    fn tick_returns_current_snapshot() {
        let now = Utc::now();
        let mut sim = BroadcastSimulator::new(Roster::seeded(&["Solo"], &[10], now), Some(3));
        let published = sim.tick(now + Duration::seconds(60));
        assert_eq!(published, sim.snapshot());
        assert_eq!(published[0].observed_at, now + Duration::seconds(60));
    }
}
