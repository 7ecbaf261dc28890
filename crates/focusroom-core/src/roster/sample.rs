use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Highest focus level a reading can take.
pub const MAX_FOCUS_LEVEL: u8 = 100;

/// One user's current focus reading.
///
/// Serialized with camelCase keys and `observedAt` as epoch milliseconds,
/// which is what the graphing client plots against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserFocusSample {
    pub id: u32,
    pub name: String,
    pub focus_level: u8,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub observed_at: DateTime<Utc>,
}

/// Fixed-membership collection of tracked users.
///
/// Membership never changes after construction; every tick replaces the
/// whole sample vector at once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Roster {
    users: Vec<UserFocusSample>,
}

impl Roster {
    pub fn new(users: Vec<UserFocusSample>) -> Self {
        Self { users }
    }

    /// Build a roster from names, assigning ids `1..` in order.
    ///
    /// Missing initial levels default to 0; levels above 100 are clamped.
    pub fn seeded<S: AsRef<str>>(names: &[S], initial_focus: &[u8], now: DateTime<Utc>) -> Self {
        let users = names
            .iter()
            .enumerate()
            .map(|(i, name)| UserFocusSample {
                id: (i + 1) as u32,
                name: name.as_ref().to_string(),
                focus_level: initial_focus
                    .get(i)
                    .copied()
                    .unwrap_or(0)
                    .min(MAX_FOCUS_LEVEL),
                observed_at: now,
            })
            .collect();
        Self { users }
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    pub fn users(&self) -> &[UserFocusSample] {
        &self.users
    }

    /// Current roster, unmodified.
    pub fn snapshot(&self) -> Vec<UserFocusSample> {
        self.users.clone()
    }

    /// Roster sorted by focus level, highest first.
    ///
    /// `sort_by` is stable, so users with equal levels keep roster order.
    pub fn leaderboard(&self) -> Vec<UserFocusSample> {
        let mut board = self.users.clone();
        board.sort_by(|a, b| b.focus_level.cmp(&a.focus_level));
        board
    }

    /// Give every user a fresh random focus level observed at `now`.
    ///
    /// `observed_at` always moves forward: when `now` is not past the previous
    /// reading it is bumped to one millisecond after it.
    pub fn tick<R: Rng + ?Sized>(&mut self, rng: &mut R, now: DateTime<Utc>) {
        let next: Vec<UserFocusSample> = self
            .users
            .iter()
            .map(|user| UserFocusSample {
                id: user.id,
                name: user.name.clone(),
                focus_level: rng.gen_range(0..=MAX_FOCUS_LEVEL),
                observed_at: now.max(user.observed_at + Duration::milliseconds(1)),
            })
            .collect();
        self.users = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Mcg128Xsl64;

    fn sample(id: u32, focus_level: u8) -> UserFocusSample {
        UserFocusSample {
            id,
            name: format!("user-{id}"),
            focus_level,
            observed_at: DateTime::from_timestamp_millis(1_700_000_000_000).unwrap(),
        }
    }

    #[test]
    fn seeded_assigns_ids_in_order() {
        let now = Utc::now();
        let roster = Roster::seeded(&["Alice", "Bob", "Charlie"], &[75, 85, 65], now);
        let ids: Vec<u32> = roster.users().iter().map(|u| u.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(roster.users()[1].name, "Bob");
        assert_eq!(roster.users()[1].focus_level, 85);
    }

    #[test]
    fn seeded_clamps_and_defaults_levels() {
        let roster = Roster::seeded(&["A", "B"], &[250], Utc::now());
        assert_eq!(roster.users()[0].focus_level, 100);
        assert_eq!(roster.users()[1].focus_level, 0);
    }

    #[test]
    fn leaderboard_sorts_descending_and_keeps_tie_order() {
        let roster = Roster::new(vec![sample(1, 40), sample(2, 90), sample(3, 40), sample(4, 90)]);
        let ids: Vec<u32> = roster.leaderboard().iter().map(|u| u.id).collect();
        assert_eq!(ids, vec![2, 4, 1, 3]);
    }

    #[test]
    fn leaderboard_does_not_reorder_roster() {
        let roster = Roster::new(vec![sample(1, 10), sample(2, 90)]);
        let _ = roster.leaderboard();
        assert_eq!(roster.users()[0].id, 1);
    }

    #[test]
    fn tick_with_stale_clock_still_advances() {
        let mut roster = Roster::new(vec![sample(1, 50)]);
        let before = roster.users()[0].observed_at;
        let mut rng = Mcg128Xsl64::seed_from_u64(7);
        roster.tick(&mut rng, before - Duration::seconds(30));
        assert_eq!(roster.users()[0].observed_at, before + Duration::milliseconds(1));
    }

    #[test]
    fn sample_serializes_camel_case_with_epoch_millis() {
        let json = serde_json::to_value(sample(3, 42)).unwrap();
        assert_eq!(json["focusLevel"], 42);
        assert_eq!(json["observedAt"], 1_700_000_000_000i64);
        assert!(json.get("focus_level").is_none());
    }

    #[test]
    fn empty_roster_ticks_to_empty() {
        let mut roster = Roster::default();
        let mut rng = Mcg128Xsl64::seed_from_u64(1);
        roster.tick(&mut rng, Utc::now());
        assert!(roster.is_empty());
        assert!(roster.leaderboard().is_empty());
    }

    proptest! {
        #[test]
        fn tick_keeps_levels_in_range_and_times_increasing(
            levels in proptest::collection::vec(0u8..=100, 0..20),
            seed in any::<u64>(),
            skew_secs in -120i64..120,
        ) {
            let users: Vec<_> = levels
                .iter()
                .enumerate()
                .map(|(i, l)| sample(i as u32 + 1, *l))
                .collect();
            let mut roster = Roster::new(users);
            let before = roster.snapshot();
            let now = before
                .first()
                .map(|u| u.observed_at)
                .unwrap_or_else(Utc::now)
                + Duration::seconds(skew_secs);
            let mut rng = Mcg128Xsl64::seed_from_u64(seed);
            roster.tick(&mut rng, now);

            prop_assert_eq!(roster.len(), before.len());
            for (old, new) in before.iter().zip(roster.users()) {
                prop_assert!(new.focus_level <= 100);
                prop_assert!(new.observed_at > old.observed_at);
                prop_assert_eq!(new.id, old.id);
                prop_assert_eq!(&new.name, &old.name);
            }
        }

        #[test]
        fn leaderboard_is_sorted_stable_permutation(
            levels in proptest::collection::vec(0u8..=100, 0..30),
        ) {
            let users: Vec<_> = levels
                .iter()
                .enumerate()
                .map(|(i, l)| sample(i as u32 + 1, *l))
                .collect();
            let roster = Roster::new(users);
            let board = roster.leaderboard();

            prop_assert_eq!(board.len(), roster.len());
            for pair in board.windows(2) {
                prop_assert!(pair[0].focus_level >= pair[1].focus_level);
                if pair[0].focus_level == pair[1].focus_level {
                    // ids follow roster order, so ties must stay ascending
                    prop_assert!(pair[0].id < pair[1].id);
                }
            }
            let mut ids: Vec<u32> = board.iter().map(|u| u.id).collect();
            ids.sort_unstable();
            let expected: Vec<u32> = (1..=roster.len() as u32).collect();
            prop_assert_eq!(ids, expected);
        }
    }
}
