// Live view of the opponents registry. Holds a full copy of the registry and
// schedules, re-read wholesale whenever another handle writes something it
// depends on.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use super::{derive_matchups, summarize, OpponentIndex, OpponentSummary};
use crate::codec::EntityStore;
use crate::context::Memo;
use crate::keys::{self, DynamicKey};
use crate::kv::{StorageError, StorageEvent, StorageListener};
use crate::model::{Game, Matchup, Opponent, OpponentsState};

pub struct OpponentTracker {
    store: EntityStore,
    listener: StorageListener,
    state: OpponentsState,
    schedules: BTreeMap<u16, Vec<Game>>,
    generation: u64,
    matchups: Memo<Vec<Matchup>>,
    summaries: Memo<Vec<OpponentSummary>>,
}

impl OpponentTracker {
    pub fn open(store: EntityStore) -> Self {
        let listener = store.storage().subscribe();
        let mut tracker = OpponentTracker {
            store,
            listener,
            state: OpponentsState::default(),
            schedules: BTreeMap::new(),
            generation: 0,
            matchups: Memo::new(),
            summaries: Memo::new(),
        };
        tracker.reload();
        tracker
    }

    /// Re-read the registry and every schedule.
    pub fn reload(&mut self) {
        self.state = self.store.opponents_state();
        self.schedules = self.store.all_schedules();
        self.generation += 1;
        debug!(
            "opponent tracker reloaded: {} opponents, {} seasons",
            self.state.opponents.len(),
            self.schedules.len()
        );
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn state(&self) -> &OpponentsState {
        &self.state
    }

    pub fn opponents(&self) -> &[Opponent] {
        &self.state.opponents
    }

    pub fn index(&self) -> OpponentIndex<'_> {
        OpponentIndex::build(&self.state.opponents)
    }

    pub fn matchups(&mut self) -> &[Matchup] {
        let (opponents, schedules) = (&self.state.opponents, &self.schedules);
        self.matchups
            .get_or_compute(self.generation, || derive_matchups(opponents, schedules))
    }

    /// Opponents by most games played, then name.
    pub fn summaries(&mut self) -> &[OpponentSummary] {
        let generation = self.generation;
        let (opponents, schedules) = (&self.state.opponents, &self.schedules);
        let matchups = self
            .matchups
            .get_or_compute(generation, || derive_matchups(opponents, schedules));
        self.summaries
            .get_or_compute(generation, || summarize(opponents, matchups))
    }

    /// Reload if another handle wrote the registry, a schedule, or the
    /// active dynasty blob. Returns whether a reload happened.
    pub fn poll_external(&mut self) -> bool {
        let events = self.listener.drain();
        let blob_key = self.store.dynasty_id().map(keys::dynasty_key);
        let relevant = events
            .iter()
            .any(|event| is_relevant(event, blob_key.as_deref()));
        if relevant {
            self.reload();
        }
        relevant
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    pub fn add_opponent(
        &mut self,
        name: &str,
        default_team: Option<&str>,
    ) -> Result<Opponent, StorageError> {
        let opponent = Opponent {
            id: self.next_opponent_id(),
            name: name.trim().to_string(),
            default_team: clean_team(default_team),
            team_history: BTreeMap::new(),
        };
        self.state.opponents.push(opponent.clone());
        self.persist()?;
        info!("added opponent {} ({})", opponent.name, opponent.id);
        Ok(opponent)
    }

    /// Returns `false` if no opponent has `id`.
    pub fn remove_opponent(&mut self, id: &str) -> Result<bool, StorageError> {
        let before = self.state.opponents.len();
        self.state.opponents.retain(|o| o.id != id);
        if self.state.opponents.len() == before {
            return Ok(false);
        }
        self.persist()?;
        Ok(true)
    }

    /// Set (or with `None`, clear) the team `id` controls in `season`.
    pub fn assign_team(
        &mut self,
        id: &str,
        season: u16,
        team: Option<&str>,
    ) -> Result<bool, StorageError> {
        let Some(opponent) = self.state.opponents.iter_mut().find(|o| o.id == id) else {
            return Ok(false);
        };
        match clean_team(team) {
            Some(team) => {
                opponent.team_history.insert(season, team);
            }
            None => {
                opponent.team_history.remove(&season);
            }
        }
        self.persist()?;
        Ok(true)
    }

    pub fn set_default_team(&mut self, id: &str, team: Option<&str>) -> Result<bool, StorageError> {
        let Some(opponent) = self.state.opponents.iter_mut().find(|o| o.id == id) else {
            return Ok(false);
        };
        opponent.default_team = clean_team(team);
        self.persist()?;
        Ok(true)
    }

    fn persist(&mut self) -> Result<(), StorageError> {
        self.generation += 1;
        self.state.version += 1;
        self.state.updated_at = Utc::now();
        self.state.matchups = Some(derive_matchups(&self.state.opponents, &self.schedules));
        self.store.set_opponents_state(&self.state)
    }

    fn next_opponent_id(&self) -> String {
        let mut stamp = Utc::now().timestamp_millis();
        while self.state.opponents.iter().any(|o| o.id == opponent_id(stamp)) {
            stamp += 1;
        }
        opponent_id(stamp)
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.state.updated_at
    }
}

fn opponent_id(stamp: i64) -> String {
    format!("opp-{stamp}")
}

fn clean_team(team: Option<&str>) -> Option<String> {
    team.map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

fn is_relevant(event: &StorageEvent, blob_key: Option<&str>) -> bool {
    let Some(key) = event.key.as_deref() else {
        return true;
    };
    key == keys::OPPONENTS_STATE
        || Some(key) == blob_key
        || matches!(keys::classify(key), Some(DynamicKey::Schedule(_)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::Storage;
    use crate::model::{GameResult, Location};

    fn store_with_schedule() -> EntityStore {
        let store = EntityStore::for_dynasty(Storage::in_memory(), "abc");
        let mut schedule = store.schedule(2025);
        schedule[12] = Game {
            week: 12,
            location: Location::Away,
            opponent: "Michigan".into(),
            result: GameResult::Loss,
            score: "10-13".into(),
            user_id: None,
        };
        store.set_schedule(2025, &schedule).unwrap();
        store
    }

    #[test]
    fn mutations_persist_with_new_version() {
        let store = store_with_schedule();
        let mut tracker = OpponentTracker::open(store.clone());
        let jordan = tracker.add_opponent("Jordan", Some("Michigan")).unwrap();

        let stored = store.opponents_state();
        assert_eq!(stored.version, 1);
        assert_eq!(stored.opponents[0].id, jordan.id);
        assert_eq!(stored.matchups.as_ref().unwrap().len(), 1);

        tracker.assign_team(&jordan.id, 2026, Some("Texas")).unwrap();
        assert_eq!(store.opponents_state().version, 2);
        assert!(!tracker.assign_team("missing", 2026, Some("Texas")).unwrap());
    }

    #[test]
    fn summaries_are_memoized_per_generation() {
        let mut tracker = OpponentTracker::open(store_with_schedule());
        tracker.add_opponent("Jordan", Some("Michigan")).unwrap();

        let generation = tracker.generation();
        assert_eq!(tracker.summaries()[0].losses, 1);
        assert_eq!(tracker.generation(), generation);

        let id = tracker.opponents()[0].id.clone();
        tracker.set_default_team(&id, Some("Ohio State")).unwrap();
        assert!(tracker.generation() > generation);
        assert_eq!(tracker.summaries()[0].games(), 0);
    }

    #[test]
    fn foreign_schedule_write_triggers_reload() {
        let store = store_with_schedule();
        let mut tracker = OpponentTracker::open(store.clone());
        tracker.add_opponent("Jordan", Some("Michigan")).unwrap();
        assert!(!tracker.poll_external());

        let other_tab = EntityStore::for_dynasty(store.storage().open_tab(), "abc");
        let mut schedule = other_tab.schedule(2025);
        schedule[12].result = GameResult::Win;
        schedule[12].score = "13-10".into();
        other_tab.set_schedule(2025, &schedule).unwrap();

        assert!(tracker.poll_external());
        assert_eq!(tracker.summaries()[0].wins, 1);
    }

    #[test]
    fn unrelated_foreign_writes_are_ignored() {
        let store = store_with_schedule();
        let mut tracker = OpponentTracker::open(store.clone());
        let other_tab = store.storage().open_tab();
        other_tab.set("coachProfile", "{}").unwrap();
        assert!(!tracker.poll_external());

        other_tab.set("dynasty_abc", "{}").unwrap();
        assert!(tracker.poll_external());
    }

    #[test]
    fn index_finds_controller() {
        let mut tracker = OpponentTracker::open(store_with_schedule());
        let jordan = tracker.add_opponent("Jordan", Some("Michigan")).unwrap();
        assert_eq!(tracker.index().lookup("Michigan", 2031).unwrap().id, jordan.id);
        assert!(tracker.remove_opponent(&jordan.id).unwrap());
        assert!(tracker.index().is_empty());
    }
}
