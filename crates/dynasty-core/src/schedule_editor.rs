// Debounced schedule editing. Edits are buffered in memory and written once
// the debounce window passes, on an explicit flush, or when the editor is
// dropped.

use std::time::{Duration, Instant};

use tracing::{debug, error};

use crate::codec::EntityStore;
use crate::kv::StorageError;
use crate::model::{Game, YearStats};
use crate::stats::calculate_stats;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(1000);

pub struct ScheduleEditor {
    store: EntityStore,
    year: u16,
    games: Vec<Game>,
    debounce: Duration,
    last_edit: Option<Instant>,
    unsaved: bool,
}

impl ScheduleEditor {
    pub fn open(store: EntityStore, year: u16, debounce: Duration) -> Self {
        let games = store.schedule(year);
        ScheduleEditor {
            store,
            year,
            games,
            debounce,
            last_edit: None,
            unsaved: false,
        }
    }

    pub fn year(&self) -> u16 {
        self.year
    }

    pub fn games(&self) -> &[Game] {
        &self.games
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.unsaved
    }

    /// Replace the game in `week` and restart the debounce window. Returns
    /// `false` for a week outside the season.
    pub fn edit_game(&mut self, week: u8, mut game: Game, now: Instant) -> bool {
        let Some(slot) = self.games.get_mut(week as usize) else {
            return false;
        };
        game.week = week;
        *slot = game;
        self.unsaved = true;
        self.last_edit = Some(now);
        true
    }

    /// Stats for the buffered schedule, including unsaved edits.
    pub fn stats(&self) -> YearStats {
        let school = self.store.coach_profile().school_name;
        calculate_stats(&self.games, &school, &self.store.team_directory())
    }

    /// Flush if the debounce window since the last edit has passed. Returns
    /// whether a write happened.
    pub fn poll(&mut self, now: Instant) -> Result<bool, StorageError> {
        let due = self.unsaved
            && self
                .last_edit
                .is_some_and(|last| now.saturating_duration_since(last) >= self.debounce);
        if !due {
            return Ok(false);
        }
        self.flush()?;
        Ok(true)
    }

    /// Write the schedule and its recomputed stats now.
    pub fn flush(&mut self) -> Result<(), StorageError> {
        if !self.unsaved {
            return Ok(());
        }
        self.store.set_schedule(self.year, &self.games)?;
        self.store.set_year_stats(self.year, &self.stats())?;
        self.unsaved = false;
        self.last_edit = None;
        debug!("flushed schedule for {}", self.year);
        Ok(())
    }
}

impl Drop for ScheduleEditor {
    fn drop(&mut self) {
        if self.unsaved {
            if let Err(e) = self.flush() {
                error!("failed to flush schedule for {} on close: {e}", self.year);
            }
        }
    }
}

impl std::fmt::Debug for ScheduleEditor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScheduleEditor")
            .field("year", &self.year)
            .field("games", &self.games.len())
            .field("unsaved", &self.unsaved)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::Storage;
    use crate::model::{CoachProfile, GameResult};

    fn test_store() -> EntityStore {
        let store = EntityStore::for_dynasty(Storage::in_memory(), "abc");
        store
            .set_coach_profile(&CoachProfile {
                school_name: "Michigan".into(),
                ..Default::default()
            })
            .unwrap();
        store
    }

    fn win(opponent: &str) -> Game {
        Game {
            opponent: opponent.into(),
            result: GameResult::Win,
            score: "31-14".into(),
            ..Default::default()
        }
    }

    #[test]
    fn edits_wait_for_debounce() {
        let store = test_store();
        let mut editor = ScheduleEditor::open(store.clone(), 2025, DEFAULT_DEBOUNCE);
        let t0 = Instant::now();

        editor.edit_game(1, win("Ohio State"), t0);
        assert!(!editor.poll(t0 + Duration::from_millis(500)).unwrap());
        assert!(!store.has_schedule(2025));

        // a second edit restarts the window
        editor.edit_game(2, win("Purdue"), t0 + Duration::from_millis(900));
        assert!(!editor.poll(t0 + Duration::from_millis(1500)).unwrap());
        assert!(editor.poll(t0 + Duration::from_millis(1900)).unwrap());

        assert!(!editor.has_unsaved_changes());
        assert_eq!(store.schedule(2025)[2].opponent, "Purdue");
        assert_eq!(store.year_stats(2025).wins, 2);
    }

    #[test]
    fn drop_flushes_pending_edit() {
        let store = test_store();
        {
            let mut editor = ScheduleEditor::open(store.clone(), 2025, DEFAULT_DEBOUNCE);
            editor.edit_game(1, win("Ohio State"), Instant::now());
        }
        let schedule = store.schedule(2025);
        assert_eq!(schedule[1].opponent, "Ohio State");
        assert_eq!(schedule[1].week, 1);
        assert_eq!(store.year_stats(2025).points_scored, 31);
    }

    #[test]
    fn out_of_range_week_is_rejected() {
        let mut editor = ScheduleEditor::open(test_store(), 2025, DEFAULT_DEBOUNCE);
        assert!(!editor.edit_game(21, win("Nobody"), Instant::now()));
        assert!(!editor.has_unsaved_changes());
    }

    #[test]
    fn live_stats_include_unsaved_edits() {
        let mut editor = ScheduleEditor::open(test_store(), 2025, DEFAULT_DEBOUNCE);
        editor.edit_game(0, win("Iowa"), Instant::now());
        let stats = editor.stats();
        assert_eq!(stats.wins, 1);
        assert_eq!(stats.conference_wins, 1);
    }
}
