// Reactive dynasty context: the in-memory rankings/advance state of the
// active dynasty, with a version counter for invalidating derived views.

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::codec::EntityStore;
use crate::keys::{self, DynamicKey};
use crate::kv::{Storage, StorageEvent, StorageListener};
use crate::model::rankings::normalize_poll;
use crate::model::{blank_poll, RankedTeam, WEEKS_PER_SEASON};
use crate::season::{self, SeasonError};
use crate::snapshot::{RankingsState, SaveReport, SnapshotError, SnapshotManager};
use crate::stats::active_week;

#[derive(Debug, Error)]
pub enum ContextError {
    #[error("no dynasty is loaded")]
    NoActiveDynasty,

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    #[error(transparent)]
    Season(#[from] SeasonError),
}

// ---------------------------------------------------------------------------
// Memo
// ---------------------------------------------------------------------------

/// Single-value cache keyed by a generation number. Recomputes only when
/// asked for a different generation than the one cached.
#[derive(Debug)]
pub struct Memo<T> {
    cached: Option<(u64, T)>,
}

impl<T> Default for Memo<T> {
    fn default() -> Self {
        Memo { cached: None }
    }
}

impl<T> Memo<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_compute(&mut self, generation: u64, compute: impl FnOnce() -> T) -> &T {
        if self.cached.as_ref().is_some_and(|(g, _)| *g != generation) {
            self.cached = None;
        }
        &self.cached.get_or_insert_with(|| (generation, compute())).1
    }

    /// Generation of the cached value, if any.
    pub fn generation(&self) -> Option<u64> {
        self.cached.as_ref().map(|(g, _)| *g)
    }

    pub fn invalidate(&mut self) {
        self.cached = None;
    }
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct LoadedDynasty {
    pub id: String,
    pub current_year: Option<u16>,
    pub rankings: RankingsState,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum ContextState {
    #[default]
    NoActiveDynasty,
    Loaded(LoadedDynasty),
}

/// One tab's view of the active dynasty.
///
/// Rankings and advance flags live here and reach storage only through
/// [`DynastyContext::save_dynasty_data`]; [`DynastyContext::is_dirty`]
/// reports whether there are edits a save would persist.
pub struct DynastyContext {
    manager: SnapshotManager,
    listener: StorageListener,
    state: ContextState,
    version: u64,
    dirty: bool,
}

impl DynastyContext {
    pub fn new(storage: Storage) -> Self {
        let listener = storage.subscribe();
        DynastyContext {
            manager: SnapshotManager::new(storage),
            listener,
            state: ContextState::NoActiveDynasty,
            version: 0,
            dirty: false,
        }
    }

    pub fn manager(&self) -> &SnapshotManager {
        &self.manager
    }

    pub fn state(&self) -> &ContextState {
        &self.state
    }

    pub fn loaded(&self) -> Option<&LoadedDynasty> {
        match &self.state {
            ContextState::Loaded(loaded) => Some(loaded),
            ContextState::NoActiveDynasty => None,
        }
    }

    fn loaded_mut(&mut self) -> Option<&mut LoadedDynasty> {
        match &mut self.state {
            ContextState::Loaded(loaded) => Some(loaded),
            ContextState::NoActiveDynasty => None,
        }
    }

    pub fn dynasty_id(&self) -> Option<&str> {
        self.loaded().map(|l| l.id.as_str())
    }

    pub fn current_year(&self) -> Option<u16> {
        self.loaded().and_then(|l| l.current_year)
    }

    /// Entity access bound to the loaded dynasty.
    pub fn entity_store(&self) -> EntityStore {
        let storage = self.manager.storage().clone();
        match self.dynasty_id() {
            Some(id) => EntityStore::for_dynasty(storage, id),
            None => EntityStore::new(storage),
        }
    }

    // -----------------------------------------------------------------------
    // Transitions
    // -----------------------------------------------------------------------

    /// Enter `Loaded` for `id` from its stored blob, or return to
    /// `NoActiveDynasty` with `None`. Discards unsaved rankings edits.
    pub fn set_current_dynasty_id(&mut self, id: Option<&str>) -> Result<(), ContextError> {
        match id {
            Some(id) => {
                let loaded = self.hydrate(id)?;
                self.manager
                    .set_current_dynasty_id(Some(id))
                    .map_err(SnapshotError::from)?;
                info!(
                    "dynasty {id} loaded: year {:?}, active week {}",
                    loaded.current_year, loaded.rankings.advance.active_week
                );
                self.state = ContextState::Loaded(loaded);
            }
            None => {
                self.manager
                    .set_current_dynasty_id(None)
                    .map_err(SnapshotError::from)?;
                self.state = ContextState::NoActiveDynasty;
            }
        }
        self.dirty = false;
        self.bump();
        Ok(())
    }

    /// Restore `id` into the live keys, then load it.
    pub fn open_dynasty(&mut self, id: &str) -> Result<(), ContextError> {
        self.manager.load_dynasty(id)?;
        self.set_current_dynasty_id(Some(id))
    }

    fn hydrate(&self, id: &str) -> Result<LoadedDynasty, SnapshotError> {
        let snapshot = self.manager.load_snapshot(id)?;
        let store = EntityStore::for_dynasty(self.manager.storage().clone(), id);
        let current_year = store.current_year().or(snapshot.session.current_year);

        let mut rankings = snapshot.rankings;
        rankings.advance.active_week = current_year.map_or(0, |year| active_week(&store.schedule(year)));
        rankings.advance.latest_unlocked_week = rankings
            .advance
            .latest_unlocked_week
            .max(rankings.advance.active_week);

        Ok(LoadedDynasty {
            id: id.to_string(),
            current_year,
            rankings,
        })
    }

    // -----------------------------------------------------------------------
    // Weeks
    // -----------------------------------------------------------------------

    pub fn active_week(&self) -> u8 {
        self.loaded().map_or(0, |l| l.rankings.advance.active_week)
    }

    pub fn latest_unlocked_week(&self) -> u8 {
        self.loaded().map_or(0, |l| l.rankings.advance.latest_unlocked_week)
    }

    /// Clamp to the season and advance the unlock frontier. Returns `false`
    /// when no dynasty is loaded.
    pub fn set_active_week(&mut self, week: u8) -> bool {
        let week = week.min(WEEKS_PER_SEASON as u8);
        let Some(loaded) = self.loaded_mut() else {
            return false;
        };
        let advance = &mut loaded.rankings.advance;
        advance.active_week = week;
        advance.latest_unlocked_week = advance.latest_unlocked_week.max(week);
        self.mark_dirty();
        true
    }

    // -----------------------------------------------------------------------
    // Rankings
    // -----------------------------------------------------------------------

    /// Replace one week's poll in memory. Persisted only by a save.
    pub fn update_rankings_for_week(&mut self, year: u16, week: u8, ranked: Vec<RankedTeam>) -> bool {
        let Some(loaded) = self.loaded_mut() else {
            return false;
        };
        loaded
            .rankings
            .top25_history
            .entry(year)
            .or_default()
            .insert(week, normalize_poll(ranked));
        self.mark_dirty();
        true
    }

    /// The poll for `week`, or the latest earlier poll that year, or a blank
    /// poll.
    pub fn get_rankings_for_week(&self, year: u16, week: u8) -> Vec<RankedTeam> {
        self.loaded()
            .and_then(|l| l.rankings.top25_history.get(&year))
            .and_then(|weeks| weeks.range(..=week).next_back())
            .map(|(_, poll)| poll.clone())
            .unwrap_or_else(blank_poll)
    }

    pub fn others_receiving_votes(&self, year: u16, week: u8) -> String {
        self.loaded()
            .and_then(|l| l.rankings.others_receiving_votes.get(&year))
            .and_then(|weeks| weeks.get(&week))
            .cloned()
            .unwrap_or_default()
    }

    pub fn set_others_receiving_votes(&mut self, year: u16, week: u8, text: &str) -> bool {
        let Some(loaded) = self.loaded_mut() else {
            return false;
        };
        let weeks = loaded.rankings.others_receiving_votes.entry(year).or_default();
        if text.trim().is_empty() {
            weeks.remove(&week);
        } else {
            weeks.insert(week, text.to_string());
        }
        self.mark_dirty();
        true
    }

    // -----------------------------------------------------------------------
    // Versioning and persistence
    // -----------------------------------------------------------------------

    /// Invalidate every [`Memo`] keyed on [`DynastyContext::version`].
    pub fn refresh_data(&mut self) {
        self.bump();
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    fn bump(&mut self) {
        self.version += 1;
    }

    fn mark_dirty(&mut self) {
        self.dirty = true;
        self.bump();
    }

    pub fn save_dynasty_data(&mut self) -> Result<SaveReport, ContextError> {
        let loaded = self.loaded().ok_or(ContextError::NoActiveDynasty)?;
        let report = self.manager.save_dynasty_data(&loaded.id, &loaded.rankings)?;
        self.dirty = false;
        Ok(report)
    }

    /// Apply writes made by other handles on the same store. A change to the
    /// active blob (or an unknown change) reloads the whole state; a change
    /// to the current year or its schedule recomputes the active week.
    /// Returns `true` if anything was observed.
    pub fn sync_external_changes(&mut self) -> Result<bool, ContextError> {
        let events = self.listener.drain();
        if events.is_empty() {
            return Ok(false);
        }
        let Some(loaded) = self.loaded() else {
            self.bump();
            return Ok(true);
        };
        let id = loaded.id.clone();
        let blob_key = keys::dynasty_key(&id);

        if events.iter().any(|e| e.affects(&blob_key)) {
            if self.dirty {
                warn!("dynasty {id} changed in another session; discarding unsaved rankings edits");
            }
            let reloaded = self.hydrate(&id)?;
            self.state = ContextState::Loaded(reloaded);
            self.dirty = false;
            debug!("dynasty {id} re-hydrated after external write");
        } else if events.iter().any(|e| touches_schedule_or_year(e)) {
            self.recompute_active_week();
        }

        self.bump();
        Ok(true)
    }

    fn recompute_active_week(&mut self) {
        let store = self.entity_store();
        let current_year = store.current_year();
        let Some(loaded) = self.loaded_mut() else {
            return;
        };
        if current_year.is_some() {
            loaded.current_year = current_year;
        }
        let week = loaded
            .current_year
            .map_or(0, |year| active_week(&store.schedule(year)));
        let advance = &mut loaded.rankings.advance;
        advance.active_week = week;
        advance.latest_unlocked_week = advance.latest_unlocked_week.max(week);
    }

    /// Roll the dynasty into its next season. The new season opens with the
    /// previous season's final poll as week 0, and the result is saved.
    pub fn prepare_next_season(&mut self) -> Result<u16, ContextError> {
        let current = self.current_year().ok_or(ContextError::NoActiveDynasty)?;
        let final_poll = self.get_rankings_for_week(current, WEEKS_PER_SEASON as u8);
        let next = season::prepare_next_season(&self.entity_store())?;

        if let Some(loaded) = self.loaded_mut() {
            loaded.current_year = Some(next);
            loaded
                .rankings
                .top25_history
                .entry(next)
                .or_default()
                .insert(0, final_poll);
            loaded.rankings.advance = Default::default();
        }
        self.mark_dirty();
        self.save_dynasty_data()?;
        Ok(next)
    }
}

fn touches_schedule_or_year(event: &StorageEvent) -> bool {
    match event.key.as_deref() {
        None => true,
        Some(keys::CURRENT_YEAR) => true,
        Some(key) => matches!(keys::classify(key), Some(DynamicKey::Schedule(_))),
    }
}
