// Typed get/set over the key-value store. Reads heal corrupt entries by
// deleting them; writes report failure to the caller.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tracing::warn;

use crate::keys;
use crate::kv::{Storage, StorageError};
use crate::model::schedule::normalize_schedule;
use crate::model::{
    blank_schedule, Coach, CoachProfile, CustomTeam, Game, OpponentsState, Player,
    PlayerSeasonStats, RecordBook, Recruit, RecruitingNeed, TeamLeaders, TeamStats, Transfer,
    Trophy, User, YearRecord, YearStats,
};
use crate::teams::TeamDirectory;

/// A stored value that is not valid JSON for its expected type.
#[derive(Debug, Error)]
#[error("failed to decode `{key}`: {source}")]
pub struct DecodeError {
    pub key: String,
    #[source]
    pub source: serde_json::Error,
}

/// Decode the value under `key`. Absent keys and JSON `null` are `Ok(None)`.
pub fn decode<T: DeserializeOwned>(storage: &Storage, key: &str) -> Result<Option<T>, DecodeError> {
    let Some(raw) = storage.get(key) else {
        return Ok(None);
    };
    serde_json::from_str::<Option<T>>(&raw).map_err(|source| DecodeError {
        key: key.to_string(),
        source,
    })
}

/// Decode the value under `key`, falling back to `T::default()`. A corrupt
/// entry is deleted so the next read starts clean.
pub fn load_or_heal<T: DeserializeOwned + Default>(storage: &Storage, key: &str) -> T {
    match decode(storage, key) {
        Ok(value) => value.unwrap_or_default(),
        Err(e) => {
            warn!("{e}; removing corrupt entry");
            if let Err(e) = storage.remove(key) {
                warn!("failed to remove corrupt entry `{key}`: {e}");
            }
            T::default()
        }
    }
}

/// Serialize `value` as JSON and store it under `key`.
pub fn encode<T: Serialize + ?Sized>(
    storage: &Storage,
    key: &str,
    value: &T,
) -> Result<(), StorageError> {
    let json = serde_json::to_string(value).map_err(|source| StorageError::Encode {
        key: key.to_string(),
        source,
    })?;
    storage.set(key, &json).inspect_err(|e| {
        warn!("failed to write `{key}`: {e}");
    })
}

// ---------------------------------------------------------------------------
// EntityStore
// ---------------------------------------------------------------------------

/// Session handle for entity reads and writes. Dynasty-scoped entities
/// (records, team stats, recruiting needs) are keyed by the bound dynasty id.
#[derive(Debug, Clone)]
pub struct EntityStore {
    storage: Storage,
    dynasty_id: Option<String>,
}

impl EntityStore {
    /// A store with no dynasty bound.
    pub fn new(storage: Storage) -> Self {
        EntityStore {
            storage,
            dynasty_id: None,
        }
    }

    pub fn for_dynasty(storage: Storage, dynasty_id: impl Into<String>) -> Self {
        EntityStore {
            storage,
            dynasty_id: Some(dynasty_id.into()),
        }
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    pub fn dynasty_id(&self) -> Option<&str> {
        self.dynasty_id.as_deref()
    }

    pub fn bind(&mut self, dynasty_id: Option<String>) {
        self.dynasty_id = dynasty_id;
    }

    fn scoped_key(&self, build: impl FnOnce(&str) -> String) -> Result<String, StorageError> {
        self.dynasty_id
            .as_deref()
            .map(build)
            .ok_or(StorageError::NoActiveDynasty)
    }

    fn scoped_get<T: DeserializeOwned + Default>(&self, build: impl FnOnce(&str) -> String) -> T {
        match self.dynasty_id.as_deref() {
            Some(id) => load_or_heal(&self.storage, &build(id)),
            None => T::default(),
        }
    }

    // --- session singletons ---

    pub fn coach_profile(&self) -> CoachProfile {
        load_or_heal(&self.storage, keys::COACH_PROFILE)
    }

    pub fn set_coach_profile(&self, profile: &CoachProfile) -> Result<(), StorageError> {
        encode(&self.storage, keys::COACH_PROFILE, profile)
    }

    pub fn coaches(&self) -> Vec<Coach> {
        load_or_heal(&self.storage, keys::COACHES)
    }

    pub fn set_coaches(&self, coaches: &[Coach]) -> Result<(), StorageError> {
        encode(&self.storage, keys::COACHES, coaches)
    }

    /// The season pointer. Older saves stored it as a quoted string.
    pub fn current_year(&self) -> Option<u16> {
        let raw = self.storage.get(keys::CURRENT_YEAR)?;
        match raw.trim().trim_matches('"').parse() {
            Ok(year) => Some(year),
            Err(e) => {
                warn!("failed to decode `{}`: {e}; removing corrupt entry", keys::CURRENT_YEAR);
                if let Err(e) = self.storage.remove(keys::CURRENT_YEAR) {
                    warn!("failed to remove corrupt entry `{}`: {e}", keys::CURRENT_YEAR);
                }
                None
            }
        }
    }

    pub fn set_current_year(&self, year: u16) -> Result<(), StorageError> {
        encode(&self.storage, keys::CURRENT_YEAR, &year)
    }

    pub fn players(&self) -> Vec<Player> {
        load_or_heal(&self.storage, keys::PLAYERS)
    }

    pub fn set_players(&self, players: &[Player]) -> Result<(), StorageError> {
        encode(&self.storage, keys::PLAYERS, players)
    }

    pub fn player_stats(&self) -> Vec<PlayerSeasonStats> {
        load_or_heal(&self.storage, keys::PLAYER_STATS)
    }

    pub fn set_player_stats(&self, stats: &[PlayerSeasonStats]) -> Result<(), StorageError> {
        encode(&self.storage, keys::PLAYER_STATS, stats)
    }

    pub fn all_recruits(&self) -> Vec<Recruit> {
        load_or_heal(&self.storage, keys::ALL_RECRUITS)
    }

    pub fn recruits_for_year(&self, year: u16) -> Vec<Recruit> {
        self.all_recruits()
            .into_iter()
            .filter(|r| r.recruited_year == year)
            .collect()
    }

    pub fn set_all_recruits(&self, recruits: &[Recruit]) -> Result<(), StorageError> {
        encode(&self.storage, keys::ALL_RECRUITS, recruits)
    }

    /// Replace one cycle's class, leaving other years untouched.
    pub fn set_recruits_for_year(&self, year: u16, class: &[Recruit]) -> Result<(), StorageError> {
        let mut all: Vec<Recruit> = self
            .all_recruits()
            .into_iter()
            .filter(|r| r.recruited_year != year)
            .collect();
        all.extend(class.iter().cloned().map(|mut r| {
            r.recruited_year = year;
            r
        }));
        self.set_all_recruits(&all)
    }

    pub fn all_transfers(&self) -> Vec<Transfer> {
        load_or_heal(&self.storage, keys::ALL_TRANSFERS)
    }

    pub fn transfers_for_year(&self, year: u16) -> Vec<Transfer> {
        self.all_transfers()
            .into_iter()
            .filter(|t| t.year == year)
            .collect()
    }

    pub fn set_all_transfers(&self, transfers: &[Transfer]) -> Result<(), StorageError> {
        encode(&self.storage, keys::ALL_TRANSFERS, transfers)
    }

    pub fn set_transfers_for_year(&self, year: u16, moves: &[Transfer]) -> Result<(), StorageError> {
        let mut all: Vec<Transfer> = self
            .all_transfers()
            .into_iter()
            .filter(|t| t.year != year)
            .collect();
        all.extend(moves.iter().cloned().map(|mut t| {
            t.year = year;
            t
        }));
        self.set_all_transfers(&all)
    }

    pub fn year_records(&self) -> Vec<YearRecord> {
        load_or_heal(&self.storage, keys::YEAR_RECORDS)
    }

    pub fn year_record(&self, year: u16) -> Option<YearRecord> {
        self.year_records().into_iter().find(|r| r.year == year)
    }

    /// Insert or replace the record for `record.year`, keeping the list
    /// sorted by year.
    pub fn set_year_record(&self, record: &YearRecord) -> Result<(), StorageError> {
        let mut records = self.year_records();
        match records.iter_mut().find(|r| r.year == record.year) {
            Some(existing) => *existing = record.clone(),
            None => records.push(record.clone()),
        }
        records.sort_by_key(|r| r.year);
        encode(&self.storage, keys::YEAR_RECORDS, &records)
    }

    pub fn trophies(&self) -> Vec<Trophy> {
        load_or_heal(&self.storage, keys::TROPHIES)
    }

    pub fn set_trophies(&self, trophies: &[Trophy]) -> Result<(), StorageError> {
        encode(&self.storage, keys::TROPHIES, trophies)
    }

    pub fn users(&self) -> Vec<User> {
        load_or_heal(&self.storage, keys::USERS)
    }

    pub fn set_users(&self, users: &[User]) -> Result<(), StorageError> {
        encode(&self.storage, keys::USERS, users)
    }

    pub fn user_controlled_teams(&self) -> Vec<String> {
        load_or_heal(&self.storage, keys::USER_CONTROLLED_TEAMS)
    }

    pub fn set_user_controlled_teams(&self, teams: &[String]) -> Result<(), StorageError> {
        encode(&self.storage, keys::USER_CONTROLLED_TEAMS, teams)
    }

    pub fn custom_teams(&self) -> Vec<CustomTeam> {
        load_or_heal(&self.storage, keys::CUSTOM_TEAMS)
    }

    pub fn set_custom_teams(&self, teams: &[CustomTeam]) -> Result<(), StorageError> {
        encode(&self.storage, keys::CUSTOM_TEAMS, teams)
    }

    /// Standard teams overlaid with this session's custom-team registry.
    pub fn team_directory(&self) -> TeamDirectory {
        TeamDirectory::standard().with_custom_teams(&self.custom_teams())
    }

    pub fn opponents_state(&self) -> OpponentsState {
        load_or_heal(&self.storage, keys::OPPONENTS_STATE)
    }

    pub fn set_opponents_state(&self, state: &OpponentsState) -> Result<(), StorageError> {
        encode(&self.storage, keys::OPPONENTS_STATE, state)
    }

    // --- per-year ---

    /// Always a full season: absent or corrupt schedules read as blank and
    /// short legacy schedules are padded.
    pub fn schedule(&self, year: u16) -> Vec<Game> {
        let games: Vec<Game> = load_or_heal(&self.storage, &keys::schedule_key(year));
        if games.is_empty() {
            blank_schedule()
        } else {
            normalize_schedule(games)
        }
    }

    pub fn has_schedule(&self, year: u16) -> bool {
        self.storage.get(&keys::schedule_key(year)).is_some()
    }

    pub fn set_schedule(&self, year: u16, games: &[Game]) -> Result<(), StorageError> {
        encode(
            &self.storage,
            &keys::schedule_key(year),
            &normalize_schedule(games.to_vec()),
        )
    }

    pub fn year_stats(&self, year: u16) -> YearStats {
        load_or_heal(&self.storage, &keys::year_stats_key(year))
    }

    pub fn set_year_stats(&self, year: u16, stats: &YearStats) -> Result<(), StorageError> {
        encode(&self.storage, &keys::year_stats_key(year), stats)
    }

    /// `team name -> user id` as of `year`.
    pub fn user_team_mappings(&self, year: u16) -> BTreeMap<String, String> {
        load_or_heal(&self.storage, &keys::user_team_mappings_key(year))
    }

    pub fn set_user_team_mappings(
        &self,
        year: u16,
        mappings: &BTreeMap<String, String>,
    ) -> Result<(), StorageError> {
        encode(&self.storage, &keys::user_team_mappings_key(year), mappings)
    }

    /// Every year with a stored schedule, ascending.
    pub fn schedule_years(&self) -> Vec<u16> {
        let mut years: Vec<u16> = self
            .storage
            .keys()
            .iter()
            .filter_map(|key| match keys::classify(key) {
                Some(keys::DynamicKey::Schedule(year)) => Some(year),
                _ => None,
            })
            .collect();
        years.sort_unstable();
        years
    }

    /// `year -> schedule` for every stored season.
    pub fn all_schedules(&self) -> BTreeMap<u16, Vec<Game>> {
        self.schedule_years()
            .into_iter()
            .map(|year| (year, self.schedule(year)))
            .collect()
    }

    // --- dynasty-scoped ---

    pub fn records(&self) -> RecordBook {
        self.scoped_get(keys::records_key)
    }

    pub fn set_records(&self, records: &RecordBook) -> Result<(), StorageError> {
        encode(&self.storage, &self.scoped_key(keys::records_key)?, records)
    }

    pub fn team_stats(&self, year: u16) -> TeamStats {
        self.scoped_get(|id| keys::team_stats_key(id, year))
    }

    pub fn set_team_stats(&self, year: u16, stats: &TeamStats) -> Result<(), StorageError> {
        let key = self.scoped_key(|id| keys::team_stats_key(id, year))?;
        encode(&self.storage, &key, stats)
    }

    pub fn team_leaders(&self, year: u16) -> TeamLeaders {
        self.scoped_get(|id| keys::team_leaders_key(id, year))
    }

    pub fn set_team_leaders(&self, year: u16, leaders: &TeamLeaders) -> Result<(), StorageError> {
        let key = self.scoped_key(|id| keys::team_leaders_key(id, year))?;
        encode(&self.storage, &key, leaders)
    }

    pub fn offensive_needs(&self) -> Vec<RecruitingNeed> {
        self.scoped_get(keys::offensive_needs_key)
    }

    pub fn set_offensive_needs(&self, needs: &[RecruitingNeed]) -> Result<(), StorageError> {
        encode(&self.storage, &self.scoped_key(keys::offensive_needs_key)?, needs)
    }

    pub fn defensive_needs(&self) -> Vec<RecruitingNeed> {
        self.scoped_get(keys::defensive_needs_key)
    }

    pub fn set_defensive_needs(&self, needs: &[RecruitingNeed]) -> Result<(), StorageError> {
        encode(&self.storage, &self.scoped_key(keys::defensive_needs_key)?, needs)
    }
}
