// The dynasty snapshot: one typed aggregate per save slot, stored as a flat
// `key -> JSON` object under `dynasty_<id>`.

mod manager;
pub mod migrate;

pub use manager::{DynastySummary, RestoreReport, SaveReport, SnapshotManager};
pub use migrate::{migrate, EntityKind, RestorePolicy, CURRENT_SNAPSHOT_VERSION, RESTORE_POLICIES};

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::warn;

use crate::codec::DecodeError;
use crate::keys::{self, DynamicKey};
use crate::kv::StorageError;
use crate::model::schedule::normalize_schedule;
use crate::model::{
    Coach, CoachProfile, CustomTeam, Game, OpponentsState, OthersReceivingVotes, Player,
    PlayerSeasonStats, RecordBook, Recruit, RecruitingNeed, TeamLeaders, TeamStats, Top25History,
    Transfer, Trophy, User, YearRecord, YearStats,
};

/// The on-disk form of a snapshot.
pub type SnapshotMap = Map<String, Value>;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("dynasty `{0}` not found")]
    NotFound(String),

    #[error("dynasty blob `{0}` is not a JSON object")]
    NotAnObject(String),

    #[error("snapshot version {found} is newer than supported version {supported}")]
    UnsupportedVersion { found: u64, supported: u64 },

    #[error("restore left {} keys unwritten: {}", .failed.len(), .failed.join(", "))]
    PartialRestore { failed: Vec<String> },

    #[error("malformed dynasty JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

// ---------------------------------------------------------------------------
// Aggregate
// ---------------------------------------------------------------------------

/// Session singletons. `None` means the snapshot carries no entry for that
/// key, which is distinct from an empty value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionData {
    pub coach_profile: Option<CoachProfile>,
    pub coaches: Option<Vec<Coach>>,
    pub current_year: Option<u16>,
    pub players: Option<Vec<Player>>,
    pub player_stats: Option<Vec<PlayerSeasonStats>>,
    pub all_recruits: Option<Vec<Recruit>>,
    pub all_transfers: Option<Vec<Transfer>>,
    pub year_records: Option<Vec<YearRecord>>,
    pub users: Option<Vec<User>>,
    pub user_controlled_teams: Option<Vec<String>>,
    pub trophies: Option<Vec<Trophy>>,
    pub opponents_state: Option<OpponentsState>,
    pub custom_teams: Option<Vec<CustomTeam>>,
}

/// Per-year entries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeasonData {
    pub schedule: Option<Vec<Game>>,
    pub year_stats: Option<YearStats>,
    pub user_team_mappings: Option<BTreeMap<String, String>>,
    pub team_stats: Option<TeamStats>,
    pub team_leaders: Option<TeamLeaders>,
}

impl SeasonData {
    fn is_empty(&self) -> bool {
        *self == SeasonData::default()
    }
}

/// Advance-schedule flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AdvanceState {
    pub active_week: u8,
    /// High-water mark of `active_week`; never decreases.
    pub latest_unlocked_week: u8,
}

/// The slices of a snapshot owned by the reactive context.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RankingsState {
    pub top25_history: Top25History,
    pub others_receiving_votes: OthersReceivingVotes,
    pub advance: AdvanceState,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DynastySnapshot {
    pub id: String,
    pub session: SessionData,
    pub seasons: BTreeMap<u16, SeasonData>,
    pub records: Option<RecordBook>,
    pub offensive_needs: Option<Vec<RecruitingNeed>>,
    pub defensive_needs: Option<Vec<RecruitingNeed>>,
    pub rankings: RankingsState,
    /// Entries this build does not recognise, carried through untouched.
    pub extra: SnapshotMap,
}

/// Fields stored only inside the blob, never as standalone keys.
const BLOB_FIELDS: &[&str] = &[
    keys::TOP25_HISTORY,
    keys::OTHERS_RECEIVING_VOTES,
    keys::SCHEDULE_ADVANCE,
    keys::SNAPSHOT_VERSION,
];

/// True for blob fields that have no standalone storage key.
pub fn is_blob_field(key: &str) -> bool {
    BLOB_FIELDS.contains(&key)
}

fn take<T: DeserializeOwned>(key: &str, value: &Value) -> Option<T> {
    if value.is_null() {
        return None;
    }
    match T::deserialize(value) {
        Ok(decoded) => Some(decoded),
        Err(e) => {
            warn!("skipping undecodable snapshot entry `{key}`: {e}");
            None
        }
    }
}

fn put<T: Serialize>(map: &mut SnapshotMap, key: String, value: &Option<T>) {
    let Some(value) = value else {
        return;
    };
    match serde_json::to_value(value) {
        Ok(json) => {
            map.insert(key, json);
        }
        Err(e) => warn!("failed to encode snapshot entry `{key}`: {e}"),
    }
}

/// Accepts `2025` and the legacy `"2025"`.
fn take_year(value: &Value) -> Option<u16> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|n| u16::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

impl DynastySnapshot {
    pub fn new(id: impl Into<String>) -> Self {
        DynastySnapshot {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn season_mut(&mut self, year: u16) -> &mut SeasonData {
        self.seasons.entry(year).or_default()
    }

    /// Build from a (migrated) flat map. Entries that fail to decode are
    /// logged and left out. Dynasty-scoped keys for other dynasties are
    /// ignored.
    pub fn from_entries(id: &str, map: &SnapshotMap) -> Self {
        let mut snapshot = DynastySnapshot::new(id);

        for (key, value) in map {
            match key.as_str() {
                keys::COACH_PROFILE => snapshot.session.coach_profile = take(key, value),
                keys::COACHES => snapshot.session.coaches = take(key, value),
                keys::CURRENT_YEAR => snapshot.session.current_year = take_year(value),
                keys::PLAYERS => snapshot.session.players = take(key, value),
                keys::PLAYER_STATS => snapshot.session.player_stats = take(key, value),
                keys::ALL_RECRUITS => snapshot.session.all_recruits = take(key, value),
                keys::ALL_TRANSFERS => snapshot.session.all_transfers = take(key, value),
                keys::YEAR_RECORDS => snapshot.session.year_records = take(key, value),
                keys::USERS => snapshot.session.users = take(key, value),
                keys::USER_CONTROLLED_TEAMS => snapshot.session.user_controlled_teams = take(key, value),
                keys::TROPHIES => snapshot.session.trophies = take(key, value),
                keys::OPPONENTS_STATE => snapshot.session.opponents_state = take(key, value),
                keys::CUSTOM_TEAMS => snapshot.session.custom_teams = take(key, value),
                keys::TOP25_HISTORY => {
                    snapshot.rankings.top25_history = take(key, value).unwrap_or_default()
                }
                keys::OTHERS_RECEIVING_VOTES => {
                    snapshot.rankings.others_receiving_votes = take(key, value).unwrap_or_default()
                }
                keys::SCHEDULE_ADVANCE => {
                    snapshot.rankings.advance = take(key, value).unwrap_or_default()
                }
                keys::SNAPSHOT_VERSION => {}
                _ => snapshot.absorb_dynamic(key, value),
            }
        }

        snapshot.seasons.retain(|_, season| !season.is_empty());
        snapshot
    }

    fn absorb_dynamic(&mut self, key: &str, value: &Value) {
        let Some(kind) = keys::classify(key) else {
            self.extra.insert(key.to_string(), value.clone());
            return;
        };
        if !kind.belongs_to(&self.id) {
            return;
        }
        match kind {
            DynamicKey::Schedule(year) => {
                self.season_mut(year).schedule =
                    take::<Vec<Game>>(key, value).map(normalize_schedule)
            }
            DynamicKey::YearStats(year) => self.season_mut(year).year_stats = take(key, value),
            DynamicKey::UserTeamMappings(year) => {
                self.season_mut(year).user_team_mappings = take(key, value)
            }
            DynamicKey::TeamStats(_, year) => self.season_mut(year).team_stats = take(key, value),
            DynamicKey::TeamLeaders(_, year) => {
                self.season_mut(year).team_leaders = take(key, value)
            }
            DynamicKey::Records(_) => self.records = take(key, value),
            DynamicKey::OffensiveNeeds(_) => self.offensive_needs = take(key, value),
            DynamicKey::DefensiveNeeds(_) => self.defensive_needs = take(key, value),
        }
    }

    /// Flatten to the on-disk map, stamped with the current format version.
    pub fn to_entries(&self) -> SnapshotMap {
        let mut map = self.extra.clone();
        let s = &self.session;

        put(&mut map, keys::COACH_PROFILE.into(), &s.coach_profile);
        put(&mut map, keys::COACHES.into(), &s.coaches);
        put(&mut map, keys::CURRENT_YEAR.into(), &s.current_year);
        put(&mut map, keys::PLAYERS.into(), &s.players);
        put(&mut map, keys::PLAYER_STATS.into(), &s.player_stats);
        put(&mut map, keys::ALL_RECRUITS.into(), &s.all_recruits);
        put(&mut map, keys::ALL_TRANSFERS.into(), &s.all_transfers);
        put(&mut map, keys::YEAR_RECORDS.into(), &s.year_records);
        put(&mut map, keys::USERS.into(), &s.users);
        put(&mut map, keys::USER_CONTROLLED_TEAMS.into(), &s.user_controlled_teams);
        put(&mut map, keys::TROPHIES.into(), &s.trophies);
        put(&mut map, keys::OPPONENTS_STATE.into(), &s.opponents_state);
        put(&mut map, keys::CUSTOM_TEAMS.into(), &s.custom_teams);

        for (&year, season) in &self.seasons {
            put(&mut map, keys::schedule_key(year), &season.schedule);
            put(&mut map, keys::year_stats_key(year), &season.year_stats);
            put(&mut map, keys::user_team_mappings_key(year), &season.user_team_mappings);
            put(&mut map, keys::team_stats_key(&self.id, year), &season.team_stats);
            put(&mut map, keys::team_leaders_key(&self.id, year), &season.team_leaders);
        }

        put(&mut map, keys::records_key(&self.id), &self.records);
        put(&mut map, keys::offensive_needs_key(&self.id), &self.offensive_needs);
        put(&mut map, keys::defensive_needs_key(&self.id), &self.defensive_needs);

        put(&mut map, keys::TOP25_HISTORY.into(), &Some(&self.rankings.top25_history));
        put(
            &mut map,
            keys::OTHERS_RECEIVING_VOTES.into(),
            &Some(&self.rankings.others_receiving_votes),
        );
        put(&mut map, keys::SCHEDULE_ADVANCE.into(), &Some(self.rankings.advance));
        map.insert(
            keys::SNAPSHOT_VERSION.into(),
            Value::from(CURRENT_SNAPSHOT_VERSION),
        );
        map
    }

    /// Re-key dynasty-scoped entries under a new id.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }
}
