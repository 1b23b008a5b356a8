// Versioned upgrades for older dynasty blobs, and the per-entity policy for
// what a restore may overwrite.

use serde_json::{json, Value};
use tracing::{debug, info};

use super::{SnapshotError, SnapshotMap};
use crate::keys::{self, DynamicKey};
use crate::model::{Game, WEEKS_PER_SEASON};

/// Format version written by this build.
pub const CURRENT_SNAPSHOT_VERSION: u64 = 3;

/// Legacy unscoped records key, replaced by `records_<id>` in v3.
const LEGACY_RECORDS: &str = "records";

type Step = fn(&mut SnapshotMap, &str);

/// `(version produced, step)`, applied in order.
const MIGRATIONS: &[(u64, Step)] = &[
    (1, pad_schedules),
    (2, seed_user_team_history),
    (3, scope_records),
];

/// Upgrade `map` in place to [`CURRENT_SNAPSHOT_VERSION`]. Returns the
/// version the blob was saved with. Blobs without a version are v0.
pub fn migrate(map: &mut SnapshotMap, dynasty_id: &str) -> Result<u64, SnapshotError> {
    let found = map
        .get(keys::SNAPSHOT_VERSION)
        .and_then(Value::as_u64)
        .unwrap_or(0);
    if found > CURRENT_SNAPSHOT_VERSION {
        return Err(SnapshotError::UnsupportedVersion {
            found,
            supported: CURRENT_SNAPSHOT_VERSION,
        });
    }

    for &(version, step) in MIGRATIONS.iter().filter(|(v, _)| *v > found) {
        step(map, dynasty_id);
        debug!("dynasty {dynasty_id}: applied snapshot migration to v{version}");
    }
    if found < CURRENT_SNAPSHOT_VERSION {
        info!("dynasty {dynasty_id}: migrated snapshot v{found} -> v{CURRENT_SNAPSHOT_VERSION}");
    }

    map.insert(
        keys::SNAPSHOT_VERSION.into(),
        Value::from(CURRENT_SNAPSHOT_VERSION),
    );
    Ok(found)
}

/// v1: early saves kept only the weeks that had been filled in.
fn pad_schedules(map: &mut SnapshotMap, _dynasty_id: &str) {
    for (key, value) in map.iter_mut() {
        if !matches!(keys::classify(key), Some(DynamicKey::Schedule(_))) {
            continue;
        }
        let Value::Array(games) = value else {
            continue;
        };
        while games.len() < WEEKS_PER_SEASON {
            let week = games.len() as u8;
            if let Ok(slot) = serde_json::to_value(Game::empty(week)) {
                games.push(slot);
            }
        }
    }
}

/// v2: users used to carry only `currentTeam`. Open a tenure for it starting
/// in the saved current year.
fn seed_user_team_history(map: &mut SnapshotMap, _dynasty_id: &str) {
    let year = map.get(keys::CURRENT_YEAR).and_then(|v| match v {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    });
    let Some(Value::Array(users)) = map.get_mut(keys::USERS) else {
        return;
    };
    for user in users.iter_mut().filter_map(Value::as_object_mut) {
        let has_history = user
            .get("teamHistory")
            .and_then(Value::as_array)
            .is_some_and(|h| !h.is_empty());
        if has_history {
            continue;
        }
        let team = user
            .get("currentTeam")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string);
        let history = match (team, year) {
            (Some(team), Some(year)) => json!([{ "teamId": team, "startYear": year }]),
            _ => json!([]),
        };
        user.insert("teamHistory".into(), history);
    }
}

/// v3: records moved from one shared key to one key per dynasty.
fn scope_records(map: &mut SnapshotMap, dynasty_id: &str) {
    let Some(records) = map.remove(LEGACY_RECORDS) else {
        return;
    };
    map.entry(keys::records_key(dynasty_id)).or_insert(records);
}

// ---------------------------------------------------------------------------
// Restore policies
// ---------------------------------------------------------------------------

/// Entity families a restore clears.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Session,
    Schedule,
    YearStats,
    UserTeamMappings,
    Records,
    TeamStats,
    TeamLeaders,
    OffensiveNeeds,
    DefensiveNeeds,
}

impl EntityKind {
    /// Family of a storage key, or `None` for keys a restore never touches.
    pub fn of(key: &str) -> Option<EntityKind> {
        if keys::SESSION_KEYS.contains(&key) {
            return Some(EntityKind::Session);
        }
        Some(match keys::classify(key)? {
            DynamicKey::Schedule(_) => EntityKind::Schedule,
            DynamicKey::YearStats(_) => EntityKind::YearStats,
            DynamicKey::UserTeamMappings(_) => EntityKind::UserTeamMappings,
            DynamicKey::Records(_) => EntityKind::Records,
            DynamicKey::TeamStats(..) => EntityKind::TeamStats,
            DynamicKey::TeamLeaders(..) => EntityKind::TeamLeaders,
            DynamicKey::OffensiveNeeds(_) => EntityKind::OffensiveNeeds,
            DynamicKey::DefensiveNeeds(_) => EntityKind::DefensiveNeeds,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestorePolicy {
    /// Cleared, then written from the incoming snapshot.
    Replace,
    /// Cleared, written from the snapshot if present, otherwise put back.
    PreserveWhenAbsent,
}

pub const RESTORE_POLICIES: &[(EntityKind, RestorePolicy)] = &[
    (EntityKind::Session, RestorePolicy::Replace),
    (EntityKind::Schedule, RestorePolicy::Replace),
    (EntityKind::YearStats, RestorePolicy::Replace),
    (EntityKind::UserTeamMappings, RestorePolicy::Replace),
    (EntityKind::Records, RestorePolicy::PreserveWhenAbsent),
    (EntityKind::TeamStats, RestorePolicy::Replace),
    (EntityKind::TeamLeaders, RestorePolicy::Replace),
    (EntityKind::OffensiveNeeds, RestorePolicy::Replace),
    (EntityKind::DefensiveNeeds, RestorePolicy::Replace),
];

impl RestorePolicy {
    pub fn for_kind(kind: EntityKind) -> RestorePolicy {
        RESTORE_POLICIES
            .iter()
            .find(|(k, _)| *k == kind)
            .map_or(RestorePolicy::Replace, |&(_, policy)| policy)
    }
}
