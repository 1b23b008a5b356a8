// Save, restore, and switch dynasty slots.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info, warn};

use super::{
    is_blob_field, migrate, DynastySnapshot, EntityKind, RankingsState, RestorePolicy,
    SnapshotError, SnapshotMap,
};
use crate::codec::{encode, load_or_heal, EntityStore};
use crate::keys;
use crate::kv::{Storage, StorageError};
use crate::model::{blank_poll, blank_schedule, CoachProfile, YearStats};

/// Launcher-screen entry in the `dynasties` index.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DynastySummary {
    pub id: String,
    #[serde(default)]
    pub coach_name: String,
    #[serde(default)]
    pub school_name: String,
    #[serde(default)]
    pub current_year: Option<u16>,
    #[serde(default)]
    pub last_played: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveReport {
    pub dynasty_id: String,
    /// Entries folded into the blob.
    pub entries: usize,
    pub bytes: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestoreReport {
    pub cleared: usize,
    pub written: usize,
    /// Keys put back because the snapshot had no entry for them.
    pub preserved: Vec<String>,
}

/// Owns the `dynasty_<id>` blobs, the `dynasties` index and the
/// `currentDynastyId` pointer.
#[derive(Debug, Clone)]
pub struct SnapshotManager {
    storage: Storage,
}

impl SnapshotManager {
    pub fn new(storage: Storage) -> Self {
        SnapshotManager { storage }
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// Entity access bound to the active dynasty.
    pub fn entity_store(&self) -> EntityStore {
        match self.current_dynasty_id() {
            Some(id) => EntityStore::for_dynasty(self.storage.clone(), id),
            None => EntityStore::new(self.storage.clone()),
        }
    }

    // -----------------------------------------------------------------------
    // Pointer and index
    // -----------------------------------------------------------------------

    pub fn current_dynasty_id(&self) -> Option<String> {
        let raw = self.storage.get(keys::CURRENT_DYNASTY_ID)?;
        let id = raw.trim().trim_matches('"');
        (!id.is_empty()).then(|| id.to_string())
    }

    pub fn set_current_dynasty_id(&self, id: Option<&str>) -> Result<(), StorageError> {
        match id {
            Some(id) => self.storage.set(keys::CURRENT_DYNASTY_ID, id),
            None => self.storage.remove(keys::CURRENT_DYNASTY_ID),
        }
    }

    pub fn list_dynasties(&self) -> Vec<DynastySummary> {
        load_or_heal(&self.storage, keys::DYNASTIES)
    }

    fn exists(&self, id: &str) -> bool {
        self.storage.get(&keys::dynasty_key(id)).is_some()
            || self.list_dynasties().iter().any(|d| d.id == id)
    }

    fn upsert_summary(&self, summary: DynastySummary) -> Result<(), StorageError> {
        let mut index = self.list_dynasties();
        match index.iter_mut().find(|d| d.id == summary.id) {
            Some(existing) => *existing = summary,
            None => index.push(summary),
        }
        encode(&self.storage, keys::DYNASTIES, &index)
    }

    /// Millisecond timestamp, bumped until it is unused.
    fn new_dynasty_id(&self) -> String {
        let mut candidate = Utc::now().timestamp_millis();
        while self.exists(&candidate.to_string()) {
            candidate += 1;
        }
        candidate.to_string()
    }

    // -----------------------------------------------------------------------
    // Load / restore
    // -----------------------------------------------------------------------

    /// Read and migrate a stored blob without touching live keys.
    pub fn load_snapshot(&self, id: &str) -> Result<DynastySnapshot, SnapshotError> {
        let key = keys::dynasty_key(id);
        let raw = self
            .storage
            .get(&key)
            .ok_or_else(|| SnapshotError::NotFound(id.to_string()))?;
        let Value::Object(mut map) = serde_json::from_str::<Value>(&raw)? else {
            return Err(SnapshotError::NotAnObject(key));
        };
        migrate(&mut map, id)?;
        Ok(DynastySnapshot::from_entries(id, &map))
    }

    /// Load a stored dynasty into the live keys and make it active.
    pub fn load_dynasty(&self, id: &str) -> Result<DynastySnapshot, SnapshotError> {
        let snapshot = self.load_snapshot(id)?;
        self.restore_dynasty_from_snapshot(&snapshot)?;
        Ok(snapshot)
    }

    /// Replace the live keys with `snapshot` and point `currentDynastyId` at
    /// it.
    ///
    /// Every session key and every per-year / per-dynasty key is cleared
    /// first. Keys whose [`RestorePolicy`] is `PreserveWhenAbsent` are backed
    /// up beforehand and put back when the snapshot has no entry for them,
    /// so an older save can never wipe accumulated records.
    pub fn restore_dynasty_from_snapshot(
        &self,
        snapshot: &DynastySnapshot,
    ) -> Result<RestoreReport, SnapshotError> {
        let mut report = RestoreReport::default();
        let live_keys = self.storage.keys();

        // 1. back up protected keys
        let backup: BTreeMap<String, String> = live_keys
            .iter()
            .filter(|key| {
                EntityKind::of(key)
                    .is_some_and(|kind| RestorePolicy::for_kind(kind) == RestorePolicy::PreserveWhenAbsent)
            })
            .filter_map(|key| Some((key.clone(), self.storage.get(key)?)))
            .collect();

        // 2. clear
        let mut failed = Vec::new();
        let to_clear: BTreeSet<&str> = keys::SESSION_KEYS
            .iter()
            .copied()
            .chain(live_keys.iter().map(String::as_str).filter(|k| keys::classify(k).is_some()))
            .collect();
        for key in to_clear {
            match self.storage.remove(key) {
                Ok(()) => report.cleared += 1,
                Err(e) => {
                    warn!("restore: failed to clear `{key}`: {e}");
                    failed.push(key.to_string());
                }
            }
        }

        // 3. write the snapshot; unrecognised entries stay in the blob only
        let entries = snapshot.to_entries();
        for (key, value) in entries
            .iter()
            .filter(|(k, _)| !is_blob_field(k) && !snapshot.extra.contains_key(*k))
        {
            let result = serde_json::to_string(value)
                .map_err(|source| StorageError::Encode {
                    key: key.clone(),
                    source,
                })
                .and_then(|json| self.storage.set(key, &json));
            match result {
                Ok(()) => report.written += 1,
                Err(e) => {
                    warn!("restore: failed to write `{key}`: {e}");
                    failed.push(key.clone());
                }
            }
        }

        // 4. put back protected keys the snapshot lacks
        for (key, value) in backup.iter().filter(|(k, _)| !entries.contains_key(*k)) {
            match self.storage.set(key, value) {
                Ok(()) => report.preserved.push(key.clone()),
                Err(e) => {
                    error!("restore: failed to put back `{key}`: {e}");
                    failed.push(key.clone());
                }
            }
        }

        if !failed.is_empty() {
            return Err(SnapshotError::PartialRestore { failed });
        }

        self.set_current_dynasty_id(Some(&snapshot.id))?;
        info!(
            "restored dynasty {}: cleared {}, wrote {}, preserved {}",
            snapshot.id,
            report.cleared,
            report.written,
            report.preserved.len()
        );
        Ok(report)
    }

    // -----------------------------------------------------------------------
    // Save
    // -----------------------------------------------------------------------

    /// Collect the live keys belonging to `id` into a snapshot, with
    /// `rankings` as the authoritative rankings slice.
    pub fn capture(&self, id: &str, rankings: &RankingsState) -> DynastySnapshot {
        let mut map = SnapshotMap::new();

        for &key in keys::SESSION_KEYS {
            let Some(raw) = self.storage.get(key) else {
                continue;
            };
            match serde_json::from_str::<Value>(&raw) {
                Ok(value) => {
                    map.insert(key.to_string(), value);
                }
                Err(e) => warn!("save: skipping unreadable `{key}`: {e}"),
            }
        }

        for key in self.storage.keys() {
            if !keys::classify(&key).is_some_and(|kind| kind.belongs_to(id)) {
                continue;
            }
            let Some(raw) = self.storage.get(&key) else {
                continue;
            };
            match serde_json::from_str::<Value>(&raw) {
                Ok(value) => {
                    map.insert(key, value);
                }
                Err(e) => warn!("save: skipping unreadable `{key}`: {e}"),
            }
        }

        let mut snapshot = DynastySnapshot::from_entries(id, &map);
        snapshot.rankings = rankings.clone();
        snapshot.extra = self.stored_extra(id);
        snapshot
    }

    /// Unrecognised entries of the stored blob, carried over on save.
    fn stored_extra(&self, id: &str) -> SnapshotMap {
        match self.load_snapshot(id) {
            Ok(stored) => stored.extra,
            Err(SnapshotError::NotFound(_)) => SnapshotMap::new(),
            Err(e) => {
                warn!("save: could not read stored blob for {id}: {e}");
                SnapshotMap::new()
            }
        }
    }

    /// Fold the live keys and `rankings` into `dynasty_<id>` and refresh the
    /// launcher index.
    pub fn save_dynasty_data(
        &self,
        id: &str,
        rankings: &RankingsState,
    ) -> Result<SaveReport, SnapshotError> {
        let snapshot = self.capture(id, rankings);
        let report = self.write_snapshot(&snapshot).inspect_err(|e| {
            error!("failed to save dynasty {id}: {e}");
        })?;
        info!("saved dynasty {id}: {} entries, {} bytes", report.entries, report.bytes);
        Ok(report)
    }

    fn write_snapshot(&self, snapshot: &DynastySnapshot) -> Result<SaveReport, SnapshotError> {
        let entries = snapshot.to_entries();
        let count = entries.len();
        let json = serde_json::to_string(&Value::Object(entries))?;
        self.storage.set(&keys::dynasty_key(&snapshot.id), &json)?;

        let profile = snapshot.session.coach_profile.clone().unwrap_or_default();
        self.upsert_summary(DynastySummary {
            id: snapshot.id.clone(),
            coach_name: profile.coach_name,
            school_name: profile.school_name,
            current_year: snapshot.session.current_year,
            last_played: Some(Utc::now()),
        })?;

        Ok(SaveReport {
            dynasty_id: snapshot.id.clone(),
            entries: count,
            bytes: json.len(),
        })
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Create a new dynasty blob with a blank first season. The new
    /// dynasty is not made active.
    pub fn create_dynasty(
        &self,
        profile: CoachProfile,
        start_year: u16,
    ) -> Result<DynastySummary, SnapshotError> {
        let mut snapshot = DynastySnapshot::new(self.new_dynasty_id());
        snapshot.session.coach_profile = Some(profile);
        snapshot.session.current_year = Some(start_year);
        snapshot.session.players = Some(Vec::new());
        snapshot.session.year_records = Some(Vec::new());
        let season = snapshot.season_mut(start_year);
        season.schedule = Some(blank_schedule());
        season.year_stats = Some(YearStats::default());
        snapshot
            .rankings
            .top25_history
            .entry(start_year)
            .or_default()
            .insert(0, blank_poll());

        self.write_snapshot(&snapshot)?;
        info!("created dynasty {} starting {start_year}", snapshot.id);
        self.summary(&snapshot.id)
            .ok_or_else(|| SnapshotError::NotFound(snapshot.id.clone()))
    }

    pub fn summary(&self, id: &str) -> Option<DynastySummary> {
        self.list_dynasties().into_iter().find(|d| d.id == id)
    }

    /// Remove a dynasty's blob, index entry and scoped keys. Clears the
    /// active pointer if it was the active dynasty. Returns `false` if
    /// nothing was stored for `id`.
    pub fn delete_dynasty(&self, id: &str) -> Result<bool, SnapshotError> {
        if !self.exists(id) {
            return Ok(false);
        }
        self.storage.remove(&keys::dynasty_key(id))?;

        let mut index = self.list_dynasties();
        index.retain(|d| d.id != id);
        encode(&self.storage, keys::DYNASTIES, &index)?;

        for key in self.storage.keys() {
            if keys::classify(&key).is_some_and(|kind| kind.dynasty_id() == Some(id)) {
                self.storage.remove(&key)?;
            }
        }

        if self.current_dynasty_id().as_deref() == Some(id) {
            self.clear_live_session()?;
            self.set_current_dynasty_id(None)?;
        }
        info!("deleted dynasty {id}");
        Ok(true)
    }

    /// Remove the session singletons and per-year keys of the active dynasty.
    fn clear_live_session(&self) -> Result<(), StorageError> {
        for &key in keys::SESSION_KEYS {
            self.storage.remove(key)?;
        }
        for key in self.storage.keys() {
            if keys::classify(&key).is_some_and(|kind| kind.dynasty_id().is_none()) {
                self.storage.remove(&key)?;
            }
        }
        Ok(())
    }

    /// Pretty-printed blob plus a `dynastyId` field.
    pub fn export_dynasty(&self, id: &str) -> Result<String, SnapshotError> {
        let snapshot = self.load_snapshot(id)?;
        let mut entries = snapshot.to_entries();
        entries.insert(EXPORT_ID_FIELD.into(), Value::from(id));
        Ok(serde_json::to_string_pretty(&Value::Object(entries))?)
    }

    /// Store an exported dynasty. A fresh id is assigned when the exported
    /// id is missing or already taken; dynasty-scoped entries follow it.
    pub fn import_dynasty(&self, json: &str) -> Result<DynastySummary, SnapshotError> {
        let Value::Object(mut map) = serde_json::from_str::<Value>(json)? else {
            return Err(SnapshotError::NotAnObject(EXPORT_ID_FIELD.into()));
        };
        let exported_id = match map.remove(EXPORT_ID_FIELD) {
            Some(Value::String(id)) if !id.trim().is_empty() => id,
            Some(Value::Number(n)) => n.to_string(),
            _ => scoped_owner(&map).unwrap_or_default(),
        };
        let source_id = if exported_id.is_empty() {
            "import".to_string()
        } else {
            exported_id.clone()
        };

        migrate(&mut map, &source_id)?;
        let snapshot = DynastySnapshot::from_entries(&source_id, &map);

        let id = if exported_id.is_empty() || self.exists(&exported_id) {
            self.new_dynasty_id()
        } else {
            exported_id
        };
        let snapshot = snapshot.with_id(id);
        self.write_snapshot(&snapshot)?;
        info!("imported dynasty {}", snapshot.id);
        self.summary(&snapshot.id)
            .ok_or_else(|| SnapshotError::NotFound(snapshot.id.clone()))
    }
}

const EXPORT_ID_FIELD: &str = "dynastyId";

/// The dynasty a raw blob's scoped keys belong to, when they name exactly
/// one.
fn scoped_owner(map: &SnapshotMap) -> Option<String> {
    let owners: BTreeSet<String> = map
        .keys()
        .filter_map(|key| keys::classify(key)?.dynasty_id().map(str::to_string))
        .collect();
    if owners.len() > 1 {
        warn!("import: blob has keys for several dynasties: {owners:?}");
    }
    if owners.len() == 1 {
        owners.into_iter().next()
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Game, GameResult, RecordBook, RecordEntry};

    fn test_manager() -> SnapshotManager {
        SnapshotManager::new(Storage::in_memory())
    }

    fn profile(school: &str) -> CoachProfile {
        CoachProfile {
            coach_name: "Coach".into(),
            school_name: school.into(),
            ..Default::default()
        }
    }

    fn record_book(holder: &str) -> RecordBook {
        RecordBook {
            entries: vec![RecordEntry {
                category: "Rushing Yards".into(),
                holder: holder.into(),
                value: 1500.0,
                ..Default::default()
            }],
        }
    }

    #[test]
    fn create_then_load_activates_dynasty() {
        let manager = test_manager();
        let summary = manager.create_dynasty(profile("Oregon"), 2025).unwrap();
        assert_eq!(summary.school_name, "Oregon");
        assert_eq!(summary.current_year, Some(2025));
        assert!(manager.current_dynasty_id().is_none());

        manager.load_dynasty(&summary.id).unwrap();
        assert_eq!(manager.current_dynasty_id(), Some(summary.id.clone()));
        let store = manager.entity_store();
        assert_eq!(store.current_year(), Some(2025));
        assert_eq!(store.coach_profile().school_name, "Oregon");
        assert!(store.has_schedule(2025));
    }

    #[test]
    fn ids_are_unique() {
        let manager = test_manager();
        let a = manager.create_dynasty(profile("A"), 2025).unwrap();
        let b = manager.create_dynasty(profile("B"), 2025).unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(manager.list_dynasties().len(), 2);
    }

    #[test]
    fn restore_clears_previous_session() {
        let manager = test_manager();
        let storage = manager.storage().clone();
        storage.set("players", "[{\"name\":\"Leftover\"}]").unwrap();
        storage.set("schedule_2019", "[]").unwrap();
        storage.set("teamStats_old_2019", "{}").unwrap();

        let snapshot = DynastySnapshot::new("abc");
        manager.restore_dynasty_from_snapshot(&snapshot).unwrap();

        assert_eq!(storage.get("players"), None);
        assert_eq!(storage.get("schedule_2019"), None);
        assert_eq!(storage.get("teamStats_old_2019"), None);
    }

    #[test]
    fn restore_preserves_records_missing_from_snapshot() {
        let manager = test_manager();
        let store = EntityStore::for_dynasty(manager.storage().clone(), "abc");
        store.set_records(&record_book("Ashton Jeanty")).unwrap();
        let before = manager.storage().get("records_abc");

        let report = manager
            .restore_dynasty_from_snapshot(&DynastySnapshot::new("abc"))
            .unwrap();
        assert_eq!(manager.storage().get("records_abc"), before);
        assert_eq!(report.preserved, vec!["records_abc".to_string()]);
    }

    #[test]
    fn restore_replaces_records_present_in_snapshot() {
        let manager = test_manager();
        let store = EntityStore::for_dynasty(manager.storage().clone(), "abc");
        store.set_records(&record_book("Old Holder")).unwrap();

        let mut snapshot = DynastySnapshot::new("abc");
        snapshot.records = Some(record_book("New Holder"));
        manager.restore_dynasty_from_snapshot(&snapshot).unwrap();

        assert_eq!(store.records(), record_book("New Holder"));
    }

    #[test]
    fn save_folds_live_keys_and_rankings() {
        let manager = test_manager();
        let summary = manager.create_dynasty(profile("Texas"), 2025).unwrap();
        manager.load_dynasty(&summary.id).unwrap();

        let store = manager.entity_store();
        let mut schedule = store.schedule(2025);
        schedule[1] = Game {
            week: 1,
            opponent: "Ohio State".into(),
            result: GameResult::Win,
            score: "31-14".into(),
            ..Default::default()
        };
        store.set_schedule(2025, &schedule).unwrap();
        store.set_records(&record_book("Quinn Ewers")).unwrap();
        manager.storage().set("records_someoneelse", "{}").unwrap();

        let mut rankings = RankingsState::default();
        rankings.advance.latest_unlocked_week = 4;
        let report = manager.save_dynasty_data(&summary.id, &rankings).unwrap();
        assert!(report.bytes > 0);

        let saved = manager.load_snapshot(&summary.id).unwrap();
        assert_eq!(saved.seasons[&2025].schedule.as_ref().unwrap()[1].opponent, "Ohio State");
        assert_eq!(saved.records, Some(record_book("Quinn Ewers")));
        assert_eq!(saved.rankings.advance.latest_unlocked_week, 4);
        assert!(saved.extra.is_empty());
        assert!(manager.summary(&summary.id).unwrap().last_played.is_some());
    }

    #[test]
    fn unknown_blob_entries_survive_load_and_save() {
        let manager = test_manager();
        manager
            .storage()
            .set(
                "dynasty_d1",
                r#"{"snapshotVersion":3,"currentYear":2025,"someFutureKey":[1,2,3]}"#,
            )
            .unwrap();

        manager.load_dynasty("d1").unwrap();
        assert_eq!(manager.storage().get("someFutureKey"), None);
        assert_eq!(manager.entity_store().current_year(), Some(2025));

        manager
            .save_dynasty_data("d1", &RankingsState::default())
            .unwrap();
        let saved = manager.load_snapshot("d1").unwrap();
        assert_eq!(saved.extra.get("someFutureKey"), Some(&serde_json::json!([1, 2, 3])));

        // switching away leaves nothing behind
        let other = manager.create_dynasty(profile("Rice"), 2030).unwrap();
        manager.load_dynasty(&other.id).unwrap();
        assert_eq!(manager.storage().get("someFutureKey"), None);
    }

    #[test]
    fn raw_blob_import_keeps_scoped_entries() {
        let manager = test_manager();
        let imported = manager
            .import_dynasty(
                r#"{"currentYear":2025,"coachProfile":{"schoolName":"Tulane"},
                    "records_1717":{"entries":[{"category":"Rushing Yards","holder":"Makhi Hughes","value":1401.0}]},
                    "teamStats_1717_2025":{}}"#,
            )
            .unwrap();
        assert_eq!(imported.id, "1717");
        assert_eq!(imported.school_name, "Tulane");

        let snapshot = manager.load_snapshot("1717").unwrap();
        let records = snapshot.records.expect("records kept");
        assert_eq!(records.entries[0].holder, "Makhi Hughes");
        assert!(snapshot.seasons[&2025].team_stats.is_some());
    }

    #[test]
    fn raw_blob_import_rescopes_on_collision() {
        let manager = test_manager();
        let blob = r#"{"currentYear":2025,"records_1717":{"entries":[]}}"#;
        manager.import_dynasty(blob).unwrap();
        let second = manager.import_dynasty(blob).unwrap();
        assert_ne!(second.id, "1717");

        let snapshot = manager.load_snapshot(&second.id).unwrap();
        assert_eq!(snapshot.records, Some(RecordBook::default()));
    }

    #[test]
    fn deleting_active_dynasty_clears_live_session() {
        let manager = test_manager();
        let summary = manager.create_dynasty(profile("Rice"), 2025).unwrap();
        manager.load_dynasty(&summary.id).unwrap();
        assert!(manager.storage().get(keys::CURRENT_YEAR).is_some());
        assert!(manager.storage().get(&keys::schedule_key(2025)).is_some());

        assert!(manager.delete_dynasty(&summary.id).unwrap());
        assert_eq!(manager.storage().get(keys::CURRENT_YEAR), None);
        assert_eq!(manager.storage().get(keys::COACH_PROFILE), None);
        assert_eq!(manager.storage().get(&keys::schedule_key(2025)), None);
    }

    #[test]
    fn deleting_inactive_dynasty_keeps_live_session() {
        let manager = test_manager();
        let active = manager.create_dynasty(profile("Rice"), 2025).unwrap();
        let other = manager.create_dynasty(profile("Navy"), 2025).unwrap();
        manager.load_dynasty(&active.id).unwrap();

        assert!(manager.delete_dynasty(&other.id).unwrap());
        assert_eq!(manager.entity_store().coach_profile().school_name, "Rice");
        assert!(manager.storage().get(&keys::schedule_key(2025)).is_some());
    }

    #[test]
    fn delete_removes_blob_index_and_scoped_keys() {
        let manager = test_manager();
        let summary = manager.create_dynasty(profile("Rice"), 2025).unwrap();
        manager.load_dynasty(&summary.id).unwrap();
        manager
            .entity_store()
            .set_records(&record_book("Someone"))
            .unwrap();

        assert!(manager.delete_dynasty(&summary.id).unwrap());
        assert!(manager.list_dynasties().is_empty());
        assert!(manager.current_dynasty_id().is_none());
        assert_eq!(manager.storage().get(&keys::records_key(&summary.id)), None);
        assert!(!manager.delete_dynasty(&summary.id).unwrap());
    }

    #[test]
    fn export_import_assigns_fresh_id_on_collision() {
        let manager = test_manager();
        let summary = manager.create_dynasty(profile("Navy"), 2025).unwrap();
        manager.load_dynasty(&summary.id).unwrap();
        manager
            .entity_store()
            .set_records(&record_book("Blake Horvath"))
            .unwrap();
        manager
            .save_dynasty_data(&summary.id, &RankingsState::default())
            .unwrap();

        let exported = manager.export_dynasty(&summary.id).unwrap();
        let imported = manager.import_dynasty(&exported).unwrap();
        assert_ne!(imported.id, summary.id);
        assert_eq!(imported.school_name, "Navy");

        let copy = manager.load_snapshot(&imported.id).unwrap();
        assert_eq!(copy.records, Some(record_book("Blake Horvath")));
    }

    #[test]
    fn import_into_empty_store_keeps_id() {
        let source = test_manager();
        let summary = source.create_dynasty(profile("Army"), 2030).unwrap();
        let exported = source.export_dynasty(&summary.id).unwrap();

        let target = test_manager();
        let imported = target.import_dynasty(&exported).unwrap();
        assert_eq!(imported.id, summary.id);
        assert_eq!(imported.current_year, Some(2030));
    }

    #[test]
    fn legacy_blob_is_migrated_on_load() {
        let manager = test_manager();
        manager
            .storage()
            .set(
                "dynasty_legacy",
                r#"{"currentYear":"2024","schedule_2024":[{"opponent":"Texas"}],"records":{"entries":[]}}"#,
            )
            .unwrap();
        let snapshot = manager.load_snapshot("legacy").unwrap();
        assert_eq!(snapshot.session.current_year, Some(2024));
        assert_eq!(snapshot.seasons[&2024].schedule.as_ref().unwrap().len(), 21);
        assert_eq!(snapshot.records, Some(RecordBook::default()));
    }

    #[test]
    fn missing_and_malformed_blobs_are_errors() {
        let manager = test_manager();
        assert!(matches!(
            manager.load_snapshot("nope"),
            Err(SnapshotError::NotFound(_))
        ));
        manager.storage().set("dynasty_bad", "[1,2,3]").unwrap();
        assert!(matches!(
            manager.load_snapshot("bad"),
            Err(SnapshotError::NotAnObject(_))
        ));
    }
}
