// Integration tests for the dynasty tracker core.
//
// These exercise the library through its public API: the snapshot manager
// and dynasty context working over a shared store, season rollover, user
// tenures, export/import, and persistence through the SQLite backend.

use std::sync::Arc;

use dynasty_core::codec::EntityStore;
use dynasty_core::context::DynastyContext;
use dynasty_core::db::SqliteStore;
use dynasty_core::keys;
use dynasty_core::kv::Storage;
use dynasty_core::model::{
    CoachProfile, Game, GameResult, Location, RankedTeam, RecordBook, RecordEntry, RecordScope,
};
use dynasty_core::opponents::OpponentTracker;
use dynasty_core::snapshot::SnapshotManager;
use dynasty_core::stats::calculate_stats;
use dynasty_core::users::{add_user, head_to_head, update_user_team};

// ===========================================================================
// Test helpers
// ===========================================================================

fn michigan() -> CoachProfile {
    CoachProfile {
        coach_name: "Pat Doyle".into(),
        school_name: "Michigan".into(),
        ..Default::default()
    }
}

fn game(week: u8, opponent: &str, result: GameResult, score: &str) -> Game {
    Game {
        week,
        location: Location::Home,
        opponent: opponent.into(),
        result,
        score: score.into(),
        user_id: None,
    }
}

/// A context with a freshly created 2025 dynasty loaded.
fn loaded_context(storage: Storage) -> (DynastyContext, String) {
    let mut ctx = DynastyContext::new(storage);
    let summary = ctx.manager().create_dynasty(michigan(), 2025).unwrap();
    ctx.open_dynasty(&summary.id).unwrap();
    (ctx, summary.id)
}

fn ranked(teams: &[&str]) -> Vec<RankedTeam> {
    teams
        .iter()
        .enumerate()
        .map(|(i, team)| RankedTeam {
            rank: i as u8 + 1,
            team: team.to_string(),
            record: None,
        })
        .collect()
}

// ===========================================================================
// Season flow
// ===========================================================================

#[test]
fn first_win_then_bye_sets_stats_and_active_week() {
    let (mut ctx, id) = loaded_context(Storage::in_memory());
    let store = ctx.entity_store();

    let mut schedule = store.schedule(2025);
    schedule[1] = game(1, "Ohio State", GameResult::Win, "31-14");
    schedule[2] = game(2, "BYE", GameResult::Bye, "");
    store.set_schedule(2025, &schedule).unwrap();

    let stats = calculate_stats(&schedule, "Michigan", &store.team_directory());
    assert_eq!(stats.wins, 1);
    assert_eq!(stats.losses, 0);
    assert_eq!(stats.points_scored, 31);
    assert_eq!(stats.points_against, 14);

    ctx.set_current_dynasty_id(Some(&id)).unwrap();
    assert_eq!(ctx.active_week(), 2);
    assert_eq!(ctx.latest_unlocked_week(), 2);
}

#[test]
fn unlock_frontier_keeps_highest_week() {
    let (mut ctx, _) = loaded_context(Storage::in_memory());
    for week in [3, 1, 7, 2] {
        assert!(ctx.set_active_week(week));
    }
    assert_eq!(ctx.active_week(), 2);
    assert_eq!(ctx.latest_unlocked_week(), 7);

    // the frontier survives a save and reload
    let id = ctx.dynasty_id().unwrap().to_string();
    ctx.save_dynasty_data().unwrap();
    let stored = ctx.manager().load_snapshot(&id).unwrap();
    assert_eq!(stored.rankings.advance.latest_unlocked_week, 7);
}

#[test]
fn rankings_lookup_carries_earlier_poll_forward() {
    let (mut ctx, _) = loaded_context(Storage::in_memory());
    ctx.update_rankings_for_week(2025, 4, ranked(&["Georgia", "Texas"]));
    ctx.update_rankings_for_week(2025, 9, ranked(&["Texas", "Georgia"]));

    assert_eq!(ctx.get_rankings_for_week(2025, 6)[0].team, "Georgia");
    assert_eq!(ctx.get_rankings_for_week(2025, 9)[0].team, "Texas");
    assert_eq!(ctx.get_rankings_for_week(2025, 15)[0].team, "Texas");
    assert_eq!(ctx.get_rankings_for_week(2025, 15).len(), 25);
}

#[test]
fn season_rollover_through_the_context() {
    let (mut ctx, id) = loaded_context(Storage::in_memory());
    let store = ctx.entity_store();

    let mut schedule = store.schedule(2025);
    schedule[0] = game(0, "Iowa", GameResult::Win, "24-10");
    schedule[1] = game(1, "Ohio State", GameResult::Loss, "17-20");
    store.set_schedule(2025, &schedule).unwrap();
    ctx.update_rankings_for_week(2025, 20, ranked(&["Ohio State", "Michigan"]));

    assert_eq!(ctx.prepare_next_season().unwrap(), 2026);

    let record = store.year_record(2025).expect("placeholder record");
    assert_eq!(record.overall_record, "1-1");
    assert_eq!(store.year_stats(2025).wins, 1);
    assert!(store.has_schedule(2026));
    assert_eq!(ctx.get_rankings_for_week(2026, 0)[1].team, "Michigan");

    let summary = ctx.manager().summary(&id).unwrap();
    assert_eq!(summary.current_year, Some(2026));
}

// ===========================================================================
// Snapshots
// ===========================================================================

#[test]
fn restoring_an_older_save_keeps_accumulated_records() {
    let storage = Storage::in_memory();
    let manager = SnapshotManager::new(storage.clone());
    let id = manager.create_dynasty(michigan(), 2025).unwrap().id;
    manager.load_dynasty(&id).unwrap();

    let store = EntityStore::for_dynasty(storage.clone(), id.clone());
    let book = RecordBook {
        entries: vec![RecordEntry {
            category: "Passing Yards".into(),
            scope: RecordScope::Season,
            holder: "J.J. McCarthy".into(),
            value: 4012.0,
            year: Some(2025),
        }],
    };
    store.set_records(&book).unwrap();

    // the stored blob predates the records
    let older = manager.load_snapshot(&id).unwrap();
    assert!(older.records.is_none());
    let report = manager.restore_dynasty_from_snapshot(&older).unwrap();

    assert_eq!(report.preserved, vec![keys::records_key(&id)]);
    assert_eq!(store.records(), book);
    assert_eq!(manager.current_dynasty_id().as_deref(), Some(id.as_str()));
}

#[test]
fn switching_dynasties_swaps_live_keys() {
    let storage = Storage::in_memory();
    let (mut ctx, first) = loaded_context(storage.clone());
    let store = ctx.entity_store();
    let mut schedule = store.schedule(2025);
    schedule[0] = game(0, "Iowa", GameResult::Win, "24-10");
    store.set_schedule(2025, &schedule).unwrap();
    ctx.save_dynasty_data().unwrap();

    let second = ctx
        .manager()
        .create_dynasty(
            CoachProfile {
                school_name: "Texas".into(),
                ..Default::default()
            },
            2030,
        )
        .unwrap()
        .id;
    ctx.open_dynasty(&second).unwrap();
    let store = ctx.entity_store();
    assert_eq!(store.coach_profile().school_name, "Texas");
    assert_eq!(store.current_year(), Some(2030));
    assert!(!store.has_schedule(2025));

    ctx.open_dynasty(&first).unwrap();
    let store = ctx.entity_store();
    assert_eq!(store.schedule(2025)[0].opponent, "Iowa");
    assert_eq!(ctx.active_week(), 1);
    assert_eq!(ctx.manager().list_dynasties().len(), 2);
}

#[test]
fn export_then_import_into_a_fresh_store() {
    let (mut ctx, id) = loaded_context(Storage::in_memory());
    ctx.update_rankings_for_week(2025, 3, ranked(&["Oregon"]));
    ctx.set_others_receiving_votes(2025, 3, "Army 4");
    ctx.save_dynasty_data().unwrap();
    let exported = ctx.manager().export_dynasty(&id).unwrap();

    let target = SnapshotManager::new(Storage::in_memory());
    let imported = target.import_dynasty(&exported).unwrap();
    assert_eq!(imported.id, id);
    assert_eq!(imported.school_name, "Michigan");

    let snapshot = target.load_snapshot(&id).unwrap();
    assert_eq!(snapshot.rankings.top25_history[&2025][&3][0].team, "Oregon");
    assert_eq!(snapshot.rankings.others_receiving_votes[&2025][&3], "Army 4");

    // a second import collides and gets a new id
    let again = target.import_dynasty(&exported).unwrap();
    assert_ne!(again.id, id);
    assert_eq!(target.list_dynasties().len(), 2);
}

// ===========================================================================
// Users and opponents
// ===========================================================================

#[test]
fn user_tenures_follow_team_changes() {
    let (ctx, _) = loaded_context(Storage::in_memory());
    let store = ctx.entity_store();

    let sam = add_user(&store, "Sam", Some("Texas")).unwrap();
    store.set_current_year(2027).unwrap();
    let sam = update_user_team(&store, &sam.id, Some("Oregon")).unwrap();

    assert_eq!(sam.team_for_year(2025), Some("Texas"));
    assert_eq!(sam.team_for_year(2026), Some("Texas"));
    assert_eq!(sam.team_for_year(2027), Some("Oregon"));
    assert_eq!(sam.open_tenures(), 1);
    assert_eq!(store.user_controlled_teams(), vec!["Oregon".to_string()]);
    assert_eq!(store.user_team_mappings(2027).get("Oregon"), Some(&sam.id));

    let mut schedule = store.schedule(2025);
    schedule[3] = game(3, "Texas", GameResult::Loss, "21-28");
    store.set_schedule(2025, &schedule).unwrap();
    let mut schedule = store.schedule(2027);
    schedule[5] = game(5, "Oregon", GameResult::Win, "35-7");
    store.set_schedule(2027, &schedule).unwrap();

    let records = head_to_head(&store.users(), &store.all_schedules());
    assert_eq!(records.len(), 1);
    assert_eq!((records[0].wins, records[0].losses), (1, 1));
}

#[test]
fn opponent_tracker_sees_schedule_edits_from_another_handle() {
    let storage = Storage::in_memory();
    let (ctx, id) = loaded_context(storage.clone());
    let mut tracker = OpponentTracker::open(ctx.entity_store());
    let jordan = tracker.add_opponent("Jordan", Some("Penn State")).unwrap();
    assert_eq!(tracker.summaries()[0].games(), 0);

    let other = EntityStore::for_dynasty(storage.open_tab(), id);
    let mut schedule = other.schedule(2025);
    schedule[10] = game(10, "Penn State", GameResult::Win, "27-24");
    other.set_schedule(2025, &schedule).unwrap();

    assert!(tracker.poll_external());
    let summary = &tracker.summaries()[0];
    assert_eq!(summary.opponent_id, jordan.id);
    assert_eq!(summary.wins, 1);
}

// ===========================================================================
// Durable backend
// ===========================================================================

#[test]
fn sqlite_backend_survives_reopen() {
    let dir = std::env::temp_dir().join("dynasty_integration_sqlite");
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("tracker.db");
    let path = path.to_str().unwrap();

    let id = {
        let storage = Storage::new(Arc::new(SqliteStore::open(path).unwrap()));
        let (mut ctx, id) = loaded_context(storage);
        ctx.update_rankings_for_week(2025, 2, ranked(&["Michigan"]));
        ctx.set_active_week(5);
        ctx.save_dynasty_data().unwrap();
        id
    };

    let storage = Storage::new(Arc::new(SqliteStore::open(path).unwrap()));
    let mut ctx = DynastyContext::new(storage);
    let active = ctx.manager().current_dynasty_id();
    assert_eq!(active.as_deref(), Some(id.as_str()));

    ctx.set_current_dynasty_id(Some(&id)).unwrap();
    assert_eq!(ctx.current_year(), Some(2025));
    assert_eq!(ctx.latest_unlocked_week(), 5);
    assert_eq!(ctx.get_rankings_for_week(2025, 3)[0].team, "Michigan");
    assert_eq!(ctx.entity_store().coach_profile().coach_name, "Pat Doyle");

    let _ = std::fs::remove_dir_all(&dir);
}
