// Season rollover: roster progression and seeding the next year's records.

use thiserror::Error;
use tracing::{debug, info};

use crate::codec::EntityStore;
use crate::kv::StorageError;
use crate::model::{
    blank_schedule, ClassLevel, ClassYear, Player, Recruit, Transfer, TransferDirection, YearStats,
};
use crate::stats::{calculate_stats, placeholder_year_record};

#[derive(Debug, Error)]
pub enum SeasonError {
    #[error("no current year is set for this dynasty")]
    NoCurrentYear,

    #[error("season {0} is the last supported year")]
    YearOverflow(u16),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Roll a roster forward from `finished_season` into the next one.
///
/// Departing players (drafted, transferring, graduating seniors) are
/// dropped before anything is modified. Redshirted players stay at their
/// level and gain the `(RS)` marker; everyone else moves up a class.
/// Recruits from the finished cycle join as freshmen and incoming transfers
/// keep their listed class. New players get ids above every existing id.
pub fn progress_roster_for_new_season(
    players: &[Player],
    finished_season: u16,
    recruits: &[Recruit],
    transfers: &[Transfer],
) -> Vec<Player> {
    let mut next_id = players.iter().map(|p| p.id).max().map_or(1, |max| max + 1);

    let mut roster: Vec<Player> = players
        .iter()
        .filter(|p| !p.is_drafted && !p.is_transferring && !graduates(p))
        .cloned()
        .map(|mut player| {
            advance_class(&mut player, finished_season);
            player
        })
        .collect();

    for recruit in recruits.iter().filter(|r| r.recruited_year == finished_season) {
        roster.push(Player {
            id: next_id,
            name: recruit.name.clone(),
            position: recruit.position.clone(),
            year: ClassYear::new(ClassLevel::Freshman, false).to_string(),
            rating: recruit.rating,
            dev_trait: recruit.dev_trait,
            ..Default::default()
        });
        next_id += 1;
    }

    for transfer in transfers
        .iter()
        .filter(|t| t.year == finished_season && t.direction == TransferDirection::Incoming)
    {
        let year = ClassYear::parse(&transfer.class_year)
            .map(|class| class.to_string())
            .unwrap_or_else(|| transfer.class_year.clone());
        roster.push(Player {
            id: next_id,
            name: transfer.name.clone(),
            position: transfer.position.clone(),
            year,
            rating: transfer.rating,
            ..Default::default()
        });
        next_id += 1;
    }

    roster
}

fn graduates(player: &Player) -> bool {
    player
        .class_year()
        .is_some_and(|class| class.level == ClassLevel::Senior && !player.is_redshirted)
}

fn advance_class(player: &mut Player, finished_season: u16) {
    let Some(class) = player.class_year() else {
        debug!("leaving unrecognised class year {:?} for {}", player.year, player.name);
        player.is_redshirted = false;
        return;
    };

    let next = if player.is_redshirted {
        if !player.redshirted_years.contains(&finished_season) {
            player.redshirted_years.push(finished_season);
        }
        ClassYear::new(class.level, true)
    } else {
        // graduating seniors were filtered out already
        ClassYear::new(class.level.next().unwrap_or(class.level), class.redshirt)
    };

    player.year = next.to_string();
    player.is_redshirted = false;
}

/// Close out the current season and open the next one. Returns the new
/// year.
///
/// The finished season gets its final stats and, if the user never wrote
/// one, a placeholder year record. The roster is rolled, `currentYear`
/// advances, and the new year starts with a blank schedule and zeroed
/// stats unless those already exist.
pub fn prepare_next_season(store: &EntityStore) -> Result<u16, SeasonError> {
    let current = store.current_year().ok_or(SeasonError::NoCurrentYear)?;
    let next = current
        .checked_add(1)
        .ok_or(SeasonError::YearOverflow(current))?;

    let directory = store.team_directory();
    let profile = store.coach_profile();
    let schedule = store.schedule(current);

    let final_stats = calculate_stats(&schedule, &profile.school_name, &directory);
    store.set_year_stats(current, &final_stats)?;

    if store.year_record(current).is_none() {
        let record = placeholder_year_record(current, &schedule, &profile.school_name, &directory);
        store.set_year_record(&record)?;
    }

    let players = store.players();
    let roster = progress_roster_for_new_season(
        &players,
        current,
        &store.all_recruits(),
        &store.all_transfers(),
    );
    store.set_players(&roster)?;

    store.set_current_year(next)?;
    seed_season(store, next)?;

    info!(
        "advanced season {current} -> {next}: {} players carried, {} on new roster",
        players.len(),
        roster.len()
    );
    Ok(next)
}

/// Seed the first season of a new dynasty without touching the roster.
pub fn start_first_season(store: &EntityStore, year: u16) -> Result<(), SeasonError> {
    store.set_current_year(year)?;
    seed_season(store, year)?;
    info!("started first season {year}");
    Ok(())
}

fn seed_season(store: &EntityStore, year: u16) -> Result<(), StorageError> {
    if !store.has_schedule(year) {
        store.set_schedule(year, &blank_schedule())?;
    }
    if store.storage().get(&crate::keys::year_stats_key(year)).is_none() {
        store.set_year_stats(year, &YearStats::default())?;
    }
    Ok(())
}
