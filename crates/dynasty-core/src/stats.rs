// Season statistics derived from a schedule. Everything here is pure.

use crate::model::{Game, GameResult, YearRecord, YearStats, WEEKS_PER_SEASON};
use crate::teams::TeamDirectory;

/// Tally wins, losses, ties and points for a season.
///
/// Only games with an opponent and a decided result count. Conference
/// counters move only when both the dynasty school and the opponent have a
/// known conference and the two match. A malformed score still counts toward
/// the record but contributes no points.
pub fn calculate_stats(schedule: &[Game], school_name: &str, directory: &TeamDirectory) -> YearStats {
    let school_conference = directory.conference_of(school_name);
    let mut stats = YearStats::default();

    for game in schedule.iter().filter(|g| g.is_played()) {
        let in_conference = school_conference.is_some()
            && directory
                .conference_of(&game.opponent)
                .is_some_and(|conf| Some(conf) == school_conference);

        match game.result {
            GameResult::Win => {
                stats.wins += 1;
                if in_conference {
                    stats.conference_wins += 1;
                }
            }
            GameResult::Loss => {
                stats.losses += 1;
                if in_conference {
                    stats.conference_losses += 1;
                }
            }
            GameResult::Tie => {
                stats.ties += 1;
                if in_conference {
                    stats.conference_ties += 1;
                }
            }
            GameResult::Bye | GameResult::NotPlayed => {}
        }

        if let Some((ours, theirs)) = game.parse_score() {
            stats.points_scored = stats.points_scored.saturating_add(ours);
            stats.points_against = stats.points_against.saturating_add(theirs);
        }
    }

    stats
}

/// `"10-2"`, or `"9-3-1"` when ties occurred.
pub fn format_record(wins: u32, losses: u32, ties: u32) -> String {
    if ties > 0 {
        format!("{wins}-{losses}-{ties}")
    } else {
        format!("{wins}-{losses}")
    }
}

/// A year record with only the computed fields filled in, used when a season
/// ends without the user having written one.
pub fn placeholder_year_record(
    year: u16,
    schedule: &[Game],
    school_name: &str,
    directory: &TeamDirectory,
) -> YearRecord {
    let stats = calculate_stats(schedule, school_name, directory);
    YearRecord {
        year,
        overall_record: format_record(stats.wins, stats.losses, stats.ties),
        conference_record: format_record(
            stats.conference_wins,
            stats.conference_losses,
            stats.conference_ties,
        ),
        points_for: stats.points_scored,
        points_against: stats.points_against,
        ..Default::default()
    }
}

/// The week the season is currently on: the slot after the last game with a
/// recorded result, capped at the season length. Zero before any game.
pub fn active_week(schedule: &[Game]) -> u8 {
    schedule
        .iter()
        .enumerate()
        .filter(|(_, game)| game.is_played())
        .map(|(idx, game)| game.week.max(idx as u8))
        .max()
        .map_or(0, |last| (last as usize + 1).min(WEEKS_PER_SEASON) as u8)
}
