// Head-to-head matchups against declared opponents, derived from the stored
// schedules, plus the "who controls which team" mirrors.

mod tracker;

pub use tracker::OpponentTracker;

use std::collections::{BTreeMap, BTreeSet, HashMap};

use tracing::debug;

use crate::codec::EntityStore;
use crate::kv::StorageError;
use crate::model::{Game, GameResult, Matchup, Opponent, Outcome, User};

// ---------------------------------------------------------------------------
// Derivation
// ---------------------------------------------------------------------------

fn outcome_of(result: GameResult) -> Option<Outcome> {
    match result {
        GameResult::Win => Some(Outcome::Win),
        GameResult::Loss => Some(Outcome::Loss),
        GameResult::Tie => Some(Outcome::Tie),
        GameResult::Bye | GameResult::NotPlayed => None,
    }
}

/// One matchup per played game against a team an opponent controlled that
/// season. Games with a malformed score are skipped.
pub fn derive_matchups(opponents: &[Opponent], schedules: &BTreeMap<u16, Vec<Game>>) -> Vec<Matchup> {
    let mut matchups = Vec::new();

    for opponent in opponents {
        for (&season, schedule) in schedules {
            let Some(team) = opponent.team_for_season(season) else {
                continue;
            };
            let team = team.trim();

            for game in schedule
                .iter()
                .filter(|g| g.is_played() && g.opponent.trim().eq_ignore_ascii_case(team))
            {
                let Some(outcome) = outcome_of(game.result) else {
                    continue;
                };
                let Some((points_for, points_against)) = game.parse_score() else {
                    debug!(
                        "skipping {season} week {} vs {team}: malformed score {:?}",
                        game.week, game.score
                    );
                    continue;
                };
                matchups.push(Matchup {
                    opponent_id: opponent.id.clone(),
                    season,
                    week: game.week,
                    team: game.opponent.clone(),
                    location: game.location,
                    outcome,
                    points_for,
                    points_against,
                });
            }
        }
    }

    matchups
}

/// Aggregate record against one opponent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OpponentSummary {
    pub opponent_id: String,
    pub name: String,
    pub wins: u32,
    pub losses: u32,
    pub ties: u32,
    pub points_for: u32,
    pub points_against: u32,
}

impl OpponentSummary {
    pub fn games(&self) -> u32 {
        self.wins + self.losses + self.ties
    }
}

/// Per-opponent totals, most-played rivalry first, then by name.
pub fn summarize(opponents: &[Opponent], matchups: &[Matchup]) -> Vec<OpponentSummary> {
    let mut summaries: Vec<OpponentSummary> = opponents
        .iter()
        .map(|opponent| {
            matchups
                .iter()
                .filter(|m| m.opponent_id == opponent.id)
                .fold(
                    OpponentSummary {
                        opponent_id: opponent.id.clone(),
                        name: opponent.name.clone(),
                        ..Default::default()
                    },
                    |mut acc, m| {
                        match m.outcome {
                            Outcome::Win => acc.wins += 1,
                            Outcome::Loss => acc.losses += 1,
                            Outcome::Tie => acc.ties += 1,
                        }
                        acc.points_for = acc.points_for.saturating_add(m.points_for);
                        acc.points_against = acc.points_against.saturating_add(m.points_against);
                        acc
                    },
                )
        })
        .collect();

    summaries.sort_by(|a, b| b.games().cmp(&a.games()).then_with(|| a.name.cmp(&b.name)));
    summaries
}

// ---------------------------------------------------------------------------
// Reverse lookup
// ---------------------------------------------------------------------------

/// `"<season>:<team>"` and `"default:<team>"` to opponent.
#[derive(Debug, Default)]
pub struct OpponentIndex<'a> {
    entries: HashMap<String, &'a Opponent>,
}

impl<'a> OpponentIndex<'a> {
    pub fn build(opponents: &'a [Opponent]) -> Self {
        let mut entries = HashMap::new();
        for opponent in opponents {
            if let Some(team) = opponent.default_team.as_deref().filter(|t| !t.trim().is_empty()) {
                entries.insert(default_key(team), opponent);
            }
            for (&season, team) in &opponent.team_history {
                if !team.trim().is_empty() {
                    entries.insert(season_key(season, team), opponent);
                }
            }
        }
        OpponentIndex { entries }
    }

    /// The opponent controlling `team` in `season`. A season assignment wins
    /// over a default one.
    pub fn lookup(&self, team: &str, season: u16) -> Option<&'a Opponent> {
        self.entries
            .get(&season_key(season, team))
            .or_else(|| self.entries.get(&default_key(team)))
            .copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn season_key(season: u16, team: &str) -> String {
    format!("{season}:{}", team.trim().to_lowercase())
}

fn default_key(team: &str) -> String {
    format!("default:{}", team.trim().to_lowercase())
}

// ---------------------------------------------------------------------------
// Controlled-team mirrors
// ---------------------------------------------------------------------------

/// Rewrite `userControlledTeams` from the users' current teams and
/// `userTeamMappings_<year>` from their tenures in `year`.
pub fn sync_user_controlled_teams(
    store: &EntityStore,
    users: &[User],
    year: u16,
) -> Result<(), StorageError> {
    let controlled: Vec<String> = users
        .iter()
        .filter_map(|u| u.current_team.as_deref())
        .map(str::trim)
        .filter(|team| !team.is_empty())
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let mappings: BTreeMap<String, String> = users
        .iter()
        .filter_map(|u| Some((u.team_for_year(year)?.to_string(), u.id.clone())))
        .collect();

    store.set_user_controlled_teams(&controlled)?;
    store.set_user_team_mappings(year, &mappings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Location;

    fn opponent(id: &str, name: &str, default_team: Option<&str>) -> Opponent {
        Opponent {
            id: id.into(),
            name: name.into(),
            default_team: default_team.map(str::to_string),
            team_history: BTreeMap::new(),
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

    #[test]
    fn matchups_follow_season_overrides() {
        let mut jordan = opponent("o1", "Jordan", Some("Michigan"));
        jordan.team_history.insert(2026, "Penn State".into());

        let schedules = BTreeMap::from([
            (
                2025,
                vec![
                    game(12, "Michigan", GameResult::Win, "42-27"),
                    game(13, "Penn State", GameResult::Loss, "10-20"),
                ],
            ),
            (
                2026,
                vec![
                    game(8, "Michigan", GameResult::Win, "28-3"),
                    game(9, "Penn State", GameResult::Tie, "17-17"),
                ],
            ),
        ]);

        let matchups = derive_matchups(&[jordan], &schedules);
        assert_eq!(matchups.len(), 2);
        assert_eq!((matchups[0].season, matchups[0].team.as_str()), (2025, "Michigan"));
        assert_eq!(matchups[0].outcome, Outcome::Win);
        assert_eq!((matchups[1].season, matchups[1].team.as_str()), (2026, "Penn State"));
        assert_eq!(matchups[1].outcome, Outcome::Tie);
    }

    #[test]
    fn unplayed_and_malformed_games_are_skipped() {
        let schedules = BTreeMap::from([(
            2025,
            vec![
                game(1, "Texas", GameResult::NotPlayed, ""),
                game(2, "Texas", GameResult::Win, "forfeit"),
                game(3, "Texas", GameResult::Loss, "14-21"),
            ],
        )]);
        let matchups = derive_matchups(&[opponent("o1", "Riley", Some("Texas"))], &schedules);
        assert_eq!(matchups.len(), 1);
        assert_eq!(matchups[0].points_against, 21);
    }

    #[test]
    fn opponent_without_team_has_no_matchups() {
        let schedules = BTreeMap::from([(2025, vec![game(1, "Texas", GameResult::Win, "1-0")])]);
        assert!(derive_matchups(&[opponent("o1", "Riley", None)], &schedules).is_empty());
    }

    #[test]
    fn summaries_sort_by_games_then_name() {
        let opponents = vec![
            opponent("o1", "Zed", Some("Texas")),
            opponent("o2", "Amy", Some("Rice")),
            opponent("o3", "Bo", Some("Navy")),
        ];
        let schedules = BTreeMap::from([(
            2025,
            vec![
                game(1, "Texas", GameResult::Win, "30-10"),
                game(2, "Texas", GameResult::Loss, "7-10"),
                game(3, "Rice", GameResult::Win, "50-0"),
            ],
        )]);
        let summaries = summarize(&opponents, &derive_matchups(&opponents, &schedules));
        let names: Vec<&str> = summaries.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Zed", "Amy", "Bo"]);
        assert_eq!((summaries[0].wins, summaries[0].losses), (1, 1));
        assert_eq!(summaries[0].points_for, 37);
        assert_eq!(summaries[2].games(), 0);
    }

    #[test]
    fn summary_points_saturate() {
        let opponents = vec![opponent("o1", "Riley", Some("Texas"))];
        let schedules = BTreeMap::from([(
            2025,
            vec![
                game(1, "Texas", GameResult::Win, "4000000000-3"),
                game(2, "Texas", GameResult::Win, "4000000000-3"),
            ],
        )]);
        let summaries = summarize(&opponents, &derive_matchups(&opponents, &schedules));
        assert_eq!(summaries[0].wins, 2);
        assert_eq!(summaries[0].points_for, u32::MAX);
        assert_eq!(summaries[0].points_against, 6);
    }

    #[test]
    fn index_prefers_season_assignment() {
        let mut jordan = opponent("o1", "Jordan", Some("Michigan"));
        jordan.team_history.insert(2026, "Penn State".into());
        let casey = opponent("o2", "Casey", Some("Penn State"));
        let opponents = vec![jordan, casey];

        let index = OpponentIndex::build(&opponents);
        assert_eq!(index.lookup("Penn State", 2026).unwrap().id, "o1");
        assert_eq!(index.lookup("penn state", 2025).unwrap().id, "o2");
        assert_eq!(index.lookup("Michigan", 2030).unwrap().id, "o1");
        assert!(index.lookup("Rice", 2025).is_none());
    }
}
