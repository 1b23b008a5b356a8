// Human users: team tenures and head-to-head records.

use std::collections::BTreeMap;

use thiserror::Error;
use tracing::info;

use crate::codec::EntityStore;
use crate::kv::StorageError;
use crate::model::{Game, GameResult, TeamTenure, User};
use crate::opponents::sync_user_controlled_teams;

#[derive(Debug, Error)]
pub enum UserError {
    #[error("unknown user `{0}`")]
    UnknownUser(String),

    #[error("user name must not be empty")]
    EmptyName,

    #[error("no current year is set for this dynasty")]
    NoCurrentYear,

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl User {
    /// Move the user to `team` as of `current_year`. The open tenure closes
    /// at the previous season and a new one opens. Returns `false` when
    /// `team` is already the current team.
    pub fn assign_team(&mut self, team: &str, current_year: u16) -> bool {
        let team = team.trim();
        if team.is_empty() {
            return self.release_team(current_year);
        }
        if self
            .current_team
            .as_deref()
            .is_some_and(|current| current.eq_ignore_ascii_case(team))
        {
            return false;
        }

        self.close_open_tenure(current_year);
        self.team_history.push(TeamTenure {
            team_id: team.to_string(),
            start_year: current_year,
            end_year: None,
        });
        self.current_team = Some(team.to_string());
        true
    }

    /// Leave the current team without taking another. Returns `false` if
    /// the user had no team.
    pub fn release_team(&mut self, current_year: u16) -> bool {
        if self.current_team.is_none() {
            return false;
        }
        self.close_open_tenure(current_year);
        self.current_team = None;
        true
    }

    fn close_open_tenure(&mut self, current_year: u16) {
        for tenure in self.team_history.iter_mut().filter(|t| t.is_open()) {
            tenure.end_year = Some(current_year.saturating_sub(1));
        }
    }

    /// Team controlled during `year`, if any.
    pub fn team_for_year(&self, year: u16) -> Option<&str> {
        self.team_history
            .iter()
            .rev()
            .find(|tenure| tenure.covers(year))
            .map(|tenure| tenure.team_id.as_str())
    }

    pub fn open_tenures(&self) -> usize {
        self.team_history.iter().filter(|t| t.is_open()).count()
    }
}

/// The user controlling `team` in `year`.
pub fn user_controlling<'a>(users: &'a [User], team: &str, year: u16) -> Option<&'a User> {
    let team = team.trim();
    users.iter().find(|user| {
        user.team_for_year(year)
            .is_some_and(|controlled| controlled.eq_ignore_ascii_case(team))
    })
}

/// Change a user's team in the current season and refresh the
/// controlled-team mirrors. `None` releases the user's team.
pub fn update_user_team(
    store: &EntityStore,
    user_id: &str,
    team: Option<&str>,
) -> Result<User, UserError> {
    let year = store.current_year().ok_or(UserError::NoCurrentYear)?;
    let mut users = store.users();
    let user = users
        .iter_mut()
        .find(|u| u.id == user_id)
        .ok_or_else(|| UserError::UnknownUser(user_id.to_string()))?;

    let changed = match team {
        Some(team) => user.assign_team(team, year),
        None => user.release_team(year),
    };
    let updated = user.clone();

    if changed {
        store.set_users(&users)?;
        sync_user_controlled_teams(store, &users, year)?;
        info!("user {} now controls {:?} in {year}", updated.name, updated.current_team);
    }
    Ok(updated)
}

/// Register a new user, optionally with a starting team.
pub fn add_user(store: &EntityStore, name: &str, team: Option<&str>) -> Result<User, UserError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(UserError::EmptyName);
    }
    let mut users = store.users();
    let next = users
        .iter()
        .filter_map(|u| u.id.strip_prefix("user-")?.parse::<u32>().ok())
        .max()
        .map_or(1, |max| max + 1);

    let mut user = User {
        id: format!("user-{next}"),
        name: name.to_string(),
        ..Default::default()
    };
    let year = store.current_year();
    if let (Some(team), Some(year)) = (team, year) {
        user.assign_team(team, year);
    }
    users.push(user.clone());
    store.set_users(&users)?;
    if let Some(year) = year {
        sync_user_controlled_teams(store, &users, year)?;
    }
    Ok(user)
}

pub fn remove_user(store: &EntityStore, user_id: &str) -> Result<User, UserError> {
    let mut users = store.users();
    let idx = users
        .iter()
        .position(|u| u.id == user_id)
        .ok_or_else(|| UserError::UnknownUser(user_id.to_string()))?;
    let removed = users.remove(idx);
    store.set_users(&users)?;
    if let Some(year) = store.current_year() {
        sync_user_controlled_teams(store, &users, year)?;
    }
    Ok(removed)
}

/// Record of the dynasty school against one user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeadToHead {
    pub user_id: String,
    pub name: String,
    pub wins: u32,
    pub losses: u32,
    pub ties: u32,
}

impl HeadToHead {
    pub fn games(&self) -> u32 {
        self.wins + self.losses + self.ties
    }
}

/// Head-to-head records against every user with at least one game.
///
/// A game is attributed through its explicit `user_id` link when present,
/// otherwise to whoever controlled the opponent that season.
pub fn head_to_head(users: &[User], schedules: &BTreeMap<u16, Vec<Game>>) -> Vec<HeadToHead> {
    let mut records: BTreeMap<&str, HeadToHead> = BTreeMap::new();

    for (&year, schedule) in schedules {
        for game in schedule.iter().filter(|g| g.is_played()) {
            let linked = game
                .user_id
                .as_deref()
                .and_then(|id| users.iter().find(|u| u.id == id));
            let Some(user) = linked.or_else(|| user_controlling(users, &game.opponent, year))
            else {
                continue;
            };

            let entry = records.entry(user.id.as_str()).or_insert_with(|| HeadToHead {
                user_id: user.id.clone(),
                name: user.name.clone(),
                ..Default::default()
            });
            match game.result {
                GameResult::Win => entry.wins += 1,
                GameResult::Loss => entry.losses += 1,
                GameResult::Tie => entry.ties += 1,
                GameResult::Bye | GameResult::NotPlayed => {}
            }
        }
    }

    let mut out: Vec<HeadToHead> = records.into_values().collect();
    out.sort_by(|a, b| b.games().cmp(&a.games()).then_with(|| a.name.cmp(&b.name)));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys;
    use crate::kv::Storage;

    fn test_store(year: u16) -> EntityStore {
        let store = EntityStore::for_dynasty(Storage::in_memory(), "abc");
        store.set_current_year(year).unwrap();
        store
    }

    fn game(opponent: &str, result: GameResult, user_id: Option<&str>) -> Game {
        Game {
            opponent: opponent.into(),
            result,
            score: "21-14".into(),
            user_id: user_id.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn reassigning_closes_previous_tenure() {
        let store = test_store(2027);
        let user = add_user(&store, "Sam", None).unwrap();

        update_user_team(&store, &user.id, Some("Team A")).unwrap();
        let updated = update_user_team(&store, &user.id, Some("Team B")).unwrap();

        assert_eq!(updated.team_history.len(), 2);
        assert_eq!(updated.team_history[0].team_id, "Team A");
        assert_eq!(updated.team_history[0].end_year, Some(2026));
        assert_eq!(updated.team_history[1].team_id, "Team B");
        assert_eq!(updated.team_history[1].start_year, 2027);
        assert!(updated.team_history[1].is_open());
        assert_eq!(updated.open_tenures(), 1);
        assert_eq!(store.users()[0], updated);
    }

    #[test]
    fn assigning_current_team_is_a_no_op() {
        let mut user = User::default();
        assert!(user.assign_team("Texas", 2025));
        assert!(!user.assign_team("texas", 2026));
        assert_eq!(user.team_history.len(), 1);
    }

    #[test]
    fn team_for_year_walks_history() {
        let mut user = User::default();
        user.assign_team("Texas", 2025);
        user.assign_team("Oregon", 2028);
        assert_eq!(user.team_for_year(2024), None);
        assert_eq!(user.team_for_year(2026), Some("Texas"));
        assert_eq!(user.team_for_year(2027), Some("Texas"));
        assert_eq!(user.team_for_year(2031), Some("Oregon"));
    }

    #[test]
    fn release_closes_tenure() {
        let mut user = User::default();
        user.assign_team("Texas", 2025);
        assert!(user.release_team(2027));
        assert_eq!(user.current_team, None);
        assert_eq!(user.team_history[0].end_year, Some(2026));
        assert!(!user.release_team(2028));
    }

    #[test]
    fn updates_resync_controlled_teams() {
        let store = test_store(2025);
        let user = add_user(&store, "Sam", Some("Georgia")).unwrap();
        assert_eq!(store.user_controlled_teams(), vec!["Georgia".to_string()]);
        assert_eq!(
            store.user_team_mappings(2025).get("Georgia"),
            Some(&user.id)
        );

        remove_user(&store, &user.id).unwrap();
        assert!(store.user_controlled_teams().is_empty());
    }

    #[test]
    fn unknown_user_is_an_error() {
        let store = test_store(2025);
        assert!(matches!(
            update_user_team(&store, "nobody", Some("Texas")),
            Err(UserError::UnknownUser(_))
        ));
    }

    #[test]
    fn update_requires_current_year() {
        let store = EntityStore::for_dynasty(Storage::in_memory(), "abc");
        store.storage().remove(keys::CURRENT_YEAR).unwrap();
        assert!(matches!(
            update_user_team(&store, "user-1", Some("Texas")),
            Err(UserError::NoCurrentYear)
        ));
    }

    #[test]
    fn head_to_head_uses_links_then_tenures() {
        let mut sam = User {
            id: "user-1".into(),
            name: "Sam".into(),
            ..Default::default()
        };
        sam.assign_team("Texas", 2025);
        sam.assign_team("Oregon", 2026);
        let alex = User {
            id: "user-2".into(),
            name: "Alex".into(),
            ..Default::default()
        };
        let users = vec![sam, alex];

        let schedules = BTreeMap::from([
            (
                2025,
                vec![
                    game("Texas", GameResult::Win, None),
                    game("Rice", GameResult::Loss, Some("user-2")),
                    game("Oregon", GameResult::Win, None),
                ],
            ),
            (
                2026,
                vec![
                    game("Oregon", GameResult::Tie, None),
                    game("Texas", GameResult::Loss, None),
                ],
            ),
        ]);

        let records = head_to_head(&users, &schedules);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name, "Sam");
        assert_eq!((records[0].wins, records[0].losses, records[0].ties), (1, 0, 1));
        assert_eq!(records[1].name, "Alex");
        assert_eq!(records[1].losses, 1);
    }
}
