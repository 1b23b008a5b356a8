// Declared rivals and the head-to-head matchups derived for them.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::schedule::Location;

/// A rival identity that may control different teams across seasons.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Opponent {
    pub id: String,
    pub name: String,
    /// Team controlled in any season without an explicit assignment.
    #[serde(default)]
    pub default_team: Option<String>,
    /// Season-specific assignments, `year -> team`.
    #[serde(default)]
    pub team_history: BTreeMap<u16, String>,
}

impl Opponent {
    /// Team controlled in `season`: the season assignment, else the default.
    pub fn team_for_season(&self, season: u16) -> Option<&str> {
        self.team_history
            .get(&season)
            .map(String::as_str)
            .or(self.default_team.as_deref())
            .filter(|team| !team.trim().is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    Win,
    Loss,
    Tie,
}

/// One game against a declared opponent, from the dynasty's point of view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Matchup {
    pub opponent_id: String,
    pub season: u16,
    pub week: u8,
    pub team: String,
    pub location: Location,
    pub outcome: Outcome,
    pub points_for: u32,
    pub points_against: u32,
}

/// Persisted opponents registry. `version` increments on every write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpponentsState {
    #[serde(default)]
    pub version: u64,
    #[serde(default)]
    pub opponents: Vec<Opponent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matchups: Option<Vec<Matchup>>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl Default for OpponentsState {
    fn default() -> Self {
        OpponentsState {
            version: 0,
            opponents: Vec::new(),
            matchups: None,
            updated_at: DateTime::<Utc>::UNIX_EPOCH,
        }
    }
}
