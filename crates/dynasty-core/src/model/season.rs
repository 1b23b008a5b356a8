// Season-level aggregates: computed counters and the narrative year record.

use serde::{Deserialize, Serialize};

/// Win/loss/points counters for one season, as produced by
/// [`crate::stats::calculate_stats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct YearStats {
    pub wins: u32,
    pub losses: u32,
    pub ties: u32,
    pub conference_wins: u32,
    pub conference_losses: u32,
    pub conference_ties: u32,
    pub points_scored: u32,
    pub points_against: u32,
}

impl YearStats {
    pub fn games_played(&self) -> u32 {
        self.wins + self.losses + self.ties
    }
}

/// Season summary and free-form narrative fields for one year.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct YearRecord {
    pub year: u16,
    /// e.g. `"10-2"`.
    pub overall_record: String,
    pub conference_record: String,
    pub points_for: u32,
    pub points_against: u32,
    pub bowl_game: Option<String>,
    pub bowl_result: Option<String>,
    pub heisman: Option<String>,
    pub conference_finish: Option<String>,
    pub national_finish: Option<String>,
    pub draft_picks: Vec<String>,
}
