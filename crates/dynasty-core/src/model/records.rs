// Trophies, career record book, and per-season team statistics.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trophy {
    pub name: String,
    pub year: u16,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordScope {
    Game,
    #[default]
    Season,
    Career,
}

/// A single program record (e.g. most passing yards in a season).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordEntry {
    pub category: String,
    #[serde(default)]
    pub scope: RecordScope,
    pub holder: String,
    pub value: f64,
    #[serde(default)]
    pub year: Option<u16>,
}

/// Career-spanning program records for one dynasty (`records_<id>`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RecordBook {
    pub entries: Vec<RecordEntry>,
}

/// Team statistics for one season, grouped by phase.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TeamStats {
    pub offense: BTreeMap<String, f64>,
    pub defense: BTreeMap<String, f64>,
    pub special_teams: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatLeader {
    pub category: String,
    pub player_name: String,
    pub value: f64,
}

/// Statistical leaders for one season.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TeamLeaders {
    pub leaders: Vec<StatLeader>,
}
