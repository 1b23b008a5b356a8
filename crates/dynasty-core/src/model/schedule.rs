// Season schedule: 21 weekly game slots per year.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Number of weekly slots in a season (week 0 through conference
/// championship, bowls and playoff).
pub const WEEKS_PER_SEASON: usize = 21;

/// Opponent name used for an open week.
pub const BYE_OPPONENT: &str = "BYE";

/// Where a game is played relative to the dynasty school.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Location {
    #[default]
    #[serde(rename = "vs")]
    Home,
    #[serde(rename = "@")]
    Away,
    #[serde(rename = "neutral")]
    Neutral,
}

/// Recorded outcome of a schedule slot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum GameResult {
    Win,
    Loss,
    Tie,
    Bye,
    /// No result entered yet.
    #[default]
    NotPlayed,
}

impl GameResult {
    /// Normalize a free-form result label. Anything unrecognised is treated
    /// as not yet played.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "win" | "w" => GameResult::Win,
            "loss" | "l" => GameResult::Loss,
            "tie" | "t" => GameResult::Tie,
            "bye" => GameResult::Bye,
            _ => GameResult::NotPlayed,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            GameResult::Win => "Win",
            GameResult::Loss => "Loss",
            GameResult::Tie => "Tie",
            GameResult::Bye => "Bye",
            GameResult::NotPlayed => "N/A",
        }
    }

    /// Win, loss or tie.
    pub fn is_decided(&self) -> bool {
        matches!(self, GameResult::Win | GameResult::Loss | GameResult::Tie)
    }
}

impl fmt::Display for GameResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for GameResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for GameResult {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = Option::<String>::deserialize(deserializer)?;
        Ok(label.as_deref().map_or(GameResult::NotPlayed, GameResult::from_label))
    }
}

/// One schedule slot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Game {
    #[serde(default)]
    pub week: u8,
    #[serde(default)]
    pub location: Location,
    /// Opponent school name; empty for an unfilled slot.
    #[serde(default)]
    pub opponent: String,
    #[serde(default)]
    pub result: GameResult,
    /// `"<ours>-<theirs>"`, e.g. `"31-14"`.
    #[serde(default)]
    pub score: String,
    /// Human user controlling the opponent in this game, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

impl Game {
    pub fn empty(week: u8) -> Self {
        Game {
            week,
            ..Default::default()
        }
    }

    pub fn is_bye(&self) -> bool {
        self.result == GameResult::Bye || self.opponent.trim().eq_ignore_ascii_case(BYE_OPPONENT)
    }

    pub fn has_opponent(&self) -> bool {
        !self.opponent.trim().is_empty() && !self.is_bye()
    }

    /// A real opponent with a win, loss or tie recorded.
    pub fn is_played(&self) -> bool {
        self.has_opponent() && self.result.is_decided()
    }

    /// Parse `score` as `(ours, theirs)`. `None` when malformed.
    pub fn parse_score(&self) -> Option<(u32, u32)> {
        parse_score(&self.score)
    }
}

/// Parse a `"<ours>-<theirs>"` score string.
pub fn parse_score(score: &str) -> Option<(u32, u32)> {
    let (ours, theirs) = score.trim().split_once('-')?;
    Some((ours.trim().parse().ok()?, theirs.trim().parse().ok()?))
}

/// A fresh season: one empty slot per week.
pub fn blank_schedule() -> Vec<Game> {
    (0..WEEKS_PER_SEASON as u8).map(Game::empty).collect()
}

/// Pad a short (legacy) schedule out to a full season and re-index weeks
/// that were saved without one. Extra slots beyond the season are kept.
pub fn normalize_schedule(mut games: Vec<Game>) -> Vec<Game> {
    for (idx, game) in games.iter_mut().enumerate() {
        if game.week as usize != idx && idx < WEEKS_PER_SEASON && game.week == 0 {
            game.week = idx as u8;
        }
    }
    while games.len() < WEEKS_PER_SEASON {
        games.push(Game::empty(games.len() as u8));
    }
    games
}
