// Roster entities and class-year handling.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Development trait as shown in the game's roster screen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DevTrait {
    #[default]
    Normal,
    Impact,
    Star,
    Elite,
}

/// A rostered player.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub jersey_number: Option<u8>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub position: String,
    /// Class year label, e.g. `"FR"`, `"SO (RS)"`.
    #[serde(default)]
    pub year: String,
    #[serde(default)]
    pub rating: u8,
    #[serde(default)]
    pub dev_trait: DevTrait,
    /// Redshirting during the current season.
    #[serde(default)]
    pub is_redshirted: bool,
    #[serde(default)]
    pub is_transferring: bool,
    #[serde(default)]
    pub is_drafted: bool,
    /// Seasons in which the player redshirted.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub redshirted_years: Vec<u16>,
}

impl Player {
    pub fn class_year(&self) -> Option<ClassYear> {
        ClassYear::parse(&self.year)
    }
}

/// Academic level without the redshirt marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ClassLevel {
    Freshman,
    Sophomore,
    Junior,
    Senior,
}

impl ClassLevel {
    pub fn abbreviation(&self) -> &'static str {
        match self {
            ClassLevel::Freshman => "FR",
            ClassLevel::Sophomore => "SO",
            ClassLevel::Junior => "JR",
            ClassLevel::Senior => "SR",
        }
    }

    /// The following level; `None` after senior year.
    pub fn next(&self) -> Option<ClassLevel> {
        match self {
            ClassLevel::Freshman => Some(ClassLevel::Sophomore),
            ClassLevel::Sophomore => Some(ClassLevel::Junior),
            ClassLevel::Junior => Some(ClassLevel::Senior),
            ClassLevel::Senior => None,
        }
    }
}

/// Parsed class year such as `SO (RS)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClassYear {
    pub level: ClassLevel,
    pub redshirt: bool,
}

impl ClassYear {
    pub const fn new(level: ClassLevel, redshirt: bool) -> Self {
        ClassYear { level, redshirt }
    }

    /// Parse labels like `"FR"`, `"jr"`, `"SR (RS)"`, `"RS SO"`.
    pub fn parse(label: &str) -> Option<Self> {
        let upper = label.trim().to_ascii_uppercase();
        let redshirt = upper.contains("RS");
        let base = upper
            .replace("(RS)", " ")
            .replace("RS", " ")
            .split_whitespace()
            .collect::<String>();
        let level = match base.as_str() {
            "FR" => ClassLevel::Freshman,
            "SO" => ClassLevel::Sophomore,
            "JR" => ClassLevel::Junior,
            "SR" => ClassLevel::Senior,
            _ => return None,
        };
        Some(ClassYear { level, redshirt })
    }
}

impl fmt::Display for ClassYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.redshirt {
            write!(f, "{} (RS)", self.level.abbreviation())
        } else {
            f.write_str(self.level.abbreviation())
        }
    }
}

/// Per-player statistics line for one season.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSeasonStats {
    pub player_id: u64,
    pub year: u16,
    #[serde(default)]
    pub stats: std::collections::BTreeMap<String, f64>,
}
