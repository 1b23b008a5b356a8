// Recruiting classes, the transfer portal, and positional needs.

use serde::{Deserialize, Serialize};

use super::player::DevTrait;

/// A high-school or JUCO commit, tagged with the recruiting cycle year.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recruit {
    pub name: String,
    #[serde(default)]
    pub position: String,
    #[serde(default)]
    pub stars: u8,
    #[serde(default)]
    pub rating: u8,
    #[serde(default)]
    pub dev_trait: DevTrait,
    /// Cycle year; the recruit enrolls the following season.
    pub recruited_year: u16,
    #[serde(default)]
    pub hometown: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransferDirection {
    /// Joining the dynasty school.
    #[default]
    #[serde(rename = "From")]
    Incoming,
    /// Leaving the dynasty school.
    #[serde(rename = "To")]
    Outgoing,
}

/// A transfer-portal move, tagged with the year it occurred.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transfer {
    pub name: String,
    #[serde(default)]
    pub position: String,
    #[serde(default)]
    pub stars: u8,
    #[serde(default)]
    pub rating: u8,
    /// Class year label at the time of transfer.
    #[serde(default)]
    pub class_year: String,
    #[serde(default, rename = "transferDirection")]
    pub direction: TransferDirection,
    /// The other school involved.
    #[serde(default)]
    pub school: String,
    pub year: u16,
}

/// A roster need entered on the recruiting board.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecruitingNeed {
    pub position: String,
    #[serde(default)]
    pub count: u8,
    #[serde(default)]
    pub priority: u8,
}
