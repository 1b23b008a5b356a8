// Dynasty school identity, coaching staff, and user-defined teams.

use serde::{Deserialize, Serialize};

/// The dynasty's school and head coach.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoachProfile {
    #[serde(default)]
    pub coach_name: String,
    #[serde(default)]
    pub school_name: String,
    #[serde(default)]
    pub primary_color: String,
    #[serde(default)]
    pub secondary_color: String,
    /// Conference as entered by the user. Used when the school is missing
    /// from the team directory.
    #[serde(default)]
    pub conference: String,
}

/// A member of the coaching staff.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coach {
    pub name: String,
    /// `"HC"`, `"OC"`, `"DC"`.
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub hired_year: Option<u16>,
}

/// An entry in the custom-team registry. Adds a school the standard list
/// lacks, overrides an existing school's conference, or (with `replaces`)
/// renames a standard school.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomTeam {
    pub name: String,
    #[serde(default)]
    pub conference: String,
    #[serde(default)]
    pub abbreviation: Option<String>,
    #[serde(default)]
    pub replaces: Option<String>,
}
