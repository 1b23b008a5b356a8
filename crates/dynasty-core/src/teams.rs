// Team metadata lookup: the standard FBS list plus the custom-team registry.

use std::collections::HashMap;

use crate::model::CustomTeam;

/// Metadata for one school.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamMeta {
    pub name: String,
    pub conference: String,
    pub abbreviation: Option<String>,
}

/// `(school, conference, abbreviation)`.
const STANDARD_TEAMS: &[(&str, &str, &str)] = &[
    // SEC
    ("Alabama", "SEC", "ALA"),
    ("Arkansas", "SEC", "ARK"),
    ("Auburn", "SEC", "AUB"),
    ("Florida", "SEC", "FLA"),
    ("Georgia", "SEC", "UGA"),
    ("Kentucky", "SEC", "UK"),
    ("LSU", "SEC", "LSU"),
    ("Mississippi State", "SEC", "MSST"),
    ("Missouri", "SEC", "MIZ"),
    ("Oklahoma", "SEC", "OU"),
    ("Ole Miss", "SEC", "MISS"),
    ("South Carolina", "SEC", "SC"),
    ("Tennessee", "SEC", "TENN"),
    ("Texas", "SEC", "TEX"),
    ("Texas A&M", "SEC", "TAMU"),
    ("Vanderbilt", "SEC", "VAN"),
    // Big Ten
    ("Illinois", "Big Ten", "ILL"),
    ("Indiana", "Big Ten", "IU"),
    ("Iowa", "Big Ten", "IOWA"),
    ("Maryland", "Big Ten", "MD"),
    ("Michigan", "Big Ten", "MICH"),
    ("Michigan State", "Big Ten", "MSU"),
    ("Minnesota", "Big Ten", "MINN"),
    ("Nebraska", "Big Ten", "NEB"),
    ("Northwestern", "Big Ten", "NU"),
    ("Ohio State", "Big Ten", "OSU"),
    ("Oregon", "Big Ten", "ORE"),
    ("Penn State", "Big Ten", "PSU"),
    ("Purdue", "Big Ten", "PUR"),
    ("Rutgers", "Big Ten", "RUTG"),
    ("UCLA", "Big Ten", "UCLA"),
    ("USC", "Big Ten", "USC"),
    ("Washington", "Big Ten", "WASH"),
    ("Wisconsin", "Big Ten", "WIS"),
    // Big 12
    ("Arizona", "Big 12", "ARIZ"),
    ("Arizona State", "Big 12", "ASU"),
    ("Baylor", "Big 12", "BAY"),
    ("BYU", "Big 12", "BYU"),
    ("Cincinnati", "Big 12", "CIN"),
    ("Colorado", "Big 12", "COLO"),
    ("Houston", "Big 12", "HOU"),
    ("Iowa State", "Big 12", "ISU"),
    ("Kansas", "Big 12", "KU"),
    ("Kansas State", "Big 12", "KSU"),
    ("Oklahoma State", "Big 12", "OKST"),
    ("TCU", "Big 12", "TCU"),
    ("Texas Tech", "Big 12", "TTU"),
    ("UCF", "Big 12", "UCF"),
    ("Utah", "Big 12", "UTAH"),
    ("West Virginia", "Big 12", "WVU"),
    // ACC
    ("Boston College", "ACC", "BC"),
    ("California", "ACC", "CAL"),
    ("Clemson", "ACC", "CLEM"),
    ("Duke", "ACC", "DUKE"),
    ("Florida State", "ACC", "FSU"),
    ("Georgia Tech", "ACC", "GT"),
    ("Louisville", "ACC", "LOU"),
    ("Miami", "ACC", "MIA"),
    ("NC State", "ACC", "NCST"),
    ("North Carolina", "ACC", "UNC"),
    ("Pittsburgh", "ACC", "PITT"),
    ("SMU", "ACC", "SMU"),
    ("Stanford", "ACC", "STAN"),
    ("Syracuse", "ACC", "SYR"),
    ("Virginia", "ACC", "UVA"),
    ("Virginia Tech", "ACC", "VT"),
    ("Wake Forest", "ACC", "WAKE"),
    // Pac-12
    ("Oregon State", "Pac-12", "ORST"),
    ("Washington State", "Pac-12", "WSU"),
    // Group of Five
    ("Army", "American", "ARMY"),
    ("Memphis", "American", "MEM"),
    ("Navy", "American", "NAVY"),
    ("Rice", "American", "RICE"),
    ("Tulane", "American", "TULN"),
    ("Boise State", "Mountain West", "BSU"),
    ("San Diego State", "Mountain West", "SDSU"),
    ("Liberty", "Conference USA", "LIB"),
    ("App State", "Sun Belt", "APP"),
    ("James Madison", "Sun Belt", "JMU"),
    ("Toledo", "MAC", "TOL"),
    // Independents
    ("Notre Dame", "Independent", "ND"),
    ("UConn", "Independent", "CONN"),
    ("UMass", "Independent", "MASS"),
];

/// Case-insensitive `school name -> metadata` lookup.
#[derive(Debug, Clone, Default)]
pub struct TeamDirectory {
    teams: HashMap<String, TeamMeta>,
}

impl TeamDirectory {
    pub fn empty() -> Self {
        Self::default()
    }

    /// The built-in FBS table.
    pub fn standard() -> Self {
        let mut directory = Self::empty();
        for &(name, conference, abbreviation) in STANDARD_TEAMS {
            directory.insert(TeamMeta {
                name: name.to_string(),
                conference: conference.to_string(),
                abbreviation: Some(abbreviation.to_string()),
            });
        }
        directory
    }

    /// Overlay the custom-team registry. Later entries win.
    pub fn with_custom_teams(mut self, custom: &[CustomTeam]) -> Self {
        for team in custom {
            if team.name.trim().is_empty() {
                continue;
            }
            let replaced = team
                .replaces
                .as_deref()
                .and_then(|old| self.teams.remove(&normalize(old)));
            let existing = self.teams.get(&normalize(&team.name));

            let conference = if team.conference.trim().is_empty() {
                existing
                    .or(replaced.as_ref())
                    .map(|meta| meta.conference.clone())
                    .unwrap_or_default()
            } else {
                team.conference.clone()
            };
            let abbreviation = team.abbreviation.clone().or_else(|| {
                existing
                    .or(replaced.as_ref())
                    .and_then(|meta| meta.abbreviation.clone())
            });

            self.insert(TeamMeta {
                name: team.name.clone(),
                conference,
                abbreviation,
            });
        }
        self
    }

    pub fn insert(&mut self, meta: TeamMeta) {
        self.teams.insert(normalize(&meta.name), meta);
    }

    pub fn get(&self, name: &str) -> Option<&TeamMeta> {
        self.teams.get(&normalize(name))
    }

    /// Conference of `name`, if known and non-empty.
    pub fn conference_of(&self, name: &str) -> Option<&str> {
        self.get(name)
            .map(|meta| meta.conference.as_str())
            .filter(|conf| !conf.is_empty())
    }

    pub fn len(&self) -> usize {
        self.teams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.teams.is_empty()
    }

    /// All schools in `conference`, sorted by name.
    pub fn conference_members(&self, conference: &str) -> Vec<&TeamMeta> {
        let mut members: Vec<&TeamMeta> = self
            .teams
            .values()
            .filter(|meta| meta.conference.eq_ignore_ascii_case(conference))
            .collect();
        members.sort_by(|a, b| a.name.cmp(&b.name));
        members
    }
}

fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_lookup_is_case_insensitive() {
        let directory = TeamDirectory::standard();
        assert_eq!(directory.conference_of("Ohio State"), Some("Big Ten"));
        assert_eq!(directory.conference_of("  ohio state "), Some("Big Ten"));
        assert_eq!(directory.conference_of("Slippery Rock"), None);
    }

    #[test]
    fn standard_conference_sizes() {
        let directory = TeamDirectory::standard();
        assert_eq!(directory.conference_members("SEC").len(), 16);
        assert_eq!(directory.conference_members("Big Ten").len(), 18);
        assert_eq!(directory.conference_members("Big 12").len(), 16);
        assert_eq!(directory.conference_members("ACC").len(), 17);
    }

    #[test]
    fn custom_team_is_added() {
        let directory = TeamDirectory::standard().with_custom_teams(&[CustomTeam {
            name: "Slippery Rock".into(),
            conference: "PSAC".into(),
            ..Default::default()
        }]);
        assert_eq!(directory.conference_of("Slippery Rock"), Some("PSAC"));
    }

    #[test]
    fn custom_team_overrides_conference() {
        let directory = TeamDirectory::standard().with_custom_teams(&[CustomTeam {
            name: "Oregon State".into(),
            conference: "Mountain West".into(),
            ..Default::default()
        }]);
        assert_eq!(directory.conference_of("Oregon State"), Some("Mountain West"));
        assert_eq!(
            directory.get("Oregon State").unwrap().abbreviation.as_deref(),
            Some("ORST")
        );
    }

    #[test]
    fn custom_team_replaces_standard_school() {
        let directory = TeamDirectory::standard().with_custom_teams(&[CustomTeam {
            name: "Miami (FL)".into(),
            replaces: Some("Miami".into()),
            ..Default::default()
        }]);
        assert!(directory.get("Miami").is_none());
        assert_eq!(directory.conference_of("Miami (FL)"), Some("ACC"));
    }
}
