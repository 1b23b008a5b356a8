// Human players tracked for head-to-head records.

use serde::{Deserialize, Serialize};

/// A span of seasons during which a user controlled one team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamTenure {
    pub team_id: String,
    pub start_year: u16,
    /// `None` while the tenure is ongoing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_year: Option<u16>,
}

impl TeamTenure {
    pub fn is_open(&self) -> bool {
        self.end_year.is_none()
    }

    pub fn covers(&self, year: u16) -> bool {
        year >= self.start_year && self.end_year.map_or(true, |end| year <= end)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub current_team: Option<String>,
    #[serde(default)]
    pub team_history: Vec<TeamTenure>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_user_entries_decode() {
        let users: Vec<User> = serde_json::from_str(
            r#"[{"id": "user-1", "name": "Sam"}, {"currentTeam": "Texas"}]"#,
        )
        .unwrap();
        assert_eq!(users.len(), 2);
        assert_eq!(users[1].id, "");
        assert_eq!(users[1].name, "");
        assert_eq!(users[1].current_team.as_deref(), Some("Texas"));
        assert!(users[1].team_history.is_empty());
    }
}
