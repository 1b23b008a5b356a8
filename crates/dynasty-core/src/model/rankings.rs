// Weekly top-25 polls.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub const POLL_SIZE: usize = 25;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedTeam {
    pub rank: u8,
    /// Empty for an unfilled slot.
    #[serde(default, alias = "name")]
    pub team: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record: Option<String>,
}

impl RankedTeam {
    pub fn is_empty(&self) -> bool {
        self.team.trim().is_empty()
    }
}

/// `year -> week -> poll`.
pub type Top25History = BTreeMap<u16, BTreeMap<u8, Vec<RankedTeam>>>;

/// `year -> week -> free text`.
pub type OthersReceivingVotes = BTreeMap<u16, BTreeMap<u8, String>>;

/// Twenty-five ranked, unfilled slots.
pub fn blank_poll() -> Vec<RankedTeam> {
    (1..=POLL_SIZE as u8)
        .map(|rank| RankedTeam {
            rank,
            ..Default::default()
        })
        .collect()
}

/// Force a poll to exactly 25 slots ranked 1..=25, padding with empty
/// entries and dropping extras.
pub fn normalize_poll(mut poll: Vec<RankedTeam>) -> Vec<RankedTeam> {
    poll.truncate(POLL_SIZE);
    while poll.len() < POLL_SIZE {
        poll.push(RankedTeam::default());
    }
    for (idx, entry) in poll.iter_mut().enumerate() {
        entry.rank = idx as u8 + 1;
    }
    poll
}
