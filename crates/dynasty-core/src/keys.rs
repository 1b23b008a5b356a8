// Storage key namespace. Every key string in the crate is built or parsed
// here.

// ---------------------------------------------------------------------------
// Session singletons
// ---------------------------------------------------------------------------

pub const COACH_PROFILE: &str = "coachProfile";
pub const COACHES: &str = "coaches";
pub const CURRENT_YEAR: &str = "currentYear";
pub const PLAYERS: &str = "players";
pub const PLAYER_STATS: &str = "playerStats";
pub const ALL_RECRUITS: &str = "allRecruits";
pub const ALL_TRANSFERS: &str = "allTransfers";
pub const YEAR_RECORDS: &str = "yearRecords";
pub const USERS: &str = "users";
pub const USER_CONTROLLED_TEAMS: &str = "userControlledTeams";
pub const TROPHIES: &str = "trophies";
pub const OPPONENTS_STATE: &str = "opponentsState";
pub const CUSTOM_TEAMS: &str = "customTeams";

/// Keys overwritten wholesale when the active dynasty changes.
pub const SESSION_KEYS: &[&str] = &[
    COACH_PROFILE,
    COACHES,
    CURRENT_YEAR,
    PLAYERS,
    PLAYER_STATS,
    ALL_RECRUITS,
    ALL_TRANSFERS,
    YEAR_RECORDS,
    USERS,
    USER_CONTROLLED_TEAMS,
    TROPHIES,
    OPPONENTS_STATE,
    CUSTOM_TEAMS,
];

// ---------------------------------------------------------------------------
// Global keys
// ---------------------------------------------------------------------------

/// Launcher index of every dynasty.
pub const DYNASTIES: &str = "dynasties";
/// Pointer to the active `dynasty_<id>` blob.
pub const CURRENT_DYNASTY_ID: &str = "currentDynastyId";

/// Fields of the dynasty blob owned by the reactive context rather than by a
/// standalone key.
pub const TOP25_HISTORY: &str = "top25History";
pub const OTHERS_RECEIVING_VOTES: &str = "othersReceivingVotes";
pub const SCHEDULE_ADVANCE: &str = "scheduleAdvance";
/// Format version stamped into every dynasty blob.
pub const SNAPSHOT_VERSION: &str = "snapshotVersion";

const SCHEDULE_PREFIX: &str = "schedule_";
const YEAR_STATS_PREFIX: &str = "yearStats_";
const USER_TEAM_MAPPINGS_PREFIX: &str = "userTeamMappings_";
const DYNASTY_PREFIX: &str = "dynasty_";
const RECORDS_PREFIX: &str = "records_";
const TEAM_STATS_PREFIX: &str = "teamStats_";
const TEAM_LEADERS_PREFIX: &str = "teamLeaders_";
const OFFENSIVE_NEEDS_PREFIX: &str = "offensiveNeeds_";
const DEFENSIVE_NEEDS_PREFIX: &str = "defensiveNeeds_";

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

pub fn schedule_key(year: u16) -> String {
    format!("{SCHEDULE_PREFIX}{year}")
}

pub fn year_stats_key(year: u16) -> String {
    format!("{YEAR_STATS_PREFIX}{year}")
}

pub fn user_team_mappings_key(year: u16) -> String {
    format!("{USER_TEAM_MAPPINGS_PREFIX}{year}")
}

pub fn dynasty_key(dynasty_id: &str) -> String {
    format!("{DYNASTY_PREFIX}{dynasty_id}")
}

pub fn records_key(dynasty_id: &str) -> String {
    format!("{RECORDS_PREFIX}{dynasty_id}")
}

pub fn team_stats_key(dynasty_id: &str, year: u16) -> String {
    format!("{TEAM_STATS_PREFIX}{dynasty_id}_{year}")
}

pub fn team_leaders_key(dynasty_id: &str, year: u16) -> String {
    format!("{TEAM_LEADERS_PREFIX}{dynasty_id}_{year}")
}

pub fn offensive_needs_key(dynasty_id: &str) -> String {
    format!("{OFFENSIVE_NEEDS_PREFIX}{dynasty_id}")
}

pub fn defensive_needs_key(dynasty_id: &str) -> String {
    format!("{DEFENSIVE_NEEDS_PREFIX}{dynasty_id}")
}

// ---------------------------------------------------------------------------
// Classification of dynamically-prefixed keys
// ---------------------------------------------------------------------------

/// A parsed per-year or per-dynasty key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DynamicKey {
    Schedule(u16),
    YearStats(u16),
    UserTeamMappings(u16),
    Records(String),
    TeamStats(String, u16),
    TeamLeaders(String, u16),
    OffensiveNeeds(String),
    DefensiveNeeds(String),
}

impl DynamicKey {
    /// Render back to the storage key.
    pub fn key(&self) -> String {
        match self {
            DynamicKey::Schedule(year) => schedule_key(*year),
            DynamicKey::YearStats(year) => year_stats_key(*year),
            DynamicKey::UserTeamMappings(year) => user_team_mappings_key(*year),
            DynamicKey::Records(id) => records_key(id),
            DynamicKey::TeamStats(id, year) => team_stats_key(id, *year),
            DynamicKey::TeamLeaders(id, year) => team_leaders_key(id, *year),
            DynamicKey::OffensiveNeeds(id) => offensive_needs_key(id),
            DynamicKey::DefensiveNeeds(id) => defensive_needs_key(id),
        }
    }

    /// The dynasty this key is scoped to, if it is dynasty-scoped.
    pub fn dynasty_id(&self) -> Option<&str> {
        match self {
            DynamicKey::Schedule(_)
            | DynamicKey::YearStats(_)
            | DynamicKey::UserTeamMappings(_) => None,
            DynamicKey::Records(id)
            | DynamicKey::TeamStats(id, _)
            | DynamicKey::TeamLeaders(id, _)
            | DynamicKey::OffensiveNeeds(id)
            | DynamicKey::DefensiveNeeds(id) => Some(id),
        }
    }

    /// Whether this key is part of `dynasty_id`'s snapshot. Year-scoped keys
    /// belong to whichever dynasty is active; dynasty-scoped keys only to
    /// their own dynasty.
    pub fn belongs_to(&self, dynasty_id: &str) -> bool {
        self.dynasty_id().map_or(true, |id| id == dynasty_id)
    }
}

/// Parse a storage key into its dynamic form. Returns `None` for session
/// singletons, global keys, and anything unrecognised.
pub fn classify(key: &str) -> Option<DynamicKey> {
    if let Some(rest) = key.strip_prefix(SCHEDULE_PREFIX) {
        return parse_year(rest).map(DynamicKey::Schedule);
    }
    if let Some(rest) = key.strip_prefix(YEAR_STATS_PREFIX) {
        return parse_year(rest).map(DynamicKey::YearStats);
    }
    if let Some(rest) = key.strip_prefix(USER_TEAM_MAPPINGS_PREFIX) {
        return parse_year(rest).map(DynamicKey::UserTeamMappings);
    }
    if let Some(rest) = key.strip_prefix(RECORDS_PREFIX) {
        return non_empty(rest).map(DynamicKey::Records);
    }
    if let Some(rest) = key.strip_prefix(TEAM_STATS_PREFIX) {
        return split_id_year(rest).map(|(id, year)| DynamicKey::TeamStats(id, year));
    }
    if let Some(rest) = key.strip_prefix(TEAM_LEADERS_PREFIX) {
        return split_id_year(rest).map(|(id, year)| DynamicKey::TeamLeaders(id, year));
    }
    if let Some(rest) = key.strip_prefix(OFFENSIVE_NEEDS_PREFIX) {
        return non_empty(rest).map(DynamicKey::OffensiveNeeds);
    }
    if let Some(rest) = key.strip_prefix(DEFENSIVE_NEEDS_PREFIX) {
        return non_empty(rest).map(DynamicKey::DefensiveNeeds);
    }
    None
}

/// Extract the dynasty id from a `dynasty_<id>` key.
pub fn parse_dynasty_key(key: &str) -> Option<&str> {
    key.strip_prefix(DYNASTY_PREFIX).filter(|id| !id.is_empty())
}

fn parse_year(s: &str) -> Option<u16> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

fn non_empty(s: &str) -> Option<String> {
    (!s.is_empty()).then(|| s.to_string())
}

/// Dynasty ids may themselves contain underscores, so the year is always
/// the last segment.
fn split_id_year(s: &str) -> Option<(String, u16)> {
    let (id, year) = s.rsplit_once('_')?;
    if id.is_empty() {
        return None;
    }
    Some((id.to_string(), parse_year(year)?))
}
