// Typed records stored under the tracker's keys. Field names serialize in
// camelCase so saves from the browser build decode unchanged.

pub mod opponent;
pub mod player;
pub mod rankings;
pub mod records;
pub mod recruiting;
pub mod schedule;
pub mod season;
pub mod team;
pub mod user;

pub use opponent::{Matchup, Opponent, OpponentsState, Outcome};
pub use player::{ClassLevel, ClassYear, DevTrait, Player, PlayerSeasonStats};
pub use rankings::{blank_poll, OthersReceivingVotes, RankedTeam, Top25History, POLL_SIZE};
pub use records::{RecordBook, RecordEntry, RecordScope, StatLeader, TeamLeaders, TeamStats, Trophy};
pub use recruiting::{Recruit, RecruitingNeed, Transfer, TransferDirection};
pub use schedule::{blank_schedule, Game, GameResult, Location, WEEKS_PER_SEASON};
pub use season::{YearRecord, YearStats};
pub use team::{Coach, CoachProfile, CustomTeam};
pub use user::{TeamTenure, User};
