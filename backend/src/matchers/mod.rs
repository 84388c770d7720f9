pub mod competitions;
pub mod matches;
pub mod players;
pub mod seasons;
pub mod teams;

pub use competitions::{match_competitions, CompetitionCandidate};
pub use matches::{match_matches, MatchCandidate};
pub use players::{match_players, PlayerBreakdown, PlayerCandidate};
pub use seasons::{match_seasons, SeasonCandidate};
pub use teams::{match_teams, TeamCandidate};
