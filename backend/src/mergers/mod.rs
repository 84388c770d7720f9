pub mod competitions;
pub mod matches;
pub mod players;
pub mod seasons;
pub mod teams;

pub use competitions::{merge_competitions, CompetitionMergeOutput};
pub use matches::merge_matches;
pub use players::{merge_players, PlayerMergeOutput};
pub use seasons::{merge_seasons, SeasonMergeOutput};
pub use teams::{merge_teams, TeamMergeOutput};
