//! Canonical Unified Entity Store record shapes.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct UesTeam {
    pub ues_team_id: String,
    pub name: String,
    pub country: Option<String>,
    pub merge_confidence: f64,
    pub lineage: Json,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct UesCompetition {
    pub ues_competition_id: String,
    pub name: String,
    pub country: Option<String>,
    pub merge_confidence: f64,
    pub lineage: Json,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct UesSeason {
    pub ues_season_id: String,
    pub start_year: Option<i32>,
    pub end_year: Option<i32>,
    pub competition_ues_id: Option<String>,
    pub merge_confidence: f64,
    pub lineage: Json,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct UesPlayer {
    pub ues_player_id: String,
    pub canonical_name: String,
    pub dob: Option<NaiveDate>,
    pub birth_year: Option<i32>,
    pub nationality: Option<String>,
    pub height_cm: Option<i32>,
    pub foot: Option<String>,
    pub team_ues_id: Option<String>,
    pub merge_confidence: f64,
    pub lineage: Json,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct UesMatch {
    pub ues_match_id: String,
    pub home_team_ues_id: Option<String>,
    pub away_team_ues_id: Option<String>,
    pub season_ues_id: Option<String>,
    pub competition_ues_id: Option<String>,
    pub match_date: Option<NaiveDate>,
    pub merge_confidence: f64,
    pub lineage: Json,
}

/// Entity-type discriminant threaded through the router, writer, and
/// monitoring layers. Serializes to the lowercase strings persisted in
/// `pipeline_run_metrics.entity_type` and friends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Team,
    Competition,
    Season,
    Player,
    Match,
}

impl EntityType {
    pub const ALL: [EntityType; 5] =
        [Self::Team, Self::Competition, Self::Season, Self::Player, Self::Match];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Team => "team",
            Self::Competition => "competition",
            Self::Season => "season",
            Self::Player => "player",
            Self::Match => "match",
        }
    }

    pub fn ues_prefix(&self) -> &'static str {
        match self {
            Self::Team => "UEST",
            Self::Competition => "UESC",
            Self::Season => "UESS",
            Self::Player => "UESP",
            Self::Match => "UESM",
        }
    }
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
