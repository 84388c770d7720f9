//! Typed record structures for the two source systems.
//!
//! Field names deliberately differ between ALPHA and BETA (mirroring the two
//! real upstream schemas this store reconciles) rather than being normalized
//! at the loader boundary — the matchers are the layer responsible for
//! reconciling the naming split.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AlphaTeam {
    pub team_id: i64,
    pub name: String,
    pub country: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct BetaTeam {
    pub id: i64,
    pub display_name: String,
    pub region: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AlphaCompetition {
    pub competition_id: i64,
    pub name: String,
    pub country: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct BetaCompetition {
    pub id: i64,
    pub title: String,
    pub locale: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AlphaSeason {
    pub season_id: i64,
    pub competition_id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct BetaSeason {
    pub id: i64,
    pub competition_id: i64,
    pub label: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AlphaPlayer {
    pub player_id: i64,
    pub name: String,
    pub dob: Option<NaiveDate>,
    pub team_id: Option<i64>,
    pub nationality: Option<String>,
    pub height_cm: Option<i32>,
    pub foot: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct BetaPlayer {
    pub id: i64,
    pub full_name: String,
    pub birth_year: Option<i32>,
    pub team_name: Option<String>,
    pub nationality: Option<String>,
    pub footedness: Option<String>,
    pub height_cm: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AlphaMatch {
    pub match_id: i64,
    pub competition_id: i64,
    pub season_id: i64,
    pub home_team_id: i64,
    pub away_team_id: i64,
    pub match_date: Option<NaiveDate>,
}

/// BETA matches may carry team ids directly, or only team names — the
/// matcher falls back to name resolution when the id column is absent.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct BetaMatch {
    pub id: i64,
    pub competition_id: i64,
    pub season_id: i64,
    pub home_team_id: Option<i64>,
    pub away_team_id: Option<i64>,
    pub home_team: Option<String>,
    pub away_team: Option<String>,
    pub match_date: Option<NaiveDate>,
}

/// One side's full rectangular record set, as returned by a loader.
pub struct AlphaDataset {
    pub teams: Vec<AlphaTeam>,
    pub competitions: Vec<AlphaCompetition>,
    pub seasons: Vec<AlphaSeason>,
    pub players: Vec<AlphaPlayer>,
    pub matches: Vec<AlphaMatch>,
}

pub struct BetaDataset {
    pub teams: Vec<BetaTeam>,
    pub competitions: Vec<BetaCompetition>,
    pub seasons: Vec<BetaSeason>,
    pub players: Vec<BetaPlayer>,
    pub matches: Vec<BetaMatch>,
}
