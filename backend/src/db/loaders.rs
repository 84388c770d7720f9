//! Source readers: one query per entity type per side, materializing the
//! full rectangular record set into memory (batch, whole-input pipeline —
//! no cursoring).

use sqlx::SqlitePool;

use crate::domain::{
    AlphaCompetition, AlphaDataset, AlphaMatch, AlphaPlayer, AlphaSeason, AlphaTeam, BetaCompetition,
    BetaDataset, BetaMatch, BetaPlayer, BetaSeason, BetaTeam,
};
use crate::error::ApiResult;

pub async fn load_alpha_data(pool: &SqlitePool) -> ApiResult<AlphaDataset> {
    let teams = sqlx::query_as::<_, AlphaTeam>("SELECT team_id, name, country FROM teams")
        .fetch_all(pool)
        .await?;
    let competitions =
        sqlx::query_as::<_, AlphaCompetition>("SELECT competition_id, name, country FROM competitions")
            .fetch_all(pool)
            .await?;
    let seasons =
        sqlx::query_as::<_, AlphaSeason>("SELECT season_id, competition_id, name FROM seasons")
            .fetch_all(pool)
            .await?;
    let players = sqlx::query_as::<_, AlphaPlayer>(
        "SELECT player_id, name, dob, team_id, nationality, height_cm, foot FROM players",
    )
    .fetch_all(pool)
    .await?;
    let matches = sqlx::query_as::<_, AlphaMatch>(
        "SELECT match_id, competition_id, season_id, home_team_id, away_team_id, match_date FROM matches",
    )
    .fetch_all(pool)
    .await?;

    Ok(AlphaDataset { teams, competitions, seasons, players, matches })
}

pub async fn load_beta_data(pool: &SqlitePool) -> ApiResult<BetaDataset> {
    let teams = sqlx::query_as::<_, BetaTeam>("SELECT id, display_name, region FROM teams")
        .fetch_all(pool)
        .await?;
    let competitions = sqlx::query_as::<_, BetaCompetition>("SELECT id, title, locale FROM competitions")
        .fetch_all(pool)
        .await?;
    let seasons = sqlx::query_as::<_, BetaSeason>("SELECT id, competition_id, label FROM seasons")
        .fetch_all(pool)
        .await?;
    let players = sqlx::query_as::<_, BetaPlayer>(
        "SELECT id, full_name, birth_year, team_name, nationality, footedness, height_cm FROM players",
    )
    .fetch_all(pool)
    .await?;
    let matches = sqlx::query_as::<_, BetaMatch>(
        "SELECT id, competition_id, season_id, home_team_id, away_team_id, home_team, away_team, match_date FROM matches",
    )
    .fetch_all(pool)
    .await?;

    Ok(BetaDataset { teams, competitions, seasons, players, matches })
}
