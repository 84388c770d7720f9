//! End-to-end test of one full mapping run against temp-file sqlite
//! databases: seeds one clearly-matching pair per entity type, runs the
//! five-stage pipeline, and checks the UES store and quality gate verdict.

use std::collections::HashMap;

use chrono::NaiveDate;
use sqlx::SqlitePool;
use tempfile::tempdir;

use ues_engine::config::{Config, DatabaseConfig, MappingRulesConfig, NormalizationConfig, ServerConfig, ThresholdsConfig};
use ues_engine::db::DbPools;
use ues_engine::qa::gates::{GateStatus, QualityGateConfig};
use ues_engine::validation::llm_client::MockLlmClient;

async fn seed_alpha(pool: &SqlitePool) {
    sqlx::query("INSERT INTO teams (team_id, name, country) VALUES (1, 'Home Town FC', 'England')")
        .execute(pool).await.unwrap();
    sqlx::query("INSERT INTO teams (team_id, name, country) VALUES (2, 'Away City FC', 'England')")
        .execute(pool).await.unwrap();
    sqlx::query("INSERT INTO competitions (competition_id, name, country) VALUES (100, 'Premier League', 'England')")
        .execute(pool).await.unwrap();
    sqlx::query("INSERT INTO seasons (season_id, competition_id, name) VALUES (200, 100, '2020/21')")
        .execute(pool).await.unwrap();
    sqlx::query(
        "INSERT INTO players (player_id, name, dob, team_id, nationality, height_cm, foot) \
         VALUES (1, 'John Doe', '1995-04-10', 1, 'England', 180, 'right')",
    )
    .execute(pool).await.unwrap();
    sqlx::query(
        "INSERT INTO matches (match_id, competition_id, season_id, home_team_id, away_team_id, match_date) \
         VALUES (1, 100, 200, 1, 2, '2021-05-01')",
    )
    .execute(pool).await.unwrap();
}

async fn seed_beta(pool: &SqlitePool) {
    sqlx::query("INSERT INTO teams (id, display_name, region) VALUES (11, 'Home Town FC', 'England')")
        .execute(pool).await.unwrap();
    sqlx::query("INSERT INTO teams (id, display_name, region) VALUES (22, 'Away City FC', 'England')")
        .execute(pool).await.unwrap();
    sqlx::query("INSERT INTO competitions (id, title, locale) VALUES (900, 'Premier League', 'England')")
        .execute(pool).await.unwrap();
    sqlx::query("INSERT INTO seasons (id, competition_id, label) VALUES (901, 900, '2020/21')")
        .execute(pool).await.unwrap();
    sqlx::query(
        "INSERT INTO players (id, full_name, birth_year, team_name, nationality, footedness, height_cm) \
         VALUES (11, 'John Doe', 1995, 'Home Town FC', 'England', 'right', 180)",
    )
    .execute(pool).await.unwrap();
    sqlx::query(
        "INSERT INTO matches (id, competition_id, season_id, home_team_id, away_team_id, match_date) \
         VALUES (91, 900, 901, 11, 22, '2021-05-01')",
    )
    .execute(pool).await.unwrap();
}

fn test_config() -> Config {
    Config {
        server: ServerConfig::default(),
        database: DatabaseConfig { internal_api_key: None, auto_triage_during_mapping: false, ..DatabaseConfig::default() },
        thresholds: ThresholdsConfig::default(),
        llm_validation: Default::default(),
        quality_gates: QualityGateConfig::default(),
        normalization: NormalizationConfig::default(),
        mapping_rules: MappingRulesConfig { team_name_aliases: HashMap::new() },
    }
}

#[tokio::test]
async fn full_run_matches_every_entity_type_and_passes_quality_gates() {
    let dir = tempdir().unwrap();
    let alpha_url = format!("sqlite://{}/alpha.db", dir.path().display());
    let beta_url = format!("sqlite://{}/beta.db", dir.path().display());
    let ues_url = format!("sqlite://{}/ues.db", dir.path().display());

    let pools = DbPools::connect(&alpha_url, &beta_url, &ues_url).await.unwrap();
    pools.migrate().await.unwrap();

    seed_alpha(&pools.alpha).await;
    seed_beta(&pools.beta).await;

    let config = test_config();
    let llm_client = MockLlmClient::new(Vec::new());

    let outcome = ues_engine::pipeline::run_pipeline(&pools, &config, &llm_client, Some("test-run-1".to_string()))
        .await
        .unwrap();

    assert_eq!(outcome.run_id, "test-run-1");
    assert_eq!(outcome.quality_gate.status, GateStatus::Pass);
    assert!(outcome.quality_gate.failed_gates.is_empty());

    let team_count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM ues_teams").fetch_one(&pools.ues).await.unwrap();
    assert_eq!(team_count.0, 2);

    let competition_count: (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM ues_competitions").fetch_one(&pools.ues).await.unwrap();
    assert_eq!(competition_count.0, 1);

    let season_count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM ues_seasons").fetch_one(&pools.ues).await.unwrap();
    assert_eq!(season_count.0, 1);

    let player: (String, Option<NaiveDate>) =
        sqlx::query_as("SELECT canonical_name, dob FROM ues_players").fetch_one(&pools.ues).await.unwrap();
    assert_eq!(player.0, "John Doe");
    assert_eq!(player.1, NaiveDate::from_ymd_opt(1995, 4, 10));

    let match_count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM ues_matches").fetch_one(&pools.ues).await.unwrap();
    assert_eq!(match_count.0, 1);

    let lineage_rows: (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM source_lineage").fetch_one(&pools.ues).await.unwrap();
    assert!(lineage_rows.0 >= 2 * (2 + 1 + 1 + 1 + 1));

    let gate_row: (String,) =
        sqlx::query_as("SELECT status FROM quality_gate_results WHERE run_id = 'test-run-1'")
            .fetch_one(&pools.ues)
            .await
            .unwrap();
    assert_eq!(gate_row.0, "PASS");
}

#[tokio::test]
async fn second_run_on_same_store_is_idempotent() {
    let dir = tempdir().unwrap();
    let alpha_url = format!("sqlite://{}/alpha.db", dir.path().display());
    let beta_url = format!("sqlite://{}/beta.db", dir.path().display());
    let ues_url = format!("sqlite://{}/ues.db", dir.path().display());

    let pools = DbPools::connect(&alpha_url, &beta_url, &ues_url).await.unwrap();
    pools.migrate().await.unwrap();
    seed_alpha(&pools.alpha).await;
    seed_beta(&pools.beta).await;

    let config = test_config();
    let llm_client = MockLlmClient::new(Vec::new());

    ues_engine::pipeline::run_pipeline(&pools, &config, &llm_client, Some("run-a".to_string())).await.unwrap();
    ues_engine::pipeline::run_pipeline(&pools, &config, &llm_client, Some("run-b".to_string())).await.unwrap();

    // `reset()` wipes run-scoped tables at the start of each run, so the
    // second run's output replaces the first's rather than accumulating.
    let team_count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM ues_teams").fetch_one(&pools.ues).await.unwrap();
    assert_eq!(team_count.0, 2);

    let first_run_metrics: (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM pipeline_run_metrics WHERE run_id = 'run-a'")
            .fetch_one(&pools.ues)
            .await
            .unwrap();
    assert_eq!(first_run_metrics.0, 0);
}
