//! Stage-sequenced mapping run: teams, competitions, seasons, players, then
//! matches, each going through match → route → write-reviews/metrics →
//! detect-anomalies → merge → write-entities, finishing with the aggregate
//! quality gate evaluation.

use std::collections::HashMap;

use chrono::{Datelike, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::config::Config;
use crate::db::loaders::{load_alpha_data, load_beta_data};
use crate::db::reader::metrics_history;
use crate::db::writer::UesWriter;
use crate::domain::EntityType;
use crate::error::ApiResult;
use crate::matchers::{match_competitions, match_matches, match_players, match_seasons, match_teams};
use crate::mergers::{merge_competitions, merge_matches, merge_players, merge_seasons, merge_teams};
use crate::monitoring::anomaly::{detect_anomalies, AnomalyEvent, StageRates};
use crate::monitoring::triage::generate_triage_report;
use crate::normalizers::{normalize_name, normalize_season};
use crate::qa::gates::{evaluate_quality_gates, QualityGateResult};
use crate::validation::adapters::{
    adapt_competition_candidate, adapt_match_candidate, adapt_player_candidate, adapt_season_candidate,
    adapt_team_candidate,
};
use crate::validation::llm_client::LlmClient;
use crate::validation::router::{route_candidates, RoutingOutcome, StageMetrics};

const LOOKBACK: i64 = 8;

pub struct PipelineOutcome {
    pub run_id: String,
    pub quality_gate: QualityGateResult,
}

fn rates_from_history(record: &crate::db::reader::RunMetricsRecord) -> StageRates {
    let denom = record.total_candidates.max(1) as f64;
    StageRates {
        gray_zone_rate: record.gray_zone_sent as f64 / denom,
        llm_review_rate: record.llm_review as f64 / denom,
        auto_match_rate: record.auto_match as f64 / denom,
        auto_reject_rate: record.auto_reject as f64 / denom,
    }
}

/// Shared bookkeeping after a stage's candidates have been routed: persists
/// reviews and metrics, detects drift against this entity type's history,
/// and (when enabled) asks for a triage report. Returns the anomalies found
/// so the caller can fold them into the end-of-run quality gate.
async fn finalize_stage(
    writer: &UesWriter,
    ues_pool: &SqlitePool,
    config: &Config,
    llm_client: &dyn LlmClient,
    run_id: &str,
    entity_type: EntityType,
    outcomes: &[RoutingOutcome],
    metrics: &StageMetrics,
    started_at: &str,
    finished_at: &str,
    llm_disabled_reason: Option<&str>,
) -> ApiResult<Vec<AnomalyEvent>> {
    for outcome in outcomes {
        if let Some(review) = &outcome.review {
            writer.write_review(run_id, entity_type, review).await?;
        }
    }
    writer
        .write_metrics(
            run_id,
            entity_type,
            metrics,
            started_at,
            finished_at,
            metrics.llm_avg_latency_ms(),
            config.llm_validation.fallback_mode_when_llm_unhealthy,
            llm_disabled_reason,
        )
        .await?;

    let history = metrics_history(ues_pool, entity_type, run_id, LOOKBACK).await?;
    let baseline: Vec<StageRates> = history.iter().map(rates_from_history).collect();
    let current = StageRates::from_metrics(metrics);
    let anomalies = detect_anomalies(entity_type, current, &baseline);
    if !anomalies.is_empty() {
        writer.write_anomalies(run_id, &anomalies).await?;
    }

    if config.database.auto_triage_during_mapping {
        let report = generate_triage_report(ues_pool, llm_client, &config.llm_validation, run_id, entity_type).await;
        let report_json = serde_json::to_value(&report).unwrap_or(serde_json::Value::Null);
        writer.write_triage_report(run_id, entity_type, &report_json).await?;
    }

    Ok(anomalies)
}

/// Runs one full mapping pass end to end: loads both sources, resets the
/// UES store, then works through the five stages in dependency order
/// (matches depends on every earlier stage's id map), and finally scores
/// the run against the configured quality gates. Returns the run id used
/// (generated when the caller doesn't supply one) and the gate verdict.
pub async fn run_pipeline(
    pools: &crate::db::DbPools,
    config: &Config,
    llm_client: &dyn LlmClient,
    run_id: Option<String>,
) -> ApiResult<PipelineOutcome> {
    let run_id = run_id.unwrap_or_else(|| Uuid::new_v4().to_string());

    let alpha_data = load_alpha_data(&pools.alpha).await?;
    let beta_data = load_beta_data(&pools.beta).await?;

    let writer = UesWriter::new(pools.ues.clone());
    writer.reset().await?;

    let alpha_teams_by_id: HashMap<i64, _> = alpha_data.teams.iter().cloned().map(|t| (t.team_id, t)).collect();
    let beta_teams_by_id: HashMap<i64, _> = beta_data.teams.iter().cloned().map(|t| (t.id, t)).collect();
    let beta_competitions_by_id: HashMap<i64, _> =
        beta_data.competitions.iter().cloned().map(|c| (c.id, c)).collect();
    let beta_seasons_by_id: HashMap<i64, _> = beta_data.seasons.iter().cloned().map(|s| (s.id, s)).collect();
    let alpha_players_by_id: HashMap<i64, _> = alpha_data.players.iter().cloned().map(|p| (p.player_id, p)).collect();
    let beta_players_by_id: HashMap<i64, _> = beta_data.players.iter().cloned().map(|p| (p.id, p)).collect();
    let alpha_matches_by_id: HashMap<i64, _> = alpha_data.matches.iter().cloned().map(|m| (m.match_id, m)).collect();
    let beta_matches_by_id: HashMap<i64, _> = beta_data.matches.iter().cloned().map(|m| (m.id, m)).collect();

    // --- teams ---------------------------------------------------------
    let team_candidates =
        match_teams(&alpha_data.teams, &beta_data.teams, &config.mapping_rules.team_name_aliases, config.thresholds.team_sim_threshold);
    let team_validation_candidates = team_candidates
        .iter()
        .map(|c| {
            let beta_country = beta_teams_by_id.get(&c.beta_team_id).and_then(|b| b.region.as_deref());
            adapt_team_candidate(c, beta_country, &config.normalization.countries)
        })
        .collect();
    let team_started_at = Utc::now().to_rfc3339();
    let (team_outcomes, team_metrics, team_llm_disabled) =
        route_candidates(llm_client, &config.llm_validation, EntityType::Team, team_validation_candidates).await;
    let team_finished_at = Utc::now().to_rfc3339();
    let team_anomalies = finalize_stage(
        &writer,
        &pools.ues,
        config,
        llm_client,
        &run_id,
        EntityType::Team,
        &team_outcomes,
        &team_metrics,
        &team_started_at,
        &team_finished_at,
        team_llm_disabled,
    )
    .await?;

    let approved_team_candidates: Vec<_> = team_candidates
        .into_iter()
        .zip(team_outcomes.iter())
        .filter(|(_, outcome)| outcome.approved)
        .map(|(candidate, _)| candidate)
        .collect();
    let alpha_team_to_beta: HashMap<i64, i64> =
        approved_team_candidates.iter().map(|c| (c.alpha_team_id, c.beta_team_id)).collect();
    let team_merge = merge_teams(&approved_team_candidates, &alpha_teams_by_id, &beta_teams_by_id);
    writer.write_teams(&team_merge.ues_teams).await?;

    // --- competitions ----------------------------------------------------
    let comp_candidates = match_competitions(
        &alpha_data.competitions,
        &beta_data.competitions,
        &config.normalization.competition_sponsors,
        config.thresholds.comp_sim_threshold,
    );
    let comp_validation_candidates = comp_candidates
        .iter()
        .map(|c| {
            let beta_locale = beta_competitions_by_id.get(&c.beta_competition_id).and_then(|b| b.locale.as_deref());
            adapt_competition_candidate(c, beta_locale, &config.normalization.countries)
        })
        .collect();
    let comp_started_at = Utc::now().to_rfc3339();
    let (comp_outcomes, comp_metrics, comp_llm_disabled) = route_candidates(
        llm_client,
        &config.llm_validation,
        EntityType::Competition,
        comp_validation_candidates,
    )
    .await;
    let comp_finished_at = Utc::now().to_rfc3339();
    let comp_anomalies = finalize_stage(
        &writer,
        &pools.ues,
        config,
        llm_client,
        &run_id,
        EntityType::Competition,
        &comp_outcomes,
        &comp_metrics,
        &comp_started_at,
        &comp_finished_at,
        comp_llm_disabled,
    )
    .await?;

    let approved_comp_candidates: Vec<_> = comp_candidates
        .into_iter()
        .zip(comp_outcomes.iter())
        .filter(|(_, outcome)| outcome.approved)
        .map(|(candidate, _)| candidate)
        .collect();
    let comp_map: HashMap<i64, i64> =
        approved_comp_candidates.iter().map(|c| (c.alpha_competition_id, c.beta_competition_id)).collect();
    let comp_merge = merge_competitions(&approved_comp_candidates);
    writer.write_competitions(&comp_merge.ues_competitions).await?;

    // --- seasons -----------------------------------------------------------
    let season_candidates =
        match_seasons(&alpha_data.seasons, &beta_data.seasons, &comp_map, config.thresholds.confidence_review);
    let season_validation_candidates = season_candidates
        .iter()
        .map(|c| {
            let beta_start_year =
                beta_seasons_by_id.get(&c.beta_season_id).and_then(|b| normalize_season(&b.label).0);
            adapt_season_candidate(c, beta_start_year)
        })
        .collect();
    let season_started_at = Utc::now().to_rfc3339();
    let (season_outcomes, season_metrics, season_llm_disabled) =
        route_candidates(llm_client, &config.llm_validation, EntityType::Season, season_validation_candidates).await;
    let season_finished_at = Utc::now().to_rfc3339();
    let season_anomalies = finalize_stage(
        &writer,
        &pools.ues,
        config,
        llm_client,
        &run_id,
        EntityType::Season,
        &season_outcomes,
        &season_metrics,
        &season_started_at,
        &season_finished_at,
        season_llm_disabled,
    )
    .await?;

    let approved_season_candidates: Vec<_> = season_candidates
        .into_iter()
        .zip(season_outcomes.iter())
        .filter(|(_, outcome)| outcome.approved)
        .map(|(candidate, _)| candidate)
        .collect();
    let season_map: HashMap<i64, i64> =
        approved_season_candidates.iter().map(|c| (c.alpha_season_id, c.beta_season_id)).collect();
    let season_merge = merge_seasons(&approved_season_candidates, &comp_merge.alpha_to_ues, &comp_merge.beta_to_ues);
    writer.write_seasons(&season_merge.ues_seasons).await?;

    // --- players -----------------------------------------------------------
    let beta_team_name_index: HashMap<String, i64> =
        beta_data.teams.iter().map(|t| (normalize_name(&t.display_name), t.id)).collect();
    let player_candidates = match_players(
        &alpha_data.players,
        &beta_data.players,
        &alpha_team_to_beta,
        &beta_team_name_index,
        config.thresholds.dob_partial_score,
        config.thresholds.confidence_autopass,
    );
    let player_validation_candidates = player_candidates
        .iter()
        .map(|c| {
            let alpha_dob_year = alpha_players_by_id.get(&c.alpha_player_id).and_then(|p| p.dob.map(|d| d.year()));
            let beta_birth_year = beta_players_by_id.get(&c.beta_player_id).and_then(|p| p.birth_year);
            adapt_player_candidate(c, alpha_dob_year, beta_birth_year)
        })
        .collect();
    let player_started_at = Utc::now().to_rfc3339();
    let (player_outcomes, player_metrics, player_llm_disabled) =
        route_candidates(llm_client, &config.llm_validation, EntityType::Player, player_validation_candidates).await;
    let player_finished_at = Utc::now().to_rfc3339();
    let player_anomalies = finalize_stage(
        &writer,
        &pools.ues,
        config,
        llm_client,
        &run_id,
        EntityType::Player,
        &player_outcomes,
        &player_metrics,
        &player_started_at,
        &player_finished_at,
        player_llm_disabled,
    )
    .await?;

    let approved_player_candidates: Vec<_> = player_candidates
        .into_iter()
        .zip(player_outcomes.iter())
        .filter(|(_, outcome)| outcome.approved)
        .map(|(candidate, _)| candidate)
        .collect();
    let player_merge = merge_players(
        &approved_player_candidates,
        &alpha_players_by_id,
        &beta_players_by_id,
        &team_merge.alpha_to_ues,
        &config.normalization.countries,
    );
    writer.write_players(&player_merge.ues_players).await?;

    // --- matches -------------------------------------------------------
    let match_candidates = match_matches(
        &alpha_data.matches,
        &beta_data.matches,
        &comp_map,
        &season_map,
        &alpha_team_to_beta,
        &HashMap::new(),
        config.thresholds.confidence_review,
    );
    let match_validation_candidates = match_candidates
        .iter()
        .map(|c| {
            let alpha_date_days = alpha_matches_by_id
                .get(&c.alpha_match_id)
                .and_then(|m| m.match_date)
                .map(|d| d.num_days_from_ce() as i64);
            let beta_date_days = beta_matches_by_id
                .get(&c.beta_match_id)
                .and_then(|m| m.match_date)
                .map(|d| d.num_days_from_ce() as i64);
            adapt_match_candidate(c, alpha_date_days, beta_date_days)
        })
        .collect();
    let match_started_at = Utc::now().to_rfc3339();
    let (match_outcomes, match_metrics, match_llm_disabled) =
        route_candidates(llm_client, &config.llm_validation, EntityType::Match, match_validation_candidates).await;
    let match_finished_at = Utc::now().to_rfc3339();
    let match_anomalies = finalize_stage(
        &writer,
        &pools.ues,
        config,
        llm_client,
        &run_id,
        EntityType::Match,
        &match_outcomes,
        &match_metrics,
        &match_started_at,
        &match_finished_at,
        match_llm_disabled,
    )
    .await?;

    let approved_match_candidates: Vec<_> = match_candidates
        .into_iter()
        .zip(match_outcomes.iter())
        .filter(|(_, outcome)| outcome.approved)
        .map(|(candidate, _)| candidate)
        .collect();
    let ues_matches = merge_matches(
        &approved_match_candidates,
        &alpha_matches_by_id,
        &team_merge.alpha_to_ues,
        &season_merge.alpha_to_ues,
        &comp_merge.alpha_to_ues,
    );
    writer.write_matches(&ues_matches).await?;

    // --- quality gates ---------------------------------------------------
    let metrics_by_entity_type = vec![
        (EntityType::Team, team_metrics),
        (EntityType::Competition, comp_metrics),
        (EntityType::Season, season_metrics),
        (EntityType::Player, player_metrics),
        (EntityType::Match, match_metrics),
    ];
    let all_anomalies: Vec<AnomalyEvent> = team_anomalies
        .into_iter()
        .chain(comp_anomalies)
        .chain(season_anomalies)
        .chain(player_anomalies)
        .chain(match_anomalies)
        .collect();
    let quality_gate = evaluate_quality_gates(&config.quality_gates, &metrics_by_entity_type, &all_anomalies);
    writer.write_quality_gate_result(&run_id, &quality_gate).await?;

    Ok(PipelineOutcome { run_id, quality_gate })
}
