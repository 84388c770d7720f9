//! Idempotent bulk persistence of a run's output: canonical entities,
//! provenance, reviews, metrics, anomalies, and quality-gate results.

use chrono::Utc;
use sqlx::SqlitePool;

use crate::domain::{EntityType, Lineage, UesCompetition, UesMatch, UesPlayer, UesSeason, UesTeam};
use crate::error::ApiResult;
use crate::monitoring::anomaly::AnomalyEvent;
use crate::qa::gates::QualityGateResult;
use crate::validation::router::{ReviewRow, StageMetrics};
use crate::validation::config::FallbackMode;

pub struct UesWriter {
    pool: SqlitePool,
}

fn lineage_sources(lineage_json: &serde_json::Value) -> Vec<(&'static str, String)> {
    let lineage: Lineage = match serde_json::from_value(lineage_json.clone()) {
        Ok(l) => l,
        Err(_) => return Vec::new(),
    };
    lineage.sources.into_iter().map(|s| (s.source, s.id)).collect()
}

impl UesWriter {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Wipes every UES/run-scoped table under one transaction. Called at the
    /// start of each run — the pipeline is idempotent per `run_id`, not
    /// additive across runs.
    pub async fn reset(&self) -> ApiResult<()> {
        let mut tx = self.pool.begin().await?;
        for table in [
            "ues_teams",
            "ues_competitions",
            "ues_seasons",
            "ues_players",
            "ues_matches",
            "source_lineage",
            "llm_match_reviews",
            "pipeline_run_metrics",
            "anomaly_events",
            "anomaly_triage_reports",
            "quality_gate_results",
        ] {
            sqlx::query(&format!("DELETE FROM {table}")).execute(&mut *tx).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn write_source_lineage(
        &self,
        entity_type: EntityType,
        entity_id: &str,
        lineage_json: &serde_json::Value,
    ) -> ApiResult<()> {
        for (source, source_id) in lineage_sources(lineage_json) {
            sqlx::query(
                "INSERT INTO source_lineage (source_system, source_id, ues_entity_type, ues_entity_id) \
                 VALUES (?, ?, ?, ?)",
            )
            .bind(source)
            .bind(source_id)
            .bind(entity_type.as_str())
            .bind(entity_id)
            .execute(&self.pool)
            .await?;
        }
        Ok(())
    }

    pub async fn write_teams(&self, teams: &[UesTeam]) -> ApiResult<()> {
        for team in teams {
            sqlx::query(
                "INSERT OR REPLACE INTO ues_teams (ues_team_id, name, country, merge_confidence, lineage) \
                 VALUES (?, ?, ?, ?, ?)",
            )
            .bind(&team.ues_team_id)
            .bind(&team.name)
            .bind(&team.country)
            .bind(team.merge_confidence)
            .bind(team.lineage.to_string())
            .execute(&self.pool)
            .await?;
            self.write_source_lineage(EntityType::Team, &team.ues_team_id, &team.lineage).await?;
        }
        Ok(())
    }

    pub async fn write_competitions(&self, competitions: &[UesCompetition]) -> ApiResult<()> {
        for competition in competitions {
            sqlx::query(
                "INSERT OR REPLACE INTO ues_competitions \
                 (ues_competition_id, name, country, merge_confidence, lineage) VALUES (?, ?, ?, ?, ?)",
            )
            .bind(&competition.ues_competition_id)
            .bind(&competition.name)
            .bind(&competition.country)
            .bind(competition.merge_confidence)
            .bind(competition.lineage.to_string())
            .execute(&self.pool)
            .await?;
            self.write_source_lineage(EntityType::Competition, &competition.ues_competition_id, &competition.lineage)
                .await?;
        }
        Ok(())
    }

    pub async fn write_seasons(&self, seasons: &[UesSeason]) -> ApiResult<()> {
        for season in seasons {
            sqlx::query(
                "INSERT OR REPLACE INTO ues_seasons \
                 (ues_season_id, start_year, end_year, competition_ues_id, merge_confidence, lineage) \
                 VALUES (?, ?, ?, ?, ?, ?)",
            )
            .bind(&season.ues_season_id)
            .bind(season.start_year)
            .bind(season.end_year)
            .bind(&season.competition_ues_id)
            .bind(season.merge_confidence)
            .bind(season.lineage.to_string())
            .execute(&self.pool)
            .await?;
            self.write_source_lineage(EntityType::Season, &season.ues_season_id, &season.lineage).await?;
        }
        Ok(())
    }

    pub async fn write_players(&self, players: &[UesPlayer]) -> ApiResult<()> {
        for player in players {
            sqlx::query(
                "INSERT OR REPLACE INTO ues_players \
                 (ues_player_id, canonical_name, dob, birth_year, nationality, height_cm, foot, team_ues_id, \
                  merge_confidence, lineage) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(&player.ues_player_id)
            .bind(&player.canonical_name)
            .bind(player.dob)
            .bind(player.birth_year)
            .bind(&player.nationality)
            .bind(player.height_cm)
            .bind(&player.foot)
            .bind(&player.team_ues_id)
            .bind(player.merge_confidence)
            .bind(player.lineage.to_string())
            .execute(&self.pool)
            .await?;
            self.write_source_lineage(EntityType::Player, &player.ues_player_id, &player.lineage).await?;
        }
        Ok(())
    }

    pub async fn write_matches(&self, matches: &[UesMatch]) -> ApiResult<()> {
        for m in matches {
            sqlx::query(
                "INSERT OR REPLACE INTO ues_matches \
                 (ues_match_id, home_team_ues_id, away_team_ues_id, season_ues_id, competition_ues_id, \
                  match_date, merge_confidence, lineage) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(&m.ues_match_id)
            .bind(&m.home_team_ues_id)
            .bind(&m.away_team_ues_id)
            .bind(&m.season_ues_id)
            .bind(&m.competition_ues_id)
            .bind(m.match_date)
            .bind(m.merge_confidence)
            .bind(m.lineage.to_string())
            .execute(&self.pool)
            .await?;
            self.write_source_lineage(EntityType::Match, &m.ues_match_id, &m.lineage).await?;
        }
        Ok(())
    }

    pub async fn write_review(&self, run_id: &str, entity_type: EntityType, review: &ReviewRow) -> ApiResult<()> {
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            "INSERT INTO llm_match_reviews \
             (run_id, entity_type, left_id, right_id, matcher_score, signals, llm_decision, llm_confidence, \
              reasons, risk_flags, status, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 'PENDING', ?, ?)",
        )
        .bind(run_id)
        .bind(entity_type.as_str())
        .bind(&review.candidate.left_id)
        .bind(&review.candidate.right_id)
        .bind(review.candidate.matcher_score)
        .bind(review.candidate.signals.to_string())
        .bind(review.llm_decision.to_string())
        .bind(review.llm_confidence)
        .bind(serde_json::to_string(&review.reasons).unwrap_or_else(|_| "[]".to_string()))
        .bind(serde_json::to_string(&review.risk_flags).unwrap_or_else(|_| "[]".to_string()))
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn write_metrics(
        &self,
        run_id: &str,
        entity_type: EntityType,
        metrics: &StageMetrics,
        started_at: &str,
        finished_at: &str,
        llm_avg_latency_ms: Option<f64>,
        fallback_mode: FallbackMode,
        llm_disabled_reason: Option<&str>,
    ) -> ApiResult<()> {
        sqlx::query(
            "INSERT OR REPLACE INTO pipeline_run_metrics \
             (run_id, entity_type, total_candidates, auto_match, auto_reject, gray_zone_sent, llm_match, \
              llm_no_match, llm_review, llm_call, llm_error, llm_invalid_json_retry, llm_avg_latency_ms, \
              llm_fallback_mode, llm_disabled_reason, started_at, finished_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(run_id)
        .bind(entity_type.as_str())
        .bind(metrics.total_candidates as i64)
        .bind(metrics.auto_approve_count as i64)
        .bind(metrics.auto_reject_count as i64)
        .bind(metrics.gray_zone_sent_count as i64)
        .bind(metrics.llm_match as i64)
        .bind(metrics.llm_no_match as i64)
        .bind(metrics.llm_review as i64)
        .bind(metrics.llm_call_count as i64)
        .bind(metrics.llm_error_count as i64)
        .bind(metrics.llm_invalid_json_retry_count as i64)
        .bind(llm_avg_latency_ms)
        .bind(fallback_mode.as_str())
        .bind(llm_disabled_reason)
        .bind(started_at)
        .bind(finished_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn write_anomalies(&self, run_id: &str, events: &[AnomalyEvent]) -> ApiResult<()> {
        let now = Utc::now().to_rfc3339();
        for event in events {
            sqlx::query(
                "INSERT INTO anomaly_events \
                 (run_id, entity_type, metric_name, current_value, baseline_value, z_score, severity, created_at) \
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(run_id)
            .bind(event.entity_type.as_str())
            .bind(&event.metric_name)
            .bind(event.current_value)
            .bind(event.baseline_value)
            .bind(event.z_score)
            .bind(&event.severity)
            .bind(&now)
            .execute(&self.pool)
            .await?;
        }
        Ok(())
    }

    pub async fn write_triage_report(
        &self,
        run_id: &str,
        entity_type: EntityType,
        report: &serde_json::Value,
    ) -> ApiResult<()> {
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            "INSERT INTO anomaly_triage_reports (run_id, entity_type, report, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(run_id)
        .bind(entity_type.as_str())
        .bind(report.to_string())
        .bind(&now)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn write_quality_gate_result(&self, run_id: &str, result: &QualityGateResult) -> ApiResult<()> {
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            "INSERT OR REPLACE INTO quality_gate_results (run_id, status, failed_gates, gate_values, created_at) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(run_id)
        .bind(result.status.as_str())
        .bind(serde_json::to_string(&result.failed_gates).unwrap_or_else(|_| "[]".to_string()))
        .bind(result.gate_values.to_string())
        .bind(&now)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
