//! Read-only queries backing the HTTP admin surface: entity/lineage fetch,
//! review listing and status transitions, and the monitoring read endpoints.

use serde::Serialize;
use serde_json::Value as Json;
use sqlx::SqlitePool;

use crate::domain::{EntityType, UesPlayer};
use crate::error::{ApiError, ApiResult};

pub async fn get_player(pool: &SqlitePool, ues_id: &str) -> ApiResult<Option<UesPlayer>> {
    let player = sqlx::query_as::<_, UesPlayer>(
        "SELECT ues_player_id, canonical_name, dob, birth_year, nationality, height_cm, foot, team_ues_id, \
         merge_confidence, lineage FROM ues_players WHERE ues_player_id = ?",
    )
    .bind(ues_id)
    .fetch_optional(pool)
    .await?;
    Ok(player)
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct LineageSourceRow {
    pub source_system: String,
    pub source_id: String,
}

pub async fn get_player_lineage(pool: &SqlitePool, ues_id: &str) -> ApiResult<Vec<LineageSourceRow>> {
    let rows = sqlx::query_as::<_, LineageSourceRow>(
        "SELECT source_system, source_id FROM source_lineage \
         WHERE ues_entity_type = 'player' AND ues_entity_id = ?",
    )
    .bind(ues_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

async fn lookup_player_by_source(pool: &SqlitePool, source_system: &str, source_id: &str) -> ApiResult<Option<String>> {
    let row: Option<(String,)> = sqlx::query_as(
        "SELECT ues_entity_id FROM source_lineage \
         WHERE ues_entity_type = 'player' AND source_system = ? AND source_id = ?",
    )
    .bind(source_system)
    .bind(source_id)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(|(id,)| id))
}

pub async fn lookup_player_by_alpha(pool: &SqlitePool, alpha_id: &str) -> ApiResult<Option<String>> {
    lookup_player_by_source(pool, "ALPHA", alpha_id).await
}

pub async fn lookup_player_by_beta(pool: &SqlitePool, beta_id: &str) -> ApiResult<Option<String>> {
    lookup_player_by_source(pool, "BETA", beta_id).await
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct ReviewRow {
    id: i64,
    run_id: String,
    entity_type: String,
    left_id: String,
    right_id: String,
    matcher_score: f64,
    signals: String,
    llm_decision: String,
    llm_confidence: f64,
    reasons: String,
    risk_flags: String,
    status: String,
    created_at: String,
    updated_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReviewRecord {
    pub id: i64,
    pub run_id: String,
    pub entity_type: String,
    pub left_id: String,
    pub right_id: String,
    pub matcher_score: f64,
    pub signals: Json,
    pub llm_decision: String,
    pub llm_confidence: f64,
    pub reasons: Vec<String>,
    pub risk_flags: Vec<String>,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<ReviewRow> for ReviewRecord {
    fn from(row: ReviewRow) -> Self {
        Self {
            id: row.id,
            run_id: row.run_id,
            entity_type: row.entity_type,
            left_id: row.left_id,
            right_id: row.right_id,
            matcher_score: row.matcher_score,
            signals: serde_json::from_str(&row.signals).unwrap_or(Json::Null),
            llm_decision: row.llm_decision,
            llm_confidence: row.llm_confidence,
            reasons: serde_json::from_str(&row.reasons).unwrap_or_default(),
            risk_flags: serde_json::from_str(&row.risk_flags).unwrap_or_default(),
            status: row.status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Default)]
pub struct ReviewFilter {
    pub status: Option<String>,
    pub entity_type: Option<EntityType>,
    pub run_id: Option<String>,
    pub min_score: Option<f64>,
    pub max_score: Option<f64>,
    pub limit: i64,
    pub offset: i64,
}

pub async fn list_reviews(pool: &SqlitePool, filter: &ReviewFilter) -> ApiResult<Vec<ReviewRecord>> {
    let mut sql = String::from(
        "SELECT id, run_id, entity_type, left_id, right_id, matcher_score, signals, llm_decision, \
         llm_confidence, reasons, risk_flags, status, created_at, updated_at FROM llm_match_reviews WHERE 1=1",
    );
    if filter.status.is_some() {
        sql.push_str(" AND status = ?");
    }
    if filter.entity_type.is_some() {
        sql.push_str(" AND entity_type = ?");
    }
    if filter.run_id.is_some() {
        sql.push_str(" AND run_id = ?");
    }
    if filter.min_score.is_some() {
        sql.push_str(" AND matcher_score >= ?");
    }
    if filter.max_score.is_some() {
        sql.push_str(" AND matcher_score <= ?");
    }
    sql.push_str(" ORDER BY created_at DESC LIMIT ? OFFSET ?");

    let mut query = sqlx::query_as::<_, ReviewRow>(&sql);
    if let Some(status) = &filter.status {
        query = query.bind(status);
    }
    if let Some(entity_type) = filter.entity_type {
        query = query.bind(entity_type.as_str());
    }
    if let Some(run_id) = &filter.run_id {
        query = query.bind(run_id);
    }
    if let Some(min_score) = filter.min_score {
        query = query.bind(min_score);
    }
    if let Some(max_score) = filter.max_score {
        query = query.bind(max_score);
    }
    query = query.bind(filter.limit).bind(filter.offset);

    let rows = query.fetch_all(pool).await?;
    Ok(rows.into_iter().map(ReviewRecord::from).collect())
}

pub async fn get_review(pool: &SqlitePool, id: i64) -> ApiResult<Option<ReviewRecord>> {
    let row = sqlx::query_as::<_, ReviewRow>(
        "SELECT id, run_id, entity_type, left_id, right_id, matcher_score, signals, llm_decision, \
         llm_confidence, reasons, risk_flags, status, created_at, updated_at \
         FROM llm_match_reviews WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(ReviewRecord::from))
}

pub async fn update_review_status(pool: &SqlitePool, id: i64, status: &str) -> ApiResult<()> {
    let now = chrono::Utc::now().to_rfc3339();
    let result = sqlx::query("UPDATE llm_match_reviews SET status = ?, updated_at = ? WHERE id = ?")
        .bind(status)
        .bind(&now)
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::not_found(format!("review {id}")));
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct AnomalyEventRecord {
    pub run_id: String,
    pub entity_type: String,
    pub metric_name: String,
    pub current_value: f64,
    pub baseline_value: f64,
    pub z_score: f64,
    pub severity: String,
    pub created_at: String,
}

pub async fn list_anomalies(pool: &SqlitePool, run_id: Option<&str>) -> ApiResult<Vec<AnomalyEventRecord>> {
    let rows = if let Some(run_id) = run_id {
        sqlx::query_as::<_, AnomalyEventRecord>(
            "SELECT run_id, entity_type, metric_name, current_value, baseline_value, z_score, severity, created_at \
             FROM anomaly_events WHERE run_id = ? ORDER BY created_at DESC",
        )
        .bind(run_id)
        .fetch_all(pool)
        .await?
    } else {
        sqlx::query_as::<_, AnomalyEventRecord>(
            "SELECT run_id, entity_type, metric_name, current_value, baseline_value, z_score, severity, created_at \
             FROM anomaly_events ORDER BY created_at DESC LIMIT 200",
        )
        .fetch_all(pool)
        .await?
    };
    Ok(rows)
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct RunMetricsRecord {
    pub run_id: String,
    pub entity_type: String,
    pub total_candidates: i64,
    pub auto_match: i64,
    pub auto_reject: i64,
    pub gray_zone_sent: i64,
    pub llm_match: i64,
    pub llm_no_match: i64,
    pub llm_review: i64,
    pub llm_call: i64,
    pub llm_error: i64,
    pub llm_invalid_json_retry: i64,
    pub llm_avg_latency_ms: Option<f64>,
    pub llm_fallback_mode: Option<String>,
    pub llm_disabled_reason: Option<String>,
    pub started_at: String,
    pub finished_at: Option<String>,
}

pub async fn run_metrics(pool: &SqlitePool, run_id: &str) -> ApiResult<Vec<RunMetricsRecord>> {
    let rows = sqlx::query_as::<_, RunMetricsRecord>(
        "SELECT * FROM pipeline_run_metrics WHERE run_id = ?",
    )
    .bind(run_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Prior runs' metrics for one entity type, most-recent-finished first,
/// excluding the run currently being scored. Backs anomaly detection's
/// baseline lookup; SQLite sorts NULL `finished_at` last under `DESC`, so an
/// in-flight run never poisons the baseline.
pub async fn metrics_history(
    pool: &SqlitePool,
    entity_type: EntityType,
    exclude_run_id: &str,
    limit: i64,
) -> ApiResult<Vec<RunMetricsRecord>> {
    let rows = sqlx::query_as::<_, RunMetricsRecord>(
        "SELECT * FROM pipeline_run_metrics WHERE entity_type = ? AND run_id != ? \
         ORDER BY finished_at DESC LIMIT ?",
    )
    .bind(entity_type.as_str())
    .bind(exclude_run_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

#[derive(Debug, Clone, Serialize)]
pub struct QualityReport {
    pub run_id: String,
    pub metrics: Vec<RunMetricsRecord>,
    pub anomalies: Vec<AnomalyEventRecord>,
    pub review_counts: std::collections::HashMap<String, std::collections::HashMap<String, i64>>,
}

/// Read-side aggregation for `GET /monitoring/report`: joins per-entity-type
/// run metrics with anomaly counts and review-status breakdowns. Pure read,
/// no config dependency beyond the pool.
pub async fn build_quality_report(pool: &SqlitePool, run_id: &str) -> ApiResult<QualityReport> {
    let metrics = run_metrics(pool, run_id).await?;
    let anomalies = list_anomalies(pool, Some(run_id)).await?;

    let rows: Vec<(String, String, i64)> = sqlx::query_as(
        "SELECT entity_type, status, COUNT(*) as count FROM llm_match_reviews \
         WHERE run_id = ? GROUP BY entity_type, status",
    )
    .bind(run_id)
    .fetch_all(pool)
    .await?;

    let mut review_counts: std::collections::HashMap<String, std::collections::HashMap<String, i64>> =
        std::collections::HashMap::new();
    for (entity_type, status, count) in rows {
        review_counts.entry(entity_type).or_default().insert(status, count);
    }

    Ok(QualityReport { run_id: run_id.to_string(), metrics, anomalies, review_counts })
}
