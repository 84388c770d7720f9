//! LLM-or-fallback triage reports for a stage's anomalies: a short
//! human-readable diagnosis written to `anomaly_triage_reports`, never fatal
//! to the run it's attached to.

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::db::reader::{list_anomalies, AnomalyEventRecord};
use crate::domain::EntityType;
use crate::validation::config::LlmValidationConfig;
use crate::validation::llm_client::LlmClient;

const SYSTEM_PROMPT: &str =
    "You are a data quality analyst. Return JSON with summary, likely_causes, impact, suggested_actions, queries_to_run.";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriageReport {
    pub summary: String,
    #[serde(default)]
    pub likely_causes: Vec<String>,
    pub impact: String,
    #[serde(default)]
    pub suggested_actions: Vec<String>,
    #[serde(default)]
    pub queries_to_run: Vec<String>,
}

fn fallback_report(anomalies: &[AnomalyEventRecord]) -> TriageReport {
    let summary = if anomalies.is_empty() { "No anomalies detected." } else { "Anomalies detected." };
    let likely_causes = anomalies
        .iter()
        .map(|a| format!("{} drift (z={:.2})", a.metric_name, a.z_score))
        .collect();
    TriageReport {
        summary: summary.to_string(),
        likely_causes,
        impact: "Review pipeline metrics and LLM decisions.".to_string(),
        suggested_actions: vec![
            "Inspect recent matcher thresholds".to_string(),
            "Sample review items".to_string(),
        ],
        queries_to_run: vec![
            "SELECT * FROM pipeline_run_metrics WHERE run_id = '<RUN_ID>';".to_string(),
            "SELECT * FROM llm_match_reviews WHERE run_id = '<RUN_ID>' LIMIT 50;".to_string(),
        ],
    }
}

/// Loads this stage's anomaly events, asks the configured LLM for a
/// diagnosis when reporting is enabled and healthy, else builds a
/// deterministic fallback report purely from the anomaly list. Always
/// persists whatever report it produces; never returns an error that should
/// abort the run — the caller logs and moves on.
pub async fn generate_triage_report(
    pool: &SqlitePool,
    client: &dyn LlmClient,
    config: &LlmValidationConfig,
    run_id: &str,
    entity_type: EntityType,
) -> TriageReport {
    let anomalies = list_anomalies(pool, Some(run_id)).await.unwrap_or_default();
    let anomalies: Vec<_> = anomalies.into_iter().filter(|a| a.entity_type == entity_type.as_str()).collect();

    if !config.reporting_llm_enabled() {
        return fallback_report(&anomalies);
    }

    let payload = serde_json::json!({
        "run_id": run_id,
        "entity_type": entity_type.as_str(),
        "anomalies": anomalies,
    });
    let user_prompt = payload.to_string();

    match client.request_json(SYSTEM_PROMPT, &user_prompt).await {
        Ok(response) => {
            serde_json::from_value::<TriageReport>(response.body).unwrap_or_else(|_| fallback_report(&anomalies))
        }
        Err(_) => fallback_report(&anomalies),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_report_summarizes_empty_anomalies() {
        let report = fallback_report(&[]);
        assert_eq!(report.summary, "No anomalies detected.");
        assert!(report.likely_causes.is_empty());
    }

    #[test]
    fn fallback_report_lists_each_anomaly_as_a_likely_cause() {
        let anomalies = vec![AnomalyEventRecord {
            run_id: "r1".to_string(),
            entity_type: "team".to_string(),
            metric_name: "gray_zone_rate".to_string(),
            current_value: 0.5,
            baseline_value: 0.1,
            z_score: 4.2,
            severity: "HIGH".to_string(),
            created_at: "now".to_string(),
        }];
        let report = fallback_report(&anomalies);
        assert_eq!(report.likely_causes.len(), 1);
        assert!(report.likely_causes[0].contains("gray_zone_rate"));
    }
}
