//! Quality gates: classifies a completed run PASS/FAIL against configured
//! rate ceilings and the high-severity anomaly count.

use serde::{Deserialize, Serialize};

use crate::domain::EntityType;
use crate::monitoring::anomaly::AnomalyEvent;
use crate::validation::router::StageMetrics;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityGateConfig {
    pub max_llm_review_rate: f64,
    pub max_gray_zone_rate: f64,
    pub max_llm_error_rate: f64,
    pub fail_on_high_severity_anomalies: bool,
}

impl Default for QualityGateConfig {
    fn default() -> Self {
        Self {
            max_llm_review_rate: 0.30,
            max_gray_zone_rate: 0.40,
            max_llm_error_rate: 0.20,
            fail_on_high_severity_anomalies: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GateStatus {
    Pass,
    Fail,
}

impl GateStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pass => "PASS",
            Self::Fail => "FAIL",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct QualityGateResult {
    pub status: GateStatus,
    pub failed_gates: Vec<String>,
    pub gate_values: serde_json::Value,
}

fn rate(numerator: u64, denominator: u64) -> f64 {
    numerator as f64 / (denominator.max(1) as f64)
}

/// Aggregates every entity type's stage metrics for the run plus the
/// already-detected anomaly events, and checks them against the configured
/// ceilings.
pub fn evaluate_quality_gates(
    config: &QualityGateConfig,
    metrics_by_entity_type: &[(EntityType, StageMetrics)],
    anomalies: &[AnomalyEvent],
) -> QualityGateResult {
    let total_candidates: u64 = metrics_by_entity_type.iter().map(|(_, m)| m.total_candidates).sum();
    let gray_zone_sent: u64 = metrics_by_entity_type.iter().map(|(_, m)| m.gray_zone_sent_count).sum();
    let llm_review: u64 = metrics_by_entity_type.iter().map(|(_, m)| m.llm_review).sum();
    let llm_error: u64 = metrics_by_entity_type.iter().map(|(_, m)| m.llm_error_count).sum();
    let llm_call: u64 = metrics_by_entity_type.iter().map(|(_, m)| m.llm_call_count).sum();

    let gray_zone_rate = rate(gray_zone_sent, total_candidates);
    let llm_review_rate = rate(llm_review, total_candidates);
    let llm_error_rate = rate(llm_error, llm_call);
    let high_severity_count = anomalies.iter().filter(|a| a.severity == "HIGH").count();

    let mut failed_gates = Vec::new();
    if gray_zone_rate > config.max_gray_zone_rate {
        failed_gates.push("max_gray_zone_rate".to_string());
    }
    if llm_review_rate > config.max_llm_review_rate {
        failed_gates.push("max_llm_review_rate".to_string());
    }
    if llm_error_rate > config.max_llm_error_rate {
        failed_gates.push("max_llm_error_rate".to_string());
    }
    if config.fail_on_high_severity_anomalies && high_severity_count > 0 {
        failed_gates.push("fail_on_high_severity_anomalies".to_string());
    }

    let status = if failed_gates.is_empty() { GateStatus::Pass } else { GateStatus::Fail };
    let gate_values = serde_json::json!({
        "gray_zone_rate": gray_zone_rate,
        "llm_review_rate": llm_review_rate,
        "llm_error_rate": llm_error_rate,
        "high_severity_anomaly_count": high_severity_count,
    });

    QualityGateResult { status, failed_gates, gate_values }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics(total: u64, gray: u64, review: u64, error: u64, calls: u64) -> StageMetrics {
        StageMetrics {
            total_candidates: total,
            gray_zone_sent_count: gray,
            llm_review: review,
            llm_error_count: error,
            llm_call_count: calls,
            ..Default::default()
        }
    }

    #[test]
    fn passes_when_under_every_ceiling() {
        let config = QualityGateConfig::default();
        let m = vec![(EntityType::Team, metrics(100, 10, 5, 0, 10))];
        let result = evaluate_quality_gates(&config, &m, &[]);
        assert_eq!(result.status, GateStatus::Pass);
        assert!(result.failed_gates.is_empty());
    }

    #[test]
    fn fails_when_gray_zone_rate_exceeds_ceiling() {
        let config = QualityGateConfig::default();
        let m = vec![(EntityType::Team, metrics(100, 50, 5, 0, 50))];
        let result = evaluate_quality_gates(&config, &m, &[]);
        assert_eq!(result.status, GateStatus::Fail);
        assert!(result.failed_gates.contains(&"max_gray_zone_rate".to_string()));
    }

    #[test]
    fn high_severity_anomaly_fails_regardless_of_rates() {
        let config = QualityGateConfig::default();
        let m = vec![(EntityType::Team, metrics(100, 10, 5, 0, 10))];
        let anomalies = vec![AnomalyEvent {
            entity_type: EntityType::Team,
            metric_name: "gray_zone_rate".to_string(),
            current_value: 0.5,
            baseline_value: 0.1,
            z_score: 4.0,
            severity: "HIGH".to_string(),
        }];
        let result = evaluate_quality_gates(&config, &m, &anomalies);
        assert_eq!(result.status, GateStatus::Fail);
        assert!(result.failed_gates.contains(&"fail_on_high_severity_anomalies".to_string()));
    }

    #[test]
    fn error_rate_is_measured_against_call_count_not_candidate_count() {
        let config = QualityGateConfig::default();
        // 1 error out of 2 calls = 0.5 error rate, well over the 0.20 ceiling,
        // even though candidates (100) would make it look tiny.
        let m = vec![(EntityType::Team, metrics(100, 2, 1, 1, 2))];
        let result = evaluate_quality_gates(&config, &m, &[]);
        assert!(result.failed_gates.contains(&"max_llm_error_rate".to_string()));
    }
}
