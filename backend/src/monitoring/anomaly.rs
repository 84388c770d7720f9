//! Z-score drift detection against a per-entity-type historical baseline.

use serde::{Deserialize, Serialize};

use crate::domain::EntityType;
use crate::validation::router::StageMetrics;

const LOOKBACK: usize = 8;
const Z_THRESHOLD: f64 = 2.0;
const HIGH_SEVERITY_THRESHOLD: f64 = 3.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnomalyEvent {
    pub entity_type: EntityType,
    pub metric_name: String,
    pub current_value: f64,
    pub baseline_value: f64,
    pub z_score: f64,
    pub severity: String,
}

/// The four rates tracked per `(run_id, entity_type)`, each a fraction of
/// `total_candidates` (floored at 1 to avoid division by zero).
#[derive(Debug, Clone, Copy)]
pub struct StageRates {
    pub gray_zone_rate: f64,
    pub llm_review_rate: f64,
    pub auto_match_rate: f64,
    pub auto_reject_rate: f64,
}

impl StageRates {
    pub fn from_metrics(metrics: &StageMetrics) -> Self {
        let denom = metrics.total_candidates.max(1) as f64;
        Self {
            gray_zone_rate: metrics.gray_zone_sent_count as f64 / denom,
            llm_review_rate: metrics.llm_review as f64 / denom,
            auto_match_rate: metrics.auto_approve_count as f64 / denom,
            auto_reject_rate: metrics.auto_reject_count as f64 / denom,
        }
    }

    fn named(&self) -> [(&'static str, f64); 4] {
        [
            ("gray_zone_rate", self.gray_zone_rate),
            ("llm_review_rate", self.llm_review_rate),
            ("auto_match_rate", self.auto_match_rate),
            ("auto_reject_rate", self.auto_reject_rate),
        ]
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn stdev(values: &[f64], mean: f64) -> f64 {
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// `baseline_runs` is up to `lookback=8` prior runs' rates for this entity
/// type, most-recent first. Returns no events when fewer than two baseline
/// points exist (a z-score needs at least that much to be meaningful).
pub fn detect_anomalies(
    entity_type: EntityType,
    current: StageRates,
    baseline_runs: &[StageRates],
) -> Vec<AnomalyEvent> {
    let baseline: Vec<StageRates> = baseline_runs.iter().take(LOOKBACK).copied().collect();
    if baseline.len() < 2 {
        return Vec::new();
    }

    let mut events = Vec::new();
    for (metric_name, current_value) in current.named() {
        let history: Vec<f64> = baseline
            .iter()
            .map(|rates| rates.named().into_iter().find(|(name, _)| *name == metric_name).unwrap().1)
            .collect();
        let baseline_mean = mean(&history);
        let baseline_stdev = stdev(&history, baseline_mean);
        if baseline_stdev == 0.0 {
            continue;
        }
        let z_score = (current_value - baseline_mean) / baseline_stdev;
        if z_score.abs() >= Z_THRESHOLD {
            let severity = if z_score.abs() >= HIGH_SEVERITY_THRESHOLD { "HIGH" } else { "MEDIUM" };
            events.push(AnomalyEvent {
                entity_type,
                metric_name: metric_name.to_string(),
                current_value,
                baseline_value: baseline_mean,
                z_score,
                severity: severity.to_string(),
            });
        }
    }
    events
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rates(gray_zone: f64) -> StageRates {
        StageRates { gray_zone_rate: gray_zone, llm_review_rate: 0.05, auto_match_rate: 0.8, auto_reject_rate: 0.1 }
    }

    #[test]
    fn fewer_than_two_baseline_runs_yields_no_events() {
        let events = detect_anomalies(EntityType::Team, rates(0.5), &[rates(0.1)]);
        assert!(events.is_empty());
    }

    #[test]
    fn large_drift_against_tight_baseline_is_high_severity() {
        let baseline: Vec<StageRates> = (0..8)
            .map(|i| rates(0.10 + if i % 2 == 0 { 0.001 } else { -0.001 }))
            .collect();
        let events = detect_anomalies(EntityType::Team, rates(0.25), &baseline);
        let gray_zone_event = events.iter().find(|e| e.metric_name == "gray_zone_rate").unwrap();
        assert_eq!(gray_zone_event.severity, "HIGH");
    }

    #[test]
    fn stable_metric_produces_no_event() {
        let baseline: Vec<StageRates> = (0..8).map(|_| rates(0.10)).collect();
        let events = detect_anomalies(EntityType::Team, rates(0.10), &baseline);
        assert!(events.iter().all(|e| e.metric_name != "gray_zone_rate"));
    }
}
