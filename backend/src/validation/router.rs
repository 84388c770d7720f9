//! Gray-zone routing state machine: classifies matcher candidates into
//! auto-reject / auto-approve / gray-zone, then adjudicates the gray zone
//! through the LLM validator behind a health gate, a call budget, and a
//! circuit breaker, falling back per policy when any of those trip.

use std::collections::VecDeque;

use serde::Serialize;

use super::adapters::ValidationCandidate;
use super::config::{FallbackMode, LlmValidationConfig};
use super::llm_client::LlmClient;
use super::llm_validator::validate_pair;
use super::schemas::{Decision, ValidationResult};

#[derive(Debug, Default, Clone, Serialize)]
pub struct StageMetrics {
    pub total_candidates: u64,
    pub auto_approve_count: u64,
    pub auto_reject_count: u64,
    pub gray_zone_sent_count: u64,
    pub llm_call_count: u64,
    pub llm_match: u64,
    pub llm_no_match: u64,
    pub llm_review: u64,
    pub llm_error_count: u64,
    pub llm_invalid_json_retry_count: u64,
    pub llm_total_latency_ms: u64,
}

impl StageMetrics {
    pub fn llm_avg_latency_ms(&self) -> Option<f64> {
        if self.llm_call_count == 0 {
            None
        } else {
            Some(self.llm_total_latency_ms as f64 / self.llm_call_count as f64)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouterDecision {
    AutoReject,
    AutoApprove,
    LlmResolved(Decision),
}

pub struct ReviewRow {
    pub candidate: ValidationCandidate,
    pub llm_decision: Decision,
    pub llm_confidence: f64,
    pub reasons: Vec<String>,
    pub risk_flags: Vec<String>,
}

pub struct RoutingOutcome {
    pub candidate: ValidationCandidate,
    pub decision: RouterDecision,
    pub approved: bool,
    pub review: Option<ReviewRow>,
}

struct Outcome {
    success: bool,
    invalid_json_retry: bool,
}

/// Sliding window of the last `window` LLM call outcomes for this stage.
/// Freshly constructed per stage invocation — it never persists across
/// stages or runs.
struct CircuitBreaker {
    window: usize,
    max_fail_rate: f64,
    max_invalid_json_rate: f64,
    outcomes: VecDeque<Outcome>,
}

impl CircuitBreaker {
    fn new(config: &super::config::CircuitBreakerConfig) -> Self {
        Self {
            window: config.window,
            max_fail_rate: config.max_fail_rate,
            max_invalid_json_rate: config.max_invalid_json_rate,
            outcomes: VecDeque::with_capacity(config.window),
        }
    }

    fn record(&mut self, success: bool, invalid_json_retry: bool) {
        if self.outcomes.len() == self.window {
            self.outcomes.pop_front();
        }
        self.outcomes.push_back(Outcome { success, invalid_json_retry });
    }

    fn tripped(&self) -> bool {
        if self.outcomes.len() < self.window {
            return false;
        }
        let total = self.outcomes.len() as f64;
        let fail_rate = self.outcomes.iter().filter(|o| !o.success).count() as f64 / total;
        let invalid_rate = self.outcomes.iter().filter(|o| o.invalid_json_retry).count() as f64 / total;
        fail_rate >= self.max_fail_rate || invalid_rate >= self.max_invalid_json_rate
    }
}

fn fallback_decision(mode: FallbackMode) -> ValidationResult {
    match mode {
        FallbackMode::AutoApprove => {
            let mut result = ValidationResult::synthetic(Decision::Match, "llm_fallback");
            result.confidence = 0.0;
            result
        }
        FallbackMode::Review => ValidationResult::synthetic(Decision::Review, "llm_fallback"),
    }
}

fn record_llm_decision(metrics: &mut StageMetrics, decision: Decision) {
    match decision {
        Decision::Match => metrics.llm_match += 1,
        Decision::NoMatch => metrics.llm_no_match += 1,
        Decision::Review => metrics.llm_review += 1,
    }
}

/// Routes one stage's candidates. `llm_disabled_reason` is set the first
/// time the health gate, call budget, or circuit breaker rules out a real
/// LLM call, and stays set (and sticky) for the remainder of the stage.
pub async fn route_candidates(
    client: &dyn LlmClient,
    config: &LlmValidationConfig,
    entity_type: crate::domain::EntityType,
    candidates: Vec<ValidationCandidate>,
) -> (Vec<RoutingOutcome>, StageMetrics, Option<&'static str>) {
    let threshold = config.threshold_for(entity_type);
    let mut metrics = StageMetrics::default();
    let mut breaker = CircuitBreaker::new(&config.circuit);
    let mut llm_disabled_reason: Option<&'static str> = None;
    let mut outcomes = Vec::with_capacity(candidates.len());

    for candidate in candidates {
        metrics.total_candidates += 1;

        if candidate.matcher_score < threshold.low {
            metrics.auto_reject_count += 1;
            outcomes.push(RoutingOutcome { candidate, decision: RouterDecision::AutoReject, approved: false, review: None });
            continue;
        }
        if candidate.matcher_score >= threshold.high && !candidate.conflict {
            metrics.auto_approve_count += 1;
            outcomes.push(RoutingOutcome { candidate, decision: RouterDecision::AutoApprove, approved: true, review: None });
            continue;
        }

        // Gray zone: resolve the llm_disabled_reason gate order each time,
        // since the call budget can flip mid-stage even if health/circuit
        // state was fine at the start.
        if llm_disabled_reason.is_none() && !config.mapping_llm_enabled() {
            llm_disabled_reason = Some("llm_unavailable");
        }
        if llm_disabled_reason.is_none() && metrics.llm_call_count >= config.max_calls_per_entity_type_per_run as u64 {
            llm_disabled_reason = Some("max_calls_exceeded");
        }
        if llm_disabled_reason.is_none() && breaker.tripped() {
            llm_disabled_reason = Some("circuit_breaker_open");
        }

        let result = if llm_disabled_reason.is_some() {
            fallback_decision(config.fallback_mode_when_llm_unhealthy)
        } else {
            metrics.gray_zone_sent_count += 1;
            metrics.llm_call_count += 1;
            match validate_pair(client, &candidate).await {
                Ok((result, latency_ms)) => {
                    let is_error = result.risk_flags.iter().any(|f| f == "llm_error");
                    let invalid_retry = result.risk_flags.iter().any(|f| f == "llm_invalid_json_retry");
                    metrics.llm_total_latency_ms += latency_ms;
                    if is_error {
                        metrics.llm_error_count += 1;
                    }
                    if invalid_retry {
                        metrics.llm_invalid_json_retry_count += 1;
                    }
                    breaker.record(!is_error, invalid_retry);
                    result
                }
                Err(_) => {
                    metrics.llm_error_count += 1;
                    breaker.record(false, false);
                    ValidationResult::synthetic(Decision::Review, "llm_error")
                }
            }
        };

        record_llm_decision(&mut metrics, result.decision);
        let approved = result.decision == Decision::Match;
        let review = ReviewRow {
            candidate: candidate.clone(),
            llm_decision: result.decision,
            llm_confidence: result.confidence,
            reasons: result.reasons,
            risk_flags: result.risk_flags,
        };
        outcomes.push(RoutingOutcome {
            candidate,
            decision: RouterDecision::LlmResolved(result.decision),
            approved,
            review: Some(review),
        });
    }

    (outcomes, metrics, llm_disabled_reason)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::EntityType;
    use crate::validation::llm_client::MockLlmClient;
    use serde_json::json;

    fn candidate(score: f64, conflict: bool) -> ValidationCandidate {
        ValidationCandidate {
            entity_type: EntityType::Team,
            left_id: "1".to_string(),
            right_id: "2".to_string(),
            matcher_score: score,
            signals: json!({}),
            conflict,
        }
    }

    #[tokio::test]
    async fn low_score_is_auto_rejected_without_llm_call() {
        let client = MockLlmClient::new(vec![]);
        let config = LlmValidationConfig::default();
        let (outcomes, metrics, _) =
            route_candidates(&client, &config, EntityType::Team, vec![candidate(0.1, false)]).await;
        assert_eq!(outcomes[0].decision, RouterDecision::AutoReject);
        assert_eq!(metrics.llm_call_count, 0);
    }

    #[tokio::test]
    async fn high_score_without_conflict_is_auto_approved() {
        let client = MockLlmClient::new(vec![]);
        let config = LlmValidationConfig::default();
        let (outcomes, metrics, _) =
            route_candidates(&client, &config, EntityType::Team, vec![candidate(0.95, false)]).await;
        assert!(outcomes[0].approved);
        assert_eq!(metrics.auto_approve_count, 1);
    }

    #[tokio::test]
    async fn conflict_forces_gray_zone_even_at_high_score() {
        let client = MockLlmClient::new(vec![Ok(json!({
            "decision": "MATCH", "confidence": 0.8, "reasons": [], "risk_flags": []
        }))]);
        let config = LlmValidationConfig::default();
        let (outcomes, metrics, _) =
            route_candidates(&client, &config, EntityType::Team, vec![candidate(0.95, true)]).await;
        assert_eq!(metrics.gray_zone_sent_count, 1);
        assert_eq!(metrics.llm_call_count, 1);
        assert!(outcomes[0].approved);
    }

    #[tokio::test]
    async fn fallback_counts_decision_but_not_call_count() {
        let client = MockLlmClient::new(vec![]);
        let mut config = LlmValidationConfig::default();
        config.mapping_llm_enabled_flag = false;
        let (outcomes, metrics, reason) =
            route_candidates(&client, &config, EntityType::Team, vec![candidate(0.6, false)]).await;
        assert_eq!(reason, Some("llm_unavailable"));
        assert_eq!(metrics.llm_call_count, 0);
        assert_eq!(metrics.gray_zone_sent_count, 0);
        assert_eq!(metrics.llm_review, 1);
        assert!(!outcomes[0].approved);
        assert!(outcomes[0].review.is_some());
    }

    #[tokio::test]
    async fn genuine_no_match_is_rejected_and_counted_against_llm_no_match() {
        let client = MockLlmClient::new(vec![Ok(json!({
            "decision": "NO_MATCH", "confidence": 0.1, "reasons": [], "risk_flags": []
        }))]);
        let config = LlmValidationConfig::default();
        let (outcomes, metrics, _) =
            route_candidates(&client, &config, EntityType::Team, vec![candidate(0.8, false)]).await;
        assert_eq!(metrics.llm_no_match, 1);
        assert_eq!(metrics.llm_error_count, 0);
        assert!(!outcomes[0].approved);
        assert_eq!(outcomes[0].decision, RouterDecision::LlmResolved(Decision::NoMatch));
    }

    #[tokio::test]
    async fn accumulates_invalid_json_retry_and_average_latency() {
        let client = MockLlmClient::new(vec![Ok(json!({
            "decision": "MATCH", "confidence": 0.9, "reasons": [], "risk_flags": ["llm_invalid_json_retry"]
        }))]);
        let config = LlmValidationConfig::default();
        let (_, metrics, _) =
            route_candidates(&client, &config, EntityType::Team, vec![candidate(0.8, false)]).await;
        assert_eq!(metrics.llm_invalid_json_retry_count, 1);
        assert_eq!(metrics.llm_call_count, 1);
        assert_eq!(metrics.llm_avg_latency_ms(), Some(1.0));
    }
}
